//! Index chargé une seule fois, au premier appel
//!
//! Le premier appelant charge les données ; les appelants concurrents
//! attendent la fin du chargement, les suivants lisent sans verrou.

use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::{FloodZoneIndex, ZoneIndex};
use crate::geometry::GeoPoint;
use crate::loader::ZoneDataSource;
use crate::types::{FloodRisk, FloodZone, FloodZoneHit};
use crate::FloodError;

/// Emprises et overlay de risque, chargés indépendamment à la demande
pub struct LazyZoneIndex {
    source: Arc<dyn ZoneDataSource>,
    extents: OnceLock<ZoneIndex>,
    risk_overlay: OnceLock<ZoneIndex>,
}

impl LazyZoneIndex {
    pub fn new(source: Arc<dyn ZoneDataSource>) -> Self {
        Self {
            source,
            extents: OnceLock::new(),
            risk_overlay: OnceLock::new(),
        }
    }

    /// Index des emprises (chargé au premier appel)
    pub fn extents(&self) -> &ZoneIndex {
        self.extents
            .get_or_init(|| build_index("extents", self.source.load_zones()))
    }

    /// Index de l'overlay classifié (chargé au premier appel)
    pub fn risk_overlay(&self) -> &ZoneIndex {
        self.risk_overlay
            .get_or_init(|| build_index("risk overlay", self.source.load_risk_zones()))
    }

    pub fn is_extents_loaded(&self) -> bool {
        self.extents.get().is_some()
    }

    pub fn is_risk_overlay_loaded(&self) -> bool {
        self.risk_overlay.get().is_some()
    }
}

/// Un échec de chargement donne un index vide : les requêtes dégradent en « non trouvé »
fn build_index(dataset: &str, loaded: Result<Vec<FloodZone>, FloodError>) -> ZoneIndex {
    match loaded {
        Ok(zones) => {
            info!(dataset, zones = zones.len(), "Flood zone index ready");
            ZoneIndex::new(zones)
        }
        Err(e) => {
            warn!(dataset, error = %e, "Failed to load flood zones, index left empty");
            ZoneIndex::default()
        }
    }
}

impl FloodZoneIndex for LazyZoneIndex {
    fn find_zone_for_point(&self, point: GeoPoint) -> Option<FloodZone> {
        self.extents().containing_zone(point).cloned()
    }

    fn find_nearest_zone(&self, point: GeoPoint, max_distance_metres: f64) -> Option<FloodZoneHit> {
        self.extents().nearest_zone(point, max_distance_metres)
    }

    fn find_risk_overlay_for_point(&self, point: GeoPoint) -> Option<FloodRisk> {
        self.risk_overlay()
            .containing_zone(point)
            .map(|zone| zone.risk)
    }
}
