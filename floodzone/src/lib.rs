//! # floodzone
//!
//! Index des zones inondables et des métriques parcellaires du Brisbane City Council.
//!
//! ## Features
//!
//! - Points WGS84 validés, tests de contenance et distances en mètres (`geo`)
//! - Parser des identifiants lot/plan du Queensland, lots numériques et lettres
//! - Index spatial des emprises inondables et de l'overlay de risque classifié
//! - Index des métriques BCC par parcelle, avec repli au niveau du plan
//! - Chargement NDJSON paresseux, une seule fois par processus
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floodzone::{FloodDataOptions, FloodDataset, FloodZoneIndex, GeoPoint, ParcelMetricsLookup};
//!
//! let dataset = FloodDataset::open(&FloodDataOptions::from_env());
//!
//! let point = GeoPoint::new(-27.4705, 153.0260)?;
//! if let Some(hit) = dataset.zones.find_nearest_zone(point, 30.0) {
//!     println!("{} ({}, {:.1} m)", hit.zone.risk, hit.proximity, hit.distance_metres);
//! }
//!
//! if let Some(metrics) = dataset.metrics.lookup("3GTP102995") {
//!     println!("Overall: {} ({:?})", metrics.overall_risk, metrics.scope);
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod index;
pub mod loader;
pub mod lotplan;
pub mod metrics;
pub mod ndjson;
pub mod options;
pub mod types;

pub use error::FloodError;
pub use geometry::GeoPoint;
pub use index::{FloodZoneIndex, LazyZoneIndex, ZoneIndex};
pub use loader::{NdjsonZoneLoader, ZoneDataSource};
pub use lotplan::LotPlanParts;
pub use metrics::{LazyParcelMetricsIndex, LotPlanKey, ParcelMetricsIndex, ParcelMetricsLookup};
pub use options::FloodDataOptions;
pub use types::{
    BccMetricsSnapshot, FloodRisk, FloodZone, FloodZoneHit, FloodZoneProximity, MetricsScope,
};

use std::sync::Arc;

/// Les deux index d'un jeu de données, partageables entre requêtes.
///
/// Rien n'est lu à la construction : chaque index se charge à sa première requête.
#[derive(Clone)]
pub struct FloodDataset {
    pub zones: Arc<LazyZoneIndex>,
    pub metrics: Arc<LazyParcelMetricsIndex>,
}

impl FloodDataset {
    pub fn open(options: &FloodDataOptions) -> Self {
        let source: Arc<dyn ZoneDataSource> = Arc::new(NdjsonZoneLoader::new(options));

        Self {
            zones: Arc::new(LazyZoneIndex::new(source)),
            metrics: Arc::new(LazyParcelMetricsIndex::new(options)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_lazy() {
        let options = FloodDataOptions {
            data_root: "/nonexistent/flood".into(),
            ..FloodDataOptions::default()
        };
        let dataset = FloodDataset::open(&options);

        assert!(!dataset.zones.is_extents_loaded());
        assert!(!dataset.metrics.is_loaded());

        // Fichiers absents : requêtes en « non trouvé », sans erreur
        let point = GeoPoint::new(-27.4705, 153.0260).unwrap();
        assert!(dataset.zones.find_zone_for_point(point).is_none());
        assert!(dataset.metrics.lookup("3GTP102995").is_none());
    }
}
