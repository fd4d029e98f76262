//! Index spatial des zones inondables
//!
//! Parcours linéaire des polygones : le jeu BCC tient en mémoire et chaque
//! requête reste en O(nombre de zones), sans état partagé mutable.

pub mod lazy;

pub use lazy::LazyZoneIndex;

use crate::geometry::{self, GeoPoint};
use crate::types::{FloodRisk, FloodZone, FloodZoneHit, FloodZoneProximity};

/// Interrogation d'un jeu de zones (emprises + overlay de risque)
pub trait FloodZoneIndex: Send + Sync {
    /// Zone contenant le point, la plus risquée en cas de recouvrement
    fn find_zone_for_point(&self, point: GeoPoint) -> Option<FloodZone>;

    /// Zone la plus pertinente dans un rayon de `max_distance_metres`
    fn find_nearest_zone(&self, point: GeoPoint, max_distance_metres: f64) -> Option<FloodZoneHit>;

    /// Risque classifié de l'overlay au point, `None` hors overlay
    fn find_risk_overlay_for_point(&self, point: GeoPoint) -> Option<FloodRisk>;
}

/// Index en mémoire, immuable après construction
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<FloodZone>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<FloodZone>) -> Self {
        Self { zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[FloodZone] {
        &self.zones
    }

    /// Zone contenant le point ; parmi plusieurs, la plus risquée (la première en cas d'égalité).
    ///
    /// `None` signifie « risque inconnu pour ce jeu », pas « aucun risque ».
    pub fn containing_zone(&self, point: GeoPoint) -> Option<&FloodZone> {
        let mut best: Option<&FloodZone> = None;

        for zone in &self.zones {
            if !geometry::contains(&zone.geometry, point) {
                continue;
            }
            if best.map_or(true, |b| zone.risk > b.risk) {
                best = Some(zone);
            }
        }

        best
    }

    /// Meilleure zone dans le tampon.
    ///
    /// Priorité : toute zone contenant le point l'emporte sur une zone voisine ;
    /// à l'intérieur, le risque le plus fort ; à proximité, le risque le plus
    /// fort puis la distance la plus courte.
    pub fn nearest_zone(&self, point: GeoPoint, max_distance_metres: f64) -> Option<FloodZoneHit> {
        let mut best_inside: Option<&FloodZone> = None;
        let mut best_near: Option<(&FloodZone, f64)> = None;

        for zone in &self.zones {
            if geometry::contains(&zone.geometry, point) {
                if best_inside.map_or(true, |b| zone.risk > b.risk) {
                    best_inside = Some(zone);
                }
                continue;
            }

            // Inutile de mesurer les voisines une fois un hit intérieur trouvé
            if best_inside.is_some() {
                continue;
            }

            let distance = geometry::distance_metres(&zone.geometry, point);
            if distance > max_distance_metres {
                continue;
            }

            let better = match best_near {
                None => true,
                Some((b, d)) => zone.risk > b.risk || (zone.risk == b.risk && distance < d),
            };
            if better {
                best_near = Some((zone, distance));
            }
        }

        if let Some(zone) = best_inside {
            return Some(FloodZoneHit {
                zone: zone.clone(),
                distance_metres: 0.0,
                proximity: FloodZoneProximity::Inside,
            });
        }

        best_near.map(|(zone, distance)| FloodZoneHit {
            zone: zone.clone(),
            distance_metres: distance,
            proximity: FloodZoneProximity::Near,
        })
    }
}

impl FloodZoneIndex for ZoneIndex {
    fn find_zone_for_point(&self, point: GeoPoint) -> Option<FloodZone> {
        self.containing_zone(point).cloned()
    }

    fn find_nearest_zone(&self, point: GeoPoint, max_distance_metres: f64) -> Option<FloodZoneHit> {
        self.nearest_zone(point, max_distance_metres)
    }

    fn find_risk_overlay_for_point(&self, _point: GeoPoint) -> Option<FloodRisk> {
        None
    }
}
