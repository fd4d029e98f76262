//! Lotplan par point adresse le plus proche
//!
//! Source : `addresses.ndjson`, une ligne par point adresse
//! `{"lot_plan":"1SP123456","latitude":-27.47,"longitude":153.02}`.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use floodzone::{ndjson, GeoPoint};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Geocoder, GeocodingResult};

const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Rayon de recherche par défaut autour du point géocodé
pub const DEFAULT_MAX_DISTANCE_METRES: f64 = 40.0;

#[derive(Debug, Deserialize)]
struct AddressRecord {
    #[serde(default, alias = "lotplan", alias = "LotPlan")]
    lot_plan: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Debug, Clone)]
struct AddressPoint {
    lot_plan: String,
    latitude: f64,
    longitude: f64,
}

pub struct AddressLotPlanLookup {
    path: PathBuf,
    addresses: OnceLock<Vec<AddressPoint>>,
}

impl AddressLotPlanLookup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            addresses: OnceLock::new(),
        }
    }

    fn addresses(&self) -> &[AddressPoint] {
        self.addresses.get_or_init(|| {
            let lines = ndjson::read_lines(&self.path).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to read address file");
                Vec::new()
            });
            let addresses = parse_addresses(&lines);
            info!(
                path = %self.path.display(),
                addresses = addresses.len(),
                "Loaded address points for lotplan lookup"
            );
            addresses
        })
    }

    /// Lotplan du point adresse le plus proche, strictement en deçà de `max_distance_metres`
    pub fn find_lot_plan(&self, point: GeoPoint, max_distance_metres: f64) -> Option<String> {
        let addresses = self.addresses();
        let mut best: Option<(&AddressPoint, f64)> = None;

        for address in addresses {
            let distance = haversine_metres(
                point.latitude(),
                point.longitude(),
                address.latitude,
                address.longitude,
            );
            let limit = best.map_or(max_distance_metres, |(_, d)| d);
            if distance < limit {
                best = Some((address, distance));
            }
        }

        match best {
            Some((address, distance)) => {
                debug!(lot_plan = %address.lot_plan, distance, %point, "Found lotplan");
                Some(address.lot_plan.clone())
            }
            None => {
                debug!(max_distance_metres, %point, searched = addresses.len(), "No lotplan nearby");
                None
            }
        }
    }
}

fn parse_addresses(lines: &[String]) -> Vec<AddressPoint> {
    lines
        .iter()
        .filter_map(|line| match serde_json::from_str::<AddressRecord>(line) {
            Ok(AddressRecord {
                lot_plan: Some(lot_plan),
                latitude: Some(latitude),
                longitude: Some(longitude),
            }) if !lot_plan.trim().is_empty() => Some(AddressPoint {
                lot_plan,
                latitude,
                longitude,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to parse address line");
                None
            }
        })
        .collect()
}

/// Distance orthodromique en mètres
pub fn haversine_metres(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METRES * a.sqrt().asin()
}

/// Complète le lotplan d'un géocodage réussi qui n'en fournit pas
pub struct LotPlanEnrichingGeocoder {
    inner: Arc<dyn Geocoder>,
    lookup: Arc<AddressLotPlanLookup>,
    max_distance_metres: f64,
}

impl LotPlanEnrichingGeocoder {
    pub fn new(
        inner: Arc<dyn Geocoder>,
        lookup: Arc<AddressLotPlanLookup>,
        max_distance_metres: f64,
    ) -> Self {
        Self {
            inner,
            lookup,
            max_distance_metres,
        }
    }
}

#[async_trait]
impl Geocoder for LotPlanEnrichingGeocoder {
    async fn geocode(&self, address: &str) -> GeocodingResult {
        let result = self.inner.geocode(address).await;

        if !result.is_success() || result.lot_plan.is_some() {
            return result;
        }
        let Some(location) = result.location else {
            return result;
        };

        match self.lookup.find_lot_plan(location, self.max_distance_metres) {
            Some(lot_plan) => result.with_lot_plan(lot_plan),
            None => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{DummyGeocoder, GeocodingStatus};

    fn write_addresses(name: &str, lines: &[&str]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("flood_screen_addresses_{}.ndjson", name));
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_haversine() {
        assert_eq!(haversine_metres(-27.47, 153.02, -27.47, 153.02), 0.0);
        // 0.0009° de latitude ≈ 100 m
        let d = haversine_metres(-27.470, 153.020, -27.4709, 153.020);
        assert!((d - 100.0).abs() < 1.0, "{d}");
    }

    #[test]
    fn test_nearest_within_distance() {
        let path = write_addresses(
            "nearest",
            &[
                r#"{"lot_plan":"1SP123456","latitude":-27.470,"longitude":153.020}"#,
                r#"{"lot_plan":"2RP654321","latitude":-27.480,"longitude":153.030}"#,
            ],
        );
        let lookup = AddressLotPlanLookup::new(&path);

        assert_eq!(
            lookup.find_lot_plan(point(-27.4701, 153.0201), DEFAULT_MAX_DISTANCE_METRES),
            Some("1SP123456".to_string())
        );
        assert_eq!(lookup.find_lot_plan(point(-27.490, 153.040), 40.0), None);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_respects_max_distance() {
        let path = write_addresses(
            "max_distance",
            &[r#"{"lot_plan":"1SP123456","latitude":-27.470,"longitude":153.020}"#],
        );
        let lookup = AddressLotPlanLookup::new(&path);
        let p = point(-27.4709, 153.020);

        assert_eq!(lookup.find_lot_plan(p, 40.0), None);
        assert_eq!(lookup.find_lot_plan(p, 200.0), Some("1SP123456".to_string()));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_closest_wins_and_bad_lines_skipped() {
        let path = write_addresses(
            "closest",
            &[
                "this is not valid json",
                r#"{"lot_plan":"FAR_AWAY","latitude":-27.4705,"longitude":153.0205}"#,
                r#"{"latitude":-27.4700,"longitude":153.0200}"#,
                r#"{"lot_plan":"CLOSEST","latitude":-27.4700,"longitude":153.0200}"#,
                r#"{"lot_plan":"MEDIUM","latitude":-27.4702,"longitude":153.0202}"#,
                "{ broken json",
            ],
        );
        let lookup = AddressLotPlanLookup::new(&path);

        assert_eq!(
            lookup.find_lot_plan(point(-27.4700, 153.0200), 100.0),
            Some("CLOSEST".to_string())
        );

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_finds_nothing() {
        let lookup = AddressLotPlanLookup::new("/nonexistent/addresses.ndjson");
        assert_eq!(lookup.find_lot_plan(point(-27.47, 153.02), 40.0), None);
    }

    #[tokio::test]
    async fn test_enriching_geocoder_fills_lot_plan() {
        // Le géocodeur factice répond toujours Brisbane CBD (-27.4705, 153.0260)
        let path = write_addresses(
            "enrich",
            &[r#"{"lot_plan":"3GTP102995","latitude":-27.4705,"longitude":153.0261}"#],
        );
        let geocoder = LotPlanEnrichingGeocoder::new(
            Arc::new(DummyGeocoder),
            Arc::new(AddressLotPlanLookup::new(&path)),
            DEFAULT_MAX_DISTANCE_METRES,
        );

        let result = geocoder.geocode("1 Queen St").await;
        assert_eq!(result.lot_plan.as_deref(), Some("3GTP102995"));

        let failed = geocoder.geocode("").await;
        assert_eq!(failed.status, GeocodingStatus::Error);
        assert!(failed.lot_plan.is_none());

        std::fs::remove_file(path).ok();
    }
}
