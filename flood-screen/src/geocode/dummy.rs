//! Géocodeur de développement : toute adresse tombe sur Brisbane CBD

use async_trait::async_trait;
use floodzone::GeoPoint;

use super::{Geocoder, GeocodingResult};

const PROVIDER: &str = "DummyGeocoder";

#[derive(Debug, Clone, Copy, Default)]
pub struct DummyGeocoder;

#[async_trait]
impl Geocoder for DummyGeocoder {
    async fn geocode(&self, address: &str) -> GeocodingResult {
        if address.trim().is_empty() {
            return GeocodingResult::error(address, PROVIDER);
        }

        GeocodingResult::success(address, GeoPoint::BRISBANE_CBD, PROVIDER)
    }
}
