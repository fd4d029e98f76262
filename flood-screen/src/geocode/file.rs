//! Géocodeur basé sur un fichier JSON d'adresses connues
//!
//! ```json
//! [
//!   {"address": "1 Queen St, Brisbane", "lat": -27.4705, "lon": 153.0260, "lot_plan": "3GTP102995"}
//! ]
//! ```
//!
//! Le fichier est lu au premier appel. La recherche ignore la casse et les
//! espaces superflus.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use floodzone::GeoPoint;
use serde::Deserialize;
use tracing::{info, warn};

use super::{Geocoder, GeocodingResult};

const PROVIDER: &str = "FileGeocoder";

#[derive(Debug, Deserialize)]
struct GeocodingEntry {
    #[serde(alias = "Address")]
    address: String,
    #[serde(alias = "Lat", alias = "latitude")]
    lat: f64,
    #[serde(alias = "Lon", alias = "longitude")]
    lon: f64,
    #[serde(default, alias = "LotPlan", alias = "lotplan")]
    lot_plan: Option<String>,
}

#[derive(Debug, Clone)]
struct KnownAddress {
    location: GeoPoint,
    lot_plan: Option<String>,
}

pub struct FileGeocoder {
    path: PathBuf,
    /// `None` si le fichier n'a pas pu être chargé
    entries: OnceLock<Option<HashMap<String, KnownAddress>>>,
}

impl FileGeocoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: OnceLock::new(),
        }
    }

    fn entries(&self) -> Option<&HashMap<String, KnownAddress>> {
        self.entries
            .get_or_init(|| match load_entries(&self.path) {
                Ok(entries) => {
                    info!(path = %self.path.display(), addresses = entries.len(), "Geocoding file loaded");
                    Some(entries)
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Failed to load geocoding file");
                    None
                }
            })
            .as_ref()
    }
}

/// Clé de recherche : espaces compactés, majuscules
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn load_entries(path: &Path) -> Result<HashMap<String, KnownAddress>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read geocoding file: {}", path.display()))?;
    let entries: Vec<GeocodingEntry> =
        serde_json::from_str(&content).context("Failed to parse geocoding JSON")?;

    let mut lookup = HashMap::with_capacity(entries.len());
    for entry in entries {
        if entry.address.trim().is_empty() {
            continue;
        }
        let location = match GeoPoint::new(entry.lat, entry.lon) {
            Ok(point) => point,
            Err(e) => {
                warn!(address = %entry.address, error = %e, "Skipping geocoding entry");
                continue;
            }
        };
        lookup.insert(
            normalize_address(&entry.address),
            KnownAddress {
                location,
                lot_plan: entry.lot_plan.filter(|lp| !lp.trim().is_empty()),
            },
        );
    }

    Ok(lookup)
}

#[async_trait]
impl Geocoder for FileGeocoder {
    async fn geocode(&self, address: &str) -> GeocodingResult {
        if address.trim().is_empty() {
            return GeocodingResult::error(address, PROVIDER);
        }

        let Some(entries) = self.entries() else {
            return GeocodingResult::error(address, PROVIDER);
        };

        match entries.get(&normalize_address(address)) {
            Some(known) => {
                let result = GeocodingResult::success(address, known.location, PROVIDER);
                match &known.lot_plan {
                    Some(lot_plan) => result.with_lot_plan(lot_plan.clone()),
                    None => result,
                }
            }
            None => GeocodingResult::not_found(address, PROVIDER),
        }
    }
}
