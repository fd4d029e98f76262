//! Géocodage des adresses
//!
//! Le géocodeur est la seule opération susceptible d'attendre une ressource
//! externe : l'interface est asynchrone et l'appelant peut l'annuler.

pub mod dummy;
pub mod file;
pub mod lotplan_lookup;

pub use dummy::DummyGeocoder;
pub use file::FileGeocoder;
pub use lotplan_lookup::{AddressLotPlanLookup, LotPlanEnrichingGeocoder};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use floodzone::{FloodDataOptions, GeoPoint};
use serde::Serialize;

use crate::config::{GeocodingConfig, GeocodingProvider};

/// Issue d'un géocodage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeocodingStatus {
    Success,
    NotFound,
    Error,
}

impl fmt::Display for GeocodingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GeocodingStatus::Success => "Success",
            GeocodingStatus::NotFound => "NotFound",
            GeocodingStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Résultat d'un géocodage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodingResult {
    /// Adresse telle que demandée
    pub query: String,
    pub status: GeocodingStatus,
    pub normalized_address: Option<String>,
    pub location: Option<GeoPoint>,
    /// Nom du fournisseur ayant répondu
    pub provider: String,
    /// Identifiant lotplan du Queensland, si le fournisseur le connaît (ex: "3GTP102995")
    pub lot_plan: Option<String>,
}

impl GeocodingResult {
    pub fn success(query: &str, location: GeoPoint, provider: &str) -> Self {
        Self {
            query: query.to_string(),
            status: GeocodingStatus::Success,
            normalized_address: Some(query.trim().to_string()),
            location: Some(location),
            provider: provider.to_string(),
            lot_plan: None,
        }
    }

    pub fn not_found(query: &str, provider: &str) -> Self {
        Self::failed(query, GeocodingStatus::NotFound, provider)
    }

    pub fn error(query: &str, provider: &str) -> Self {
        Self::failed(query, GeocodingStatus::Error, provider)
    }

    pub fn with_lot_plan(mut self, lot_plan: impl Into<String>) -> Self {
        self.lot_plan = Some(lot_plan.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == GeocodingStatus::Success
    }

    fn failed(query: &str, status: GeocodingStatus, provider: &str) -> Self {
        Self {
            query: query.to_string(),
            status,
            normalized_address: None,
            location: None,
            provider: provider.to_string(),
            lot_plan: None,
        }
    }
}

/// Fournisseur de géocodage
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Géocode une adresse. Ne renvoie jamais d'erreur : les échecs sont
    /// portés par `GeocodingResult::status`.
    async fn geocode(&self, address: &str) -> GeocodingResult;
}

/// Construit le géocodeur configuré, enrichi du lotplan le plus proche
pub fn build_geocoder(config: &GeocodingConfig, data: &FloodDataOptions) -> Arc<dyn Geocoder> {
    let inner: Arc<dyn Geocoder> = match config.provider {
        GeocodingProvider::Dummy => Arc::new(DummyGeocoder),
        GeocodingProvider::File => Arc::new(FileGeocoder::new(&config.file_path)),
    };

    if !config.enrich_lot_plan {
        return inner;
    }

    let lookup = Arc::new(AddressLotPlanLookup::new(data.addresses_path()));
    Arc::new(LotPlanEnrichingGeocoder::new(
        inner,
        lookup,
        config.lot_plan_max_distance_metres,
    ))
}
