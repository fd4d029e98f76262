//! # flood-screen
//!
//! Screening du risque inondation d'adresses du Brisbane City Council.
//!
//! ## Features
//!
//! - Géocodage enfichable (point fixe, fichier d'adresses) avec complément lotplan
//! - Résolution par niveaux : métriques BCC par parcelle, puis tampon autour du point
//! - Annulation coopérative des requêtes en cours
//! - Screening par lot avec parallélisme borné et rapport
//!
//! ## Usage CLI
//!
//! ```bash
//! # Une adresse
//! flood-screen lookup "1 Queen St, Brisbane City"
//!
//! # Un fichier d'adresses, résultats en JSON
//! flood-screen batch --input addresses.txt --output results.json --report report.json
//!
//! # Diagnostic
//! flood-screen zone --lat -27.4705 --lon 153.0260
//! flood-screen parse-lotplan 3GTP102995
//! ```

pub mod config;
pub mod geocode;
pub mod provider;
pub mod report;
pub mod screening;
pub mod summary;

pub use config::ScreenConfig;
pub use geocode::{Geocoder, GeocodingResult, GeocodingStatus};
pub use provider::{
    FloodDataProvider, FloodDataScope, FloodDataSource, FloodLookupResult,
    HybridFloodDataProvider, LookupCancelled,
};
pub use report::{ScreeningReport, ScreeningStatus};
pub use screening::{screen_all, ScreeningEntry};
pub use summary::FloodSummary;

use floodzone::FloodDataset;

/// Assemble l'orchestrateur à partir de la configuration et d'un jeu de données ouvert
pub fn build_provider(config: &ScreenConfig, dataset: &FloodDataset) -> HybridFloodDataProvider {
    let geocoder = geocode::build_geocoder(&config.geocoding, &config.flood_data);

    HybridFloodDataProvider::new(geocoder, dataset.metrics.clone(), dataset.zones.clone())
        .with_buffer_metres(config.buffer_metres)
}
