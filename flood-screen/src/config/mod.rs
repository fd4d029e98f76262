//! Configuration du service de screening

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use floodzone::FloodDataOptions;
use serde::{Deserialize, Serialize};

use crate::geocode::lotplan_lookup::DEFAULT_MAX_DISTANCE_METRES;
use crate::provider::DEFAULT_BUFFER_METRES;

/// Fournisseur de géocodage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodingProvider {
    /// Point fixe (Brisbane CBD), pour le développement
    #[default]
    Dummy,
    /// Fichier JSON d'adresses connues
    File,
}

impl std::str::FromStr for GeocodingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dummy" => Ok(GeocodingProvider::Dummy),
            "file" => Ok(GeocodingProvider::File),
            _ => Err(format!("Invalid geocoding provider: {}. Use: dummy, file", s)),
        }
    }
}

/// Configuration du géocodage
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub provider: GeocodingProvider,

    /// Fichier d'adresses pour le fournisseur `file`
    pub file_path: PathBuf,

    /// Compléter le lotplan depuis le point adresse le plus proche
    pub enrich_lot_plan: bool,

    pub lot_plan_max_distance_metres: f64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider: GeocodingProvider::Dummy,
            file_path: PathBuf::from("geocoding.json"),
            enrich_lot_plan: true,
            lot_plan_max_distance_metres: DEFAULT_MAX_DISTANCE_METRES,
        }
    }
}

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub flood_data: FloodDataOptions,

    pub geocoding: GeocodingConfig,

    /// Rayon du tampon de recherche autour du point géocodé (tier 3)
    pub buffer_metres: f64,

    /// Nombre de requêtes traitées simultanément en batch (défaut : nombre de cœurs)
    pub jobs: Option<usize>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            flood_data: FloodDataOptions::default(),
            geocoding: GeocodingConfig::default(),
            buffer_metres: DEFAULT_BUFFER_METRES,
            jobs: None,
        }
    }
}

impl ScreenConfig {
    /// Charge une configuration depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            flood_data: FloodDataOptions::from_env(),
            geocoding: GeocodingConfig {
                provider: std::env::var("GEOCODING_PROVIDER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
                file_path: std::env::var("GEOCODING_FILE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.geocoding.file_path),
                enrich_lot_plan: std::env::var("GEOCODING_ENRICH_LOTPLAN")
                    .ok()
                    .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                    .unwrap_or(defaults.geocoding.enrich_lot_plan),
                lot_plan_max_distance_metres: defaults.geocoding.lot_plan_max_distance_metres,
            },
            buffer_metres: std::env::var("FLOOD_BUFFER_METRES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.buffer_metres),
            jobs: std::env::var("FLOOD_JOBS").ok().and_then(|s| s.parse().ok()),
        }
    }

    /// Fichier JSON si fourni, sinon variables d'environnement
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::from_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.buffer_metres.is_finite() || self.buffer_metres < 0.0 {
            anyhow::bail!(
                "Invalid buffer_metres: {}. Expected a non-negative distance",
                self.buffer_metres
            );
        }
        if self.jobs == Some(0) {
            anyhow::bail!("Invalid jobs: 0. Expected at least 1");
        }
        Ok(())
    }

    /// Parallélisme effectif du batch
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}
