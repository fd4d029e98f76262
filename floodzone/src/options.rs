//! Emplacement des fichiers de données inondation

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Chemins des jeux NDJSON, relatifs à `data_root`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FloodDataOptions {
    pub data_root: PathBuf,

    /// Emprises inondables brutes (sans classification fiable)
    pub extents_file: PathBuf,

    /// Zones de risque classifiées (overlay)
    pub overall_risk_file: PathBuf,

    /// Métriques BCC par parcelle
    pub parcel_metrics_file: PathBuf,

    /// Métriques BCC agrégées par plan
    pub plan_metrics_file: PathBuf,

    /// Points adresse avec lotplan, pour le géocodage inverse
    pub addresses_file: PathBuf,
}

impl Default for FloodDataOptions {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("/data/flood"),
            extents_file: PathBuf::from("bcc/flood-awareness-extents.ndjson"),
            overall_risk_file: PathBuf::from("bcc/flood-awareness-overall.ndjson"),
            parcel_metrics_file: PathBuf::from("bcc/bcc-parcel-metrics-parcel.ndjson"),
            plan_metrics_file: PathBuf::from("bcc/bcc-parcel-metrics-plan.ndjson"),
            addresses_file: PathBuf::from("bcc/addresses.ndjson"),
        }
    }
}

impl FloodDataOptions {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: PathBuf| {
            std::env::var(name).map(PathBuf::from).unwrap_or(default)
        };

        Self {
            data_root: var("FLOOD_DATA_ROOT", defaults.data_root),
            extents_file: var("FLOOD_EXTENTS_FILE", defaults.extents_file),
            overall_risk_file: var("FLOOD_OVERALL_RISK_FILE", defaults.overall_risk_file),
            parcel_metrics_file: var("FLOOD_PARCEL_METRICS_FILE", defaults.parcel_metrics_file),
            plan_metrics_file: var("FLOOD_PLAN_METRICS_FILE", defaults.plan_metrics_file),
            addresses_file: var("FLOOD_ADDRESSES_FILE", defaults.addresses_file),
        }
    }

    pub fn extents_path(&self) -> PathBuf {
        self.data_root.join(&self.extents_file)
    }

    pub fn overall_risk_path(&self) -> PathBuf {
        self.data_root.join(&self.overall_risk_file)
    }

    pub fn parcel_metrics_path(&self) -> PathBuf {
        self.data_root.join(&self.parcel_metrics_file)
    }

    pub fn plan_metrics_path(&self) -> PathBuf {
        self.data_root.join(&self.plan_metrics_file)
    }

    pub fn addresses_path(&self) -> PathBuf {
        self.data_root.join(&self.addresses_file)
    }
}
