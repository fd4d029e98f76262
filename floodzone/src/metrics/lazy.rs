//! Index de métriques chargé au premier appel

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

use super::{ParcelMetricsIndex, ParcelMetricsLookup};
use crate::ndjson;
use crate::options::FloodDataOptions;
use crate::types::BccMetricsSnapshot;

pub struct LazyParcelMetricsIndex {
    parcel_path: PathBuf,
    plan_path: PathBuf,
    index: OnceLock<ParcelMetricsIndex>,
}

impl LazyParcelMetricsIndex {
    pub fn new(options: &FloodDataOptions) -> Self {
        Self::from_paths(options.parcel_metrics_path(), options.plan_metrics_path())
    }

    pub fn from_paths(parcel_path: impl Into<PathBuf>, plan_path: impl Into<PathBuf>) -> Self {
        Self {
            parcel_path: parcel_path.into(),
            plan_path: plan_path.into(),
            index: OnceLock::new(),
        }
    }

    /// Index chargé ; les appelants concurrents attendent le premier chargement
    pub fn index(&self) -> &ParcelMetricsIndex {
        self.index.get_or_init(|| {
            let parcel_lines = read_or_empty(&self.parcel_path);
            let plan_lines = read_or_empty(&self.plan_path);
            let index = ParcelMetricsIndex::from_lines(&parcel_lines, &plan_lines);

            info!(
                parcels = index.parcel_count(),
                plans = index.plan_count(),
                "Parcel metrics index ready"
            );
            index
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }
}

fn read_or_empty(path: &Path) -> Vec<String> {
    ndjson::read_lines(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Failed to read metrics file, using empty dataset");
        Vec::new()
    })
}

impl ParcelMetricsLookup for LazyParcelMetricsIndex {
    fn lookup(&self, identifier: &str) -> Option<BccMetricsSnapshot> {
        self.index().lookup(identifier)
    }
}
