//! Index des métriques inondation BCC par parcelle, avec repli au niveau du plan
//!
//! Deux dictionnaires immuables, clés insensibles à la casse :
//! - par lotplan (ex: "3GTP102995")
//! - par plan (ex: "GTP102995"), issus du fichier plan ou agrégés depuis les lots
//!
//! Une recherche qui ne trouve pas la parcelle retombe sur le plan ; le résultat
//! est alors réétiqueté avec l'identifiant demandé et la portée `PlanFallback`.

pub mod lazy;
pub mod record;

pub use lazy::LazyParcelMetricsIndex;
pub use record::{aggregate_plan, parse_metrics_line};

use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::lotplan::LotPlanParts;
use crate::types::{BccMetricsSnapshot, MetricsScope};

/// Recherche de métriques par identifiant de parcelle
pub trait ParcelMetricsLookup: Send + Sync {
    /// Métriques de la parcelle, ou du plan en repli ; `None` si rien ne correspond
    fn lookup(&self, identifier: &str) -> Option<BccMetricsSnapshot>;
}

/// Clé de dictionnaire normalisée (trim + majuscules ASCII)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LotPlanKey(String);

impl LotPlanKey {
    pub fn new(identifier: &str) -> Self {
        Self(identifier.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LotPlanKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for LotPlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index en mémoire, immuable après construction
#[derive(Debug, Clone, Default)]
pub struct ParcelMetricsIndex {
    parcels: HashMap<LotPlanKey, BccMetricsSnapshot>,
    plans: HashMap<LotPlanKey, BccMetricsSnapshot>,
}

impl ParcelMetricsIndex {
    /// Construit l'index depuis les snapshots parcelle et plan.
    ///
    /// En cas de doublon, le premier enregistrement est conservé. Les plans
    /// absents du jeu plan reçoivent un agrégat calculé depuis leurs lots.
    pub fn new(parcels: Vec<BccMetricsSnapshot>, plans: Vec<BccMetricsSnapshot>) -> Self {
        let mut parcel_map: HashMap<LotPlanKey, BccMetricsSnapshot> =
            HashMap::with_capacity(parcels.len());
        let mut lots_by_plan: HashMap<LotPlanKey, Vec<usize>> = HashMap::new();

        for (idx, snapshot) in parcels.iter().enumerate() {
            let key = LotPlanKey::new(&snapshot.key);
            if parcel_map.contains_key(&key) {
                debug!(lotplan = %key, "Duplicate parcel metrics record ignored");
                continue;
            }
            if !snapshot.plan.trim().is_empty() {
                lots_by_plan
                    .entry(LotPlanKey::new(&snapshot.plan))
                    .or_default()
                    .push(idx);
            }
            parcel_map.insert(key, snapshot.clone());
        }

        let mut plan_map: HashMap<LotPlanKey, BccMetricsSnapshot> =
            HashMap::with_capacity(plans.len() + lots_by_plan.len());
        for mut snapshot in plans {
            let raw = if snapshot.plan.trim().is_empty() {
                snapshot.key.clone()
            } else {
                snapshot.plan.clone()
            };
            let key = LotPlanKey::new(&raw);
            if plan_map.contains_key(&key) {
                debug!(plan = %key, "Duplicate plan metrics record ignored");
                continue;
            }
            snapshot.plan = raw;
            snapshot.scope = MetricsScope::PlanFallback;
            plan_map.insert(key, snapshot);
        }

        let mut aggregated = 0usize;
        for (key, lots) in lots_by_plan {
            if plan_map.contains_key(&key) {
                continue;
            }
            let plan_name = parcels[lots[0]].plan.clone();
            let aggregate = aggregate_plan(&plan_name, lots.iter().map(|&i| &parcels[i]));
            plan_map.insert(key, aggregate);
            aggregated += 1;
        }

        debug!(
            parcels = parcel_map.len(),
            plans = plan_map.len(),
            aggregated,
            "Parcel metrics index built"
        );

        Self {
            parcels: parcel_map,
            plans: plan_map,
        }
    }

    /// Construit l'index depuis des lignes NDJSON ; les lignes invalides sont ignorées
    pub fn from_lines(parcel_lines: &[String], plan_lines: &[String]) -> Self {
        let parcels = parse_metrics_lines(parcel_lines, MetricsScope::Parcel);
        let plans = parse_metrics_lines(plan_lines, MetricsScope::PlanFallback);
        Self::new(parcels, plans)
    }

    pub fn parcel_count(&self) -> usize {
        self.parcels.len()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty() && self.plans.is_empty()
    }

    /// Recherche par lotplan avec repli sur le plan
    pub fn lookup(&self, identifier: &str) -> Option<BccMetricsSnapshot> {
        let key = LotPlanKey::new(identifier);
        if key.as_str().is_empty() {
            return None;
        }

        if let Some(snapshot) = self.parcels.get(&key) {
            let mut found = snapshot.clone();
            found.scope = MetricsScope::Parcel;
            return Some(found);
        }

        let parts = match LotPlanParts::parse(key.as_str()) {
            Ok(parts) => parts,
            Err(e) => {
                debug!(identifier, error = %e, "Identifier is not a lotplan, no plan fallback");
                return None;
            }
        };

        let plan = self.plans.get(&LotPlanKey::new(&parts.plan))?;
        let mut fallback = plan.clone();
        fallback.key = identifier.trim().to_string();
        fallback.scope = MetricsScope::PlanFallback;
        Some(fallback)
    }
}

impl ParcelMetricsLookup for ParcelMetricsIndex {
    fn lookup(&self, identifier: &str) -> Option<BccMetricsSnapshot> {
        ParcelMetricsIndex::lookup(self, identifier)
    }
}

/// Décode les lignes en parallèle, en conservant l'ordre du fichier
pub fn parse_metrics_lines(lines: &[String], scope: MetricsScope) -> Vec<BccMetricsSnapshot> {
    lines
        .par_iter()
        .enumerate()
        .filter_map(|(idx, line)| match parse_metrics_line(line, scope) {
            Ok((_, snapshot)) => Some(snapshot),
            Err(e) => {
                warn!(line = idx + 1, ?scope, error = %e, "Skipping malformed metrics record");
                None
            }
        })
        .collect()
}
