//! Décodage des lignes de métriques BCC et agrégation par plan

use serde::Deserialize;

use crate::types::{BccMetricsSnapshot, FloodRisk, MetricsScope};
use crate::FloodError;

/// Ligne NDJSON du jeu « flood awareness property parcel metrics »
#[derive(Debug, Deserialize)]
struct MetricsRecord {
    #[serde(default, alias = "Lotplan", alias = "LotPlan", alias = "LOTPLAN")]
    lotplan: Option<String>,

    #[serde(default, alias = "Plan", alias = "PLAN")]
    plan: Option<String>,

    #[serde(default, alias = "Overall_Risk", alias = "OverallRisk")]
    overall_risk: Option<String>,

    #[serde(default, alias = "River_Risk", alias = "RiverRisk")]
    river_risk: Option<String>,

    #[serde(default, alias = "Creek_Risk", alias = "CreekRisk")]
    creek_risk: Option<String>,

    #[serde(default, alias = "Storm_Tide_Risk", alias = "StormTideRisk")]
    storm_tide_risk: Option<String>,

    #[serde(default, alias = "Has_Flood_Info", alias = "HasFloodInfo")]
    has_flood_info: bool,

    #[serde(default, alias = "Has_Overland_Flow", alias = "HasOverlandFlow")]
    has_overland_flow: bool,

    #[serde(default, alias = "Evidence_Metrics", alias = "EvidenceMetrics")]
    evidence_metrics: Option<Vec<String>>,

    #[serde(default, alias = "OnePercentAepRiver")]
    one_percent_aep_river: Option<f64>,

    #[serde(default, alias = "PointTwoPercentAepRiver")]
    point_two_percent_aep_river: Option<f64>,

    #[serde(default, alias = "DefinedFloodLevel")]
    defined_flood_level: Option<f64>,

    #[serde(default, alias = "historic_flood_level", alias = "HistoricFloodLevel1")]
    historic_flood_level_1: Option<f64>,
}

fn risk(text: Option<&str>) -> FloodRisk {
    text.map(FloodRisk::parse_lenient).unwrap_or_default()
}

/// Décode une ligne en snapshot.
///
/// Retourne la clé d'indexation (lotplan en portée parcelle, plan en portée plan)
/// avec le snapshot. Une ligne sans clé est rejetée.
pub fn parse_metrics_line(
    line: &str,
    scope: MetricsScope,
) -> Result<(String, BccMetricsSnapshot), FloodError> {
    let record: MetricsRecord = serde_json::from_str(line)?;

    let lotplan = record.lotplan.unwrap_or_default();
    let plan = record.plan.unwrap_or_default();

    let key = match scope {
        MetricsScope::PlanFallback => plan.clone(),
        _ => lotplan.clone(),
    };
    if key.trim().is_empty() {
        return Err(FloodError::InvalidFormat(format!(
            "metrics record without {} key",
            if scope == MetricsScope::PlanFallback {
                "plan"
            } else {
                "lotplan"
            }
        )));
    }

    let river_risk = risk(record.river_risk.as_deref());
    let creek_risk = risk(record.creek_risk.as_deref());
    let storm_tide_risk = risk(record.storm_tide_risk.as_deref());
    let overall_risk = risk(record.overall_risk.as_deref())
        .max(river_risk)
        .max(creek_risk)
        .max(storm_tide_risk);

    let snapshot = BccMetricsSnapshot {
        key: if lotplan.is_empty() { key.clone() } else { lotplan },
        plan,
        overall_risk,
        river_risk,
        creek_risk,
        storm_tide_risk,
        overland_flow_risk: if record.has_overland_flow {
            FloodRisk::Unknown
        } else {
            FloodRisk::None
        },
        has_flood_info: record.has_flood_info,
        scope,
        evidence_metrics: record.evidence_metrics.unwrap_or_default(),
        one_percent_aep_river: record.one_percent_aep_river,
        point_two_percent_aep_river: record.point_two_percent_aep_river,
        defined_flood_level: record.defined_flood_level,
        historic_flood_level: record.historic_flood_level_1,
    };

    Ok((key, snapshot))
}

/// Agrège les lots d'un même plan : maximum par source, info inondation si un
/// lot en porte, union des drapeaux dans l'ordre d'apparition.
pub fn aggregate_plan<'a>(
    plan: &str,
    lots: impl IntoIterator<Item = &'a BccMetricsSnapshot>,
) -> BccMetricsSnapshot {
    let mut aggregate = BccMetricsSnapshot {
        key: plan.to_string(),
        plan: plan.to_string(),
        overall_risk: FloodRisk::Unknown,
        river_risk: FloodRisk::Unknown,
        creek_risk: FloodRisk::Unknown,
        storm_tide_risk: FloodRisk::Unknown,
        overland_flow_risk: FloodRisk::Unknown,
        has_flood_info: false,
        scope: MetricsScope::PlanFallback,
        evidence_metrics: Vec::new(),
        one_percent_aep_river: None,
        point_two_percent_aep_river: None,
        defined_flood_level: None,
        historic_flood_level: None,
    };

    let mut any_lot = false;
    let mut any_overland = false;
    for lot in lots {
        any_lot = true;
        aggregate.overall_risk = aggregate.overall_risk.max(lot.overall_risk);
        aggregate.river_risk = aggregate.river_risk.max(lot.river_risk);
        aggregate.creek_risk = aggregate.creek_risk.max(lot.creek_risk);
        aggregate.storm_tide_risk = aggregate.storm_tide_risk.max(lot.storm_tide_risk);
        any_overland |= lot.overland_flow_risk == FloodRisk::Unknown;
        aggregate.has_flood_info |= lot.has_flood_info;

        for flag in &lot.evidence_metrics {
            if !aggregate
                .evidence_metrics
                .iter()
                .any(|f| f.eq_ignore_ascii_case(flag))
            {
                aggregate.evidence_metrics.push(flag.clone());
            }
        }

        aggregate.one_percent_aep_river =
            max_level(aggregate.one_percent_aep_river, lot.one_percent_aep_river);
        aggregate.point_two_percent_aep_river = max_level(
            aggregate.point_two_percent_aep_river,
            lot.point_two_percent_aep_river,
        );
        aggregate.defined_flood_level =
            max_level(aggregate.defined_flood_level, lot.defined_flood_level);
        aggregate.historic_flood_level =
            max_level(aggregate.historic_flood_level, lot.historic_flood_level);
    }

    if any_lot && !any_overland {
        aggregate.overland_flow_risk = FloodRisk::None;
    }

    aggregate
}

fn max_level(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
