//! Résumé lisible d'un résultat de screening (affichage, exports CSV/JSON)

use floodzone::{FloodRisk, GeoPoint};
use serde::Serialize;

use crate::provider::{FloodDataSource, FloodLookupResult};

/// Emprise approximative du Brisbane City Council (large, pour éviter les faux positifs)
const BCC_MIN_LATITUDE: f64 = -27.70;
const BCC_MAX_LATITUDE: f64 = -27.00;
const BCC_MIN_LONGITUDE: f64 = 152.65;
const BCC_MAX_LONGITUDE: f64 = 153.20;

/// Le point est dans l'emprise couverte par les données BCC.
///
/// Contrôle grossier par boîte englobante : près des limites, un point peut
/// être mal classé.
pub fn is_inside_coverage_area(point: GeoPoint) -> bool {
    (BCC_MIN_LATITUDE..=BCC_MAX_LATITUDE).contains(&point.latitude())
        && (BCC_MIN_LONGITUDE..=BCC_MAX_LONGITUDE).contains(&point.longitude())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodSummary {
    pub address: String,

    /// None, Low, Medium, High ou Unknown
    pub overall_risk: String,

    /// Libellé destiné à l'utilisateur
    pub risk_label: String,

    /// Une information inondation a été trouvée
    pub has_flood_info: bool,

    /// BCC_PARCEL_METRICS, PARCEL_INTERSECTS_EXTENTS, POINT_BUFFER ou UNKNOWN
    pub source: String,

    /// Parcel, PlanFallback ou Unknown
    pub scope: String,

    /// Raisons concaténées
    pub notes: Option<String>,

    /// Dans une emprise inondable, sans classification : vérification manuelle nécessaire
    pub is_data_gap: bool,

    /// Distance à l'emprise la plus proche quand la propriété est à côté
    pub nearby_distance_metres: Option<f64>,

    pub is_outside_coverage_area: bool,
}

impl FloodSummary {
    pub fn from_result(result: &FloodLookupResult) -> Self {
        let has_flood_info = (result.risk.is_known() && result.source != FloodDataSource::Unknown)
            || result.has_any_extent_intersection;
        let is_data_gap = result.has_any_extent_intersection && result.risk == FloodRisk::Unknown;
        let is_outside_coverage_area = result
            .location
            .is_some_and(|point| !is_inside_coverage_area(point));

        Self {
            address: result.address.clone(),
            overall_risk: result.risk.to_string(),
            risk_label: risk_label(result.risk, is_data_gap, is_outside_coverage_area),
            has_flood_info,
            source: result.source.code().to_string(),
            scope: result.scope.to_string(),
            notes: (!result.reasons.is_empty()).then(|| result.reasons.join(" ")),
            is_data_gap,
            nearby_distance_metres: result.distance_metres,
            is_outside_coverage_area,
        }
    }
}

impl From<&FloodLookupResult> for FloodSummary {
    fn from(result: &FloodLookupResult) -> Self {
        Self::from_result(result)
    }
}

fn risk_label(risk: FloodRisk, is_data_gap: bool, is_outside_coverage_area: bool) -> String {
    match risk {
        FloodRisk::Unknown if is_data_gap => "Unclassified flood extent - check FloodWise".into(),
        FloodRisk::Unknown if is_outside_coverage_area => "Outside coverage area".into(),
        FloodRisk::Unknown => "Unknown".into(),
        FloodRisk::None => "No flood risk identified".into(),
        risk => format!("{} likelihood", risk),
    }
}
