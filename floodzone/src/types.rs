//! Types de données pour le crate floodzone

use std::cmp::Ordering;
use std::fmt;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Classification du risque inondation d'une localisation
///
/// L'ordre de sévérité est `Unknown < None < Low < Medium < High`. `Unknown`
/// signifie « pas d'information » : il ne sort vainqueur d'une agrégation par
/// maximum que si aucune autre valeur n'est disponible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum FloodRisk {
    /// Risque indéterminé (géocodage échoué, données absentes, etc.)
    #[default]
    Unknown,
    /// Localisation vérifiée, hors de toute zone inondable
    None,
    /// Probabilité faible (AEP 1% ou moins fréquent)
    Low,
    /// Probabilité moyenne (AEP 2-5%)
    Medium,
    /// Probabilité forte (AEP supérieure à 5%)
    High,
}

impl FloodRisk {
    /// Rang de sévérité utilisé pour les comparaisons et l'agrégation par maximum
    pub fn severity(self) -> u8 {
        match self {
            FloodRisk::Unknown => 0,
            FloodRisk::None => 1,
            FloodRisk::Low => 2,
            FloodRisk::Medium => 3,
            FloodRisk::High => 4,
        }
    }

    /// `false` uniquement pour `Unknown`
    pub fn is_known(self) -> bool {
        self != FloodRisk::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FloodRisk::Unknown => "Unknown",
            FloodRisk::None => "None",
            FloodRisk::Low => "Low",
            FloodRisk::Medium => "Medium",
            FloodRisk::High => "High",
        }
    }

    /// Décode un libellé de risque, insensible à la casse.
    /// Tout libellé non reconnu donne `Unknown`.
    pub fn parse_lenient(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" => FloodRisk::None,
            "low" => FloodRisk::Low,
            "medium" => FloodRisk::Medium,
            "high" => FloodRisk::High,
            _ => FloodRisk::Unknown,
        }
    }
}

impl Ord for FloodRisk {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for FloodRisk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FloodRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FloodRisk {
    fn from(value: String) -> Self {
        FloodRisk::parse_lenient(&value)
    }
}

impl From<FloodRisk> for &'static str {
    fn from(value: FloodRisk) -> Self {
        value.as_str()
    }
}

/// Position d'un point par rapport à une zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloodZoneProximity {
    #[default]
    None,
    Inside,
    Near,
}

impl fmt::Display for FloodZoneProximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FloodZoneProximity::None => "None",
            FloodZoneProximity::Inside => "Inside",
            FloodZoneProximity::Near => "Near",
        };
        f.write_str(label)
    }
}

/// Une zone inondable chargée en mémoire (WGS84, ordre lon/lat)
#[derive(Debug, Clone, PartialEq)]
pub struct FloodZone {
    /// Identifiant de la zone dans le jeu source
    pub id: String,

    /// Classification du risque
    pub risk: FloodRisk,

    /// Emprise de la zone
    pub geometry: MultiPolygon<f64>,
}

/// Résultat d'une recherche de proximité
#[derive(Debug, Clone, PartialEq)]
pub struct FloodZoneHit {
    pub zone: FloodZone,

    /// Distance en mètres (0 quand le point est à l'intérieur)
    pub distance_metres: f64,

    pub proximity: FloodZoneProximity,
}

/// Portée d'un enregistrement de métriques
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricsScope {
    #[default]
    Unknown,
    /// Métriques propres à la parcelle (lotplan)
    Parcel,
    /// Agrégat au niveau du plan, utilisé faute de métriques parcellaires
    PlanFallback,
}

/// Instantané des métriques inondation BCC d'une parcelle ou d'un plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BccMetricsSnapshot {
    /// Lotplan (portée parcelle) ou identifiant interrogé (repli plan)
    pub key: String,

    /// Partie plan du lotplan (ex: "GTP102995")
    pub plan: String,

    /// Jamais inférieur au maximum des risques rivière, ruisseau et marée de tempête
    pub overall_risk: FloodRisk,
    pub river_risk: FloodRisk,
    pub creek_risk: FloodRisk,
    pub storm_tide_risk: FloodRisk,
    pub overland_flow_risk: FloodRisk,

    /// La parcelle ou le plan porte une information inondation dans les données BCC
    pub has_flood_info: bool,

    pub scope: MetricsScope,

    /// Drapeaux bruts (FL_HIGH_RIVER, OLF_FLAG, ...) dans l'ordre d'apparition
    pub evidence_metrics: Vec<String>,

    /// Niveaux AEP transmis tels quels (mAHD)
    pub one_percent_aep_river: Option<f64>,
    pub point_two_percent_aep_river: Option<f64>,
    pub defined_flood_level: Option<f64>,
    pub historic_flood_level: Option<f64>,
}
