//! Parser des identifiants cadastraux lot/plan du Queensland
//!
//! Format: `{lot}{type de plan}{numéro}`, sans séparateur.
//! - lot numérique : "3GTP102995" → lot "3", plan "GTP102995"
//! - lot lettre (titres de copropriété, "A" = parties communes) :
//!   "ASP279272" → lot "A", plan "SP279272"

use crate::FloodError;

/// Types de plan à trois lettres (testés en premier pour éviter les correspondances partielles)
const PLAN_TYPES_3: &[&str] = &["BUP", "GTP", "SBP", "CSH", "MPH", "NPW", "USL", "CRH"];

/// Types de plan à deux lettres
const PLAN_TYPES_2: &[&str] = &[
    "SP", "RP", "CP", "AP", "SL", "CG", "DS", "MC", "MP", "PH", "AG", "RL", "WD", "NR",
];

/// Types de plan à une lettre
const PLAN_TYPES_1: &[&str] = &["B", "C", "L", "M", "S", "W"];

/// Composantes d'un identifiant lotplan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LotPlanParts {
    pub lot: String,
    pub plan: String,
}

impl LotPlanParts {
    /// Décompose un identifiant lotplan.
    ///
    /// # Errors
    ///
    /// `FloodError::EmptyInput` si l'identifiant est vide,
    /// `FloodError::InvalidFormat` si aucune décomposition ne convient.
    pub fn parse(lotplan: &str) -> Result<Self, FloodError> {
        if lotplan.trim().is_empty() {
            return Err(FloodError::EmptyInput);
        }

        // Chemin numérique (cas courant)
        let digits = lotplan.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && digits < lotplan.len() {
            return Ok(Self::split(lotplan, digits));
        }

        if lotplan.as_bytes()[0].is_ascii_uppercase() {
            // "GTP102995" est un plan sans lot
            if is_plan(lotplan) {
                return Err(FloodError::InvalidFormat(lotplan.to_string()));
            }

            for (i, _) in lotplan.char_indices().skip(1) {
                if starts_with_plan_type(&lotplan[i..]) {
                    return Ok(Self::split(lotplan, i));
                }
            }
        }

        Err(FloodError::InvalidFormat(lotplan.to_string()))
    }

    /// Lot 0 du même plan (parties communes des opérations multi-lots)
    pub fn common_lot_plan(&self) -> String {
        format!("0{}", self.plan)
    }

    pub fn is_common_lot(&self) -> bool {
        self.lot == "0"
    }

    fn split(lotplan: &str, at: usize) -> Self {
        Self {
            lot: lotplan[..at].to_string(),
            plan: lotplan[at..].to_string(),
        }
    }
}

/// Longueur du code de type de plan en tête de `s`, si suivi d'au moins un chiffre
fn plan_type_len(s: &str) -> Option<usize> {
    PLAN_TYPES_3
        .iter()
        .chain(PLAN_TYPES_2)
        .chain(PLAN_TYPES_1)
        .find(|code| {
            s.starts_with(*code)
                && s.as_bytes()
                    .get(code.len())
                    .is_some_and(|b| b.is_ascii_digit())
        })
        .map(|code| code.len())
}

fn starts_with_plan_type(s: &str) -> bool {
    plan_type_len(s).is_some()
}

/// Chaîne entière conforme à la grammaire d'un plan : code puis chiffres uniquement
fn is_plan(s: &str) -> bool {
    PLAN_TYPES_3
        .iter()
        .chain(PLAN_TYPES_2)
        .chain(PLAN_TYPES_1)
        .any(|code| {
            s.strip_prefix(*code)
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
}
