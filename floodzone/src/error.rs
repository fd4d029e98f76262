//! Types d'erreurs pour le crate floodzone

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement ou de l'interrogation des données inondation
#[derive(Debug, Error)]
pub enum FloodError {
    /// Argument hors domaine (coordonnées invalides, polygone dégénéré, etc.)
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Identifiant vide ou composé uniquement d'espaces
    #[error("Identifier cannot be empty")]
    EmptyInput,

    /// Identifiant lot/plan non décomposable
    #[error("Invalid lotplan format: '{0}'")]
    InvalidFormat(String),

    /// Erreur d'I/O lors de la lecture d'un fichier NDJSON
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ligne NDJSON illisible
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Géométrie absente, non polygonale ou mal encodée
    #[error("Invalid geometry for {zone_id}: {reason}")]
    InvalidGeometry { zone_id: String, reason: String },
}

impl FloodError {
    /// Crée une erreur d'argument avec contexte
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(zone_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            zone_id: zone_id.into(),
            reason: reason.into(),
        }
    }
}
