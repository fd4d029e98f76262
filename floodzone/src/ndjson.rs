//! Lecture des fichiers NDJSON sources

use std::path::Path;

use tracing::{debug, warn};

use crate::FloodError;

/// Lignes non vides d'un fichier NDJSON.
///
/// Un fichier absent donne une liste vide : les index dégradent alors en
/// « non trouvé » au lieu d'échouer.
pub fn read_lines(path: &Path) -> Result<Vec<String>, FloodError> {
    if !path.exists() {
        warn!(path = %path.display(), "NDJSON file not found, using empty dataset");
        return Ok(Vec::new());
    }

    let content = std::fs::read(path)?;
    debug!(
        path = %path.display(),
        bytes = content.len(),
        checksum = %checksum(&content),
        "Read NDJSON file"
    );

    let text = String::from_utf8_lossy(&content);
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Empreinte blake3 du contenu, pour tracer la version des données chargées
pub fn checksum(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
