//! Screening d'une liste d'adresses avec parallélisme borné

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provider::{FloodDataProvider, FloodLookupResult, LookupCancelled};
use crate::report::ScreeningReport;
use crate::summary::FloodSummary;

/// Résultat du screening d'une adresse
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningEntry {
    pub query: String,
    pub outcome: Result<FloodLookupResult, LookupCancelled>,
}

impl ScreeningEntry {
    pub fn summary(&self) -> Option<FloodSummary> {
        self.outcome.as_ref().ok().map(FloodSummary::from_result)
    }
}

/// Traite les adresses avec au plus `jobs` requêtes simultanées.
///
/// Les résultats sont rendus dans l'ordre des adresses. Une annulation
/// marque les requêtes restantes comme annulées sans les exécuter.
pub async fn screen_all<P>(
    provider: &P,
    addresses: &[String],
    jobs: usize,
    cancel: &CancellationToken,
) -> Vec<ScreeningEntry>
where
    P: FloodDataProvider + ?Sized,
{
    let jobs = jobs.max(1);
    info!(addresses = addresses.len(), jobs, "Starting screening");

    stream::iter(addresses.iter())
        .map(|address| async move {
            let outcome = provider.lookup(address, cancel).await;
            match &outcome {
                Ok(result) => debug!(
                    address = %address,
                    risk = %result.risk,
                    source = %result.source,
                    "Screened"
                ),
                Err(e) => debug!(address = %address, error = %e, "Screening skipped"),
            }
            ScreeningEntry {
                query: address.clone(),
                outcome,
            }
        })
        .buffered(jobs)
        .collect()
        .await
}

/// Agrège les résultats dans un rapport
pub fn build_report(entries: &[ScreeningEntry]) -> ScreeningReport {
    let mut report = ScreeningReport::new();
    for entry in entries {
        match entry.summary() {
            Some(summary) => report.record(&summary),
            None => report.record_cancelled(),
        }
    }
    report
}

/// Adresses d'un fichier texte : une par ligne, lignes vides et commentaires `#` ignorés
pub fn parse_address_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
