//! Rapport de screening
//!
//! Compteurs par niveau de risque et par source, avec les lacunes de données
//! et les adresses hors emprise BCC.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::summary::FloodSummary;

/// Statut global du screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScreeningStatus {
    /// Toutes les adresses ont un risque connu
    Success,
    /// Certaines adresses restent à risque inconnu
    PartialSuccess,
    /// Screening interrompu avant la fin
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    pub duration_secs: f64,
    pub status: ScreeningStatus,

    /// Adresses traitées jusqu'au bout
    pub screened: usize,
    /// Adresses non traitées suite à une annulation
    pub cancelled: usize,
    /// Adresses avec information inondation
    pub with_flood_info: usize,
    /// Dans une emprise sans classification
    pub data_gaps: usize,
    pub outside_coverage: usize,

    pub by_risk: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,

    /// Adresses à risque inconnu, pour relecture manuelle
    pub unresolved: Vec<String>,
}

impl Default for ScreeningReport {
    fn default() -> Self {
        Self {
            duration_secs: 0.0,
            status: ScreeningStatus::Success,
            screened: 0,
            cancelled: 0,
            with_flood_info: 0,
            data_gaps: 0,
            outside_coverage: 0,
            by_risk: BTreeMap::new(),
            by_source: BTreeMap::new(),
            unresolved: Vec::new(),
        }
    }
}

impl ScreeningReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre le résumé d'une adresse traitée
    pub fn record(&mut self, summary: &FloodSummary) {
        self.screened += 1;
        *self.by_risk.entry(summary.overall_risk.clone()).or_default() += 1;
        *self.by_source.entry(summary.source.clone()).or_default() += 1;

        if summary.has_flood_info {
            self.with_flood_info += 1;
        }
        if summary.is_data_gap {
            self.data_gaps += 1;
        }
        if summary.is_outside_coverage_area {
            self.outside_coverage += 1;
        }
        if summary.overall_risk == "Unknown" {
            self.unresolved.push(summary.address.clone());
        }
    }

    /// Enregistre une adresse non traitée
    pub fn record_cancelled(&mut self) {
        self.cancelled += 1;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.cancelled > 0 {
            ScreeningStatus::Cancelled
        } else if !self.unresolved.is_empty() {
            ScreeningStatus::PartialSuccess
        } else {
            ScreeningStatus::Success
        };
    }

    pub fn total(&self) -> usize {
        self.screened + self.cancelled
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("FLOOD SCREENING REPORT");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Addresses: {} screened, {} cancelled",
            self.screened, self.cancelled
        );
        println!(
            "Flood info: {}, data gaps: {}, outside coverage: {}",
            self.with_flood_info, self.data_gaps, self.outside_coverage
        );

        if !self.by_risk.is_empty() {
            println!("\n--- BY RISK ---");
            for (risk, count) in &self.by_risk {
                println!("  {}: {}", risk, count);
            }
        }

        if !self.by_source.is_empty() {
            println!("\n--- BY SOURCE ---");
            for (source, count) in &self.by_source {
                println!("  {}: {}", source, count);
            }
        }

        if !self.unresolved.is_empty() {
            println!("\n--- UNRESOLVED ({}) ---", self.unresolved.len());
            for address in self.unresolved.iter().take(20) {
                println!("  {}", address);
            }
            if self.unresolved.len() > 20 {
                println!("  ... and {} more", self.unresolved.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        format!(
            "{} screened, {} with flood info, {} data gaps, {} unresolved",
            self.screened,
            self.with_flood_info,
            self.data_gaps,
            self.unresolved.len()
        )
    }
}
