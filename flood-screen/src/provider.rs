//! Résolution du risque inondation par niveaux de précision
//!
//! Ordre de résolution, le premier niveau applicable l'emporte :
//! 1. métriques BCC précalculées par parcelle (repli plan), si le géocodeur fournit un lotplan
//! 2. intersection parcelle / emprises à l'exécution : réservé, non implémenté
//! 3. tampon autour du point géocodé dans l'index de zones
//!
//! L'absence d'information est un résultat (`Unknown`, ou `None` confirmé),
//! jamais une erreur. Seule l'annulation interrompt une requête.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use floodzone::{
    BccMetricsSnapshot, FloodRisk, FloodZoneIndex, FloodZoneProximity, GeoPoint, MetricsScope,
    ParcelMetricsLookup,
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::geocode::{Geocoder, GeocodingResult};

/// Rayon du tampon de recherche par défaut (tier 3)
pub const DEFAULT_BUFFER_METRES: f64 = 30.0;

/// Niveau ayant produit le résultat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum FloodDataSource {
    #[default]
    Unknown,
    /// Tier 1 : métriques BCC précalculées
    BccParcelMetrics,
    /// Tier 2 : réservé
    ParcelIntersectsExtents,
    /// Tier 3 : tampon autour du point
    PointBuffer,
}

impl FloodDataSource {
    /// Code affiché dans les exports
    pub fn code(self) -> &'static str {
        match self {
            FloodDataSource::BccParcelMetrics => "BCC_PARCEL_METRICS",
            FloodDataSource::ParcelIntersectsExtents => "PARCEL_INTERSECTS_EXTENTS",
            FloodDataSource::PointBuffer => "POINT_BUFFER",
            FloodDataSource::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FloodDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Granularité des données utilisées
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum FloodDataScope {
    #[default]
    Unknown,
    Parcel,
    PlanFallback,
}

impl From<MetricsScope> for FloodDataScope {
    fn from(scope: MetricsScope) -> Self {
        match scope {
            MetricsScope::Parcel => FloodDataScope::Parcel,
            _ => FloodDataScope::PlanFallback,
        }
    }
}

impl fmt::Display for FloodDataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FloodDataScope::Unknown => "Unknown",
            FloodDataScope::Parcel => "Parcel",
            FloodDataScope::PlanFallback => "PlanFallback",
        };
        f.write_str(label)
    }
}

/// Résultat d'une requête, construit une fois et jamais modifié
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodLookupResult {
    /// Adresse normalisée par le géocodeur, sinon adresse demandée
    pub address: String,
    pub risk: FloodRisk,
    pub proximity: FloodZoneProximity,
    /// Renseignée seulement à l'extérieur d'une zone, à distance non nulle
    pub distance_metres: Option<f64>,
    pub reasons: Vec<String>,
    pub source: FloodDataSource,
    pub scope: FloodDataScope,
    pub has_any_extent_intersection: bool,
    /// Point géocodé, quand il existe
    pub location: Option<GeoPoint>,
}

impl FloodLookupResult {
    fn unknown(address: &str, reason: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            risk: FloodRisk::Unknown,
            proximity: FloodZoneProximity::None,
            distance_metres: None,
            reasons: vec![reason.into()],
            source: FloodDataSource::Unknown,
            scope: FloodDataScope::Unknown,
            has_any_extent_intersection: false,
            location: None,
        }
    }
}

/// La requête a été annulée par l'appelant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Flood lookup cancelled")]
pub struct LookupCancelled;

/// Détermination du risque inondation d'une adresse
#[async_trait]
pub trait FloodDataProvider: Send + Sync {
    async fn lookup(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<FloodLookupResult, LookupCancelled>;
}

/// Orchestrateur des trois niveaux
pub struct HybridFloodDataProvider {
    geocoder: Arc<dyn Geocoder>,
    metrics: Arc<dyn ParcelMetricsLookup>,
    zones: Arc<dyn FloodZoneIndex>,
    buffer_metres: f64,
}

impl HybridFloodDataProvider {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        metrics: Arc<dyn ParcelMetricsLookup>,
        zones: Arc<dyn FloodZoneIndex>,
    ) -> Self {
        Self {
            geocoder,
            metrics,
            zones,
            buffer_metres: DEFAULT_BUFFER_METRES,
        }
    }

    pub fn with_buffer_metres(mut self, buffer_metres: f64) -> Self {
        self.buffer_metres = buffer_metres;
        self
    }

    pub fn buffer_metres(&self) -> f64 {
        self.buffer_metres
    }

    /// Résout le risque d'une adresse.
    ///
    /// # Errors
    ///
    /// `LookupCancelled` si le jeton est annulé avant ou pendant le géocodage ;
    /// les niveaux suivants ne sont alors pas exécutés.
    pub async fn lookup(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<FloodLookupResult, LookupCancelled> {
        if cancel.is_cancelled() {
            return Err(LookupCancelled);
        }

        if address.trim().is_empty() {
            return Ok(FloodLookupResult::unknown(
                address,
                "Address was empty or whitespace.",
            ));
        }

        let geo = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(address, "Lookup cancelled during geocoding");
                return Err(LookupCancelled);
            }
            geo = self.geocoder.geocode(address) => geo,
        };

        if cancel.is_cancelled() {
            return Err(LookupCancelled);
        }

        if !geo.is_success() {
            debug!(address, status = %geo.status, provider = %geo.provider, "Geocoding failed");
            return Ok(FloodLookupResult::unknown(
                address,
                format!("Geocoding failed: {}", geo.status),
            ));
        }

        let display_address = geo
            .normalized_address
            .clone()
            .unwrap_or_else(|| geo.query.clone());

        if let Some(lot_plan) = geo.lot_plan.as_deref().filter(|lp| !lp.is_empty()) {
            if let Some(metrics) = self.metrics.lookup(lot_plan) {
                debug!(address, lot_plan, scope = ?metrics.scope, "Resolved from parcel metrics");
                return Ok(tier1_result(&display_address, lot_plan, &metrics, geo.location));
            }
            debug!(address, lot_plan, "No parcel metrics, falling through");
        }

        // Tier 2 (intersection parcelle / emprises) : non implémenté

        if let Some(location) = geo.location {
            return Ok(self.tier3_result(&display_address, location));
        }

        Ok(unresolved(&display_address, &geo))
    }

    fn tier3_result(&self, address: &str, location: GeoPoint) -> FloodLookupResult {
        let Some(hit) = self.zones.find_nearest_zone(location, self.buffer_metres) else {
            debug!(address, %location, buffer = self.buffer_metres, "No flood zone within buffer");
            return FloodLookupResult {
                address: address.to_string(),
                risk: FloodRisk::None,
                proximity: FloodZoneProximity::None,
                distance_metres: None,
                reasons: vec!["No flood zone found within buffer distance (point buffer).".into()],
                source: FloodDataSource::PointBuffer,
                scope: FloodDataScope::Unknown,
                has_any_extent_intersection: false,
                location: Some(location),
            };
        };

        let inside = hit.proximity == FloodZoneProximity::Inside;
        let risk = hit.zone.risk;

        let mut reasons = Vec::with_capacity(2);
        if inside && risk == FloodRisk::Unknown {
            reasons.push(
                "Property is inside an unclassified flood extent (point buffer). \
                 Manual FloodWise check recommended."
                    .to_string(),
            );
            if let Some(overlay) = self.zones.find_risk_overlay_for_point(location) {
                reasons.push(format!(
                    "Flood-risk overlay classifies this location as {}.",
                    overlay
                ));
            }
        } else if inside {
            reasons.push(format!(
                "Location falls inside {} likelihood flood zone (point buffer).",
                risk
            ));
        } else {
            reasons.push(format!(
                "Location is {:.1}m from {} likelihood flood zone (point buffer).",
                hit.distance_metres, risk
            ));
        }

        debug!(address, zone = %hit.zone.id, %risk, proximity = %hit.proximity, "Resolved from point buffer");

        FloodLookupResult {
            address: address.to_string(),
            risk,
            proximity: hit.proximity,
            distance_metres: (hit.distance_metres > 0.0).then_some(hit.distance_metres),
            reasons,
            source: FloodDataSource::PointBuffer,
            scope: FloodDataScope::Unknown,
            has_any_extent_intersection: inside,
            location: Some(location),
        }
    }
}

fn tier1_result(
    address: &str,
    lot_plan: &str,
    metrics: &BccMetricsSnapshot,
    location: Option<GeoPoint>,
) -> FloodLookupResult {
    let scope = FloodDataScope::from(metrics.scope);

    if !metrics.has_flood_info {
        // Parcelle connue sans information inondation : absence de risque confirmée
        return FloodLookupResult {
            address: address.to_string(),
            risk: FloodRisk::None,
            proximity: FloodZoneProximity::None,
            distance_metres: None,
            reasons: vec![format!(
                "BCC parcel metrics indicate no flood risk for {}.",
                lot_plan
            )],
            source: FloodDataSource::BccParcelMetrics,
            scope,
            has_any_extent_intersection: false,
            location,
        };
    }

    let scope_description = match scope {
        FloodDataScope::PlanFallback => format!("(plan-level fallback for {})", metrics.plan),
        _ => format!("(parcel: {})", lot_plan),
    };

    let mut reasons = vec![format!(
        "Risk derived from BCC parcel metrics {}.",
        scope_description
    )];
    if !metrics.evidence_metrics.is_empty() {
        reasons.push(format!(
            "Source flags: {}",
            metrics.evidence_metrics.join(", ")
        ));
    }

    FloodLookupResult {
        address: address.to_string(),
        risk: metrics.overall_risk,
        proximity: FloodZoneProximity::Inside,
        distance_metres: None,
        reasons,
        source: FloodDataSource::BccParcelMetrics,
        scope,
        has_any_extent_intersection: true,
        location,
    }
}

fn unresolved(address: &str, geo: &GeocodingResult) -> FloodLookupResult {
    debug!(address, provider = %geo.provider, "Neither lotplan nor location available");
    FloodLookupResult::unknown(
        address,
        "Could not determine flood risk: no lotplan or location available.",
    )
}

#[async_trait]
impl FloodDataProvider for HybridFloodDataProvider {
    async fn lookup(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<FloodLookupResult, LookupCancelled> {
        HybridFloodDataProvider::lookup(self, address, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodingStatus;
    use floodzone::geometry::{metres_per_degree, polygon_from_points};
    use floodzone::{
        FloodDataOptions, FloodDataset, FloodZone, FloodZoneHit, ParcelMetricsIndex, ZoneIndex,
    };
    use geo::MultiPolygon;
    use std::time::Duration;

    struct StubGeocoder(GeocodingResult);

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _address: &str) -> GeocodingResult {
            self.0.clone()
        }
    }

    /// Géocodeur qui ne répond jamais
    struct PendingGeocoder;

    #[async_trait]
    impl Geocoder for PendingGeocoder {
        async fn geocode(&self, _address: &str) -> GeocodingResult {
            futures::future::pending::<GeocodingResult>().await
        }
    }

    /// Index de zones avec un overlay fixe
    struct OverlayIndex {
        zones: ZoneIndex,
        overlay: Option<FloodRisk>,
    }

    impl FloodZoneIndex for OverlayIndex {
        fn find_zone_for_point(&self, point: GeoPoint) -> Option<FloodZone> {
            self.zones.find_zone_for_point(point)
        }

        fn find_nearest_zone(&self, point: GeoPoint, max: f64) -> Option<FloodZoneHit> {
            self.zones.find_nearest_zone(point, max)
        }

        fn find_risk_overlay_for_point(&self, _point: GeoPoint) -> Option<FloodRisk> {
            self.overlay
        }
    }

    const ADDRESS: &str = "1 Test St, Brisbane";

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn square_zone(id: &str, risk: FloodRisk) -> FloodZone {
        let polygon = polygon_from_points(&[
            point(-27.48, 153.00),
            point(-27.48, 153.05),
            point(-27.45, 153.05),
            point(-27.45, 153.00),
        ])
        .unwrap();
        FloodZone {
            id: id.to_string(),
            risk,
            geometry: MultiPolygon::new(vec![polygon]),
        }
    }

    fn geocoded(location: Option<GeoPoint>, lot_plan: Option<&str>) -> GeocodingResult {
        GeocodingResult {
            query: ADDRESS.to_string(),
            status: GeocodingStatus::Success,
            normalized_address: Some(ADDRESS.to_string()),
            location,
            provider: "Stub".to_string(),
            lot_plan: lot_plan.map(str::to_string),
        }
    }

    fn metrics() -> ParcelMetricsIndex {
        ParcelMetricsIndex::from_lines(
            &[
                r#"{"lotplan":"3GTP102995","plan":"GTP102995","overall_risk":"High","river_risk":"High","has_flood_info":true,"evidence_metrics":["FL_HIGH_RIVER","FL_MED_CREEK"]}"#.to_string(),
                r#"{"lotplan":"1RP12345","plan":"RP12345","has_flood_info":false}"#.to_string(),
            ],
            &[r#"{"plan":"SP279272","overall_risk":"Medium","has_flood_info":true}"#.to_string()],
        )
    }

    fn provider(geo: GeocodingResult, zones: Vec<FloodZone>) -> HybridFloodDataProvider {
        provider_with_overlay(geo, zones, None)
    }

    fn provider_with_overlay(
        geo: GeocodingResult,
        zones: Vec<FloodZone>,
        overlay: Option<FloodRisk>,
    ) -> HybridFloodDataProvider {
        HybridFloodDataProvider::new(
            Arc::new(StubGeocoder(geo)),
            Arc::new(metrics()),
            Arc::new(OverlayIndex {
                zones: ZoneIndex::new(zones),
                overlay,
            }),
        )
    }

    async fn run(provider: &HybridFloodDataProvider, address: &str) -> FloodLookupResult {
        provider
            .lookup(address, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_address() {
        let p = provider(geocoded(None, None), vec![]);
        let result = run(&p, "   ").await;

        assert_eq!(result.risk, FloodRisk::Unknown);
        assert_eq!(result.source, FloodDataSource::Unknown);
        assert_eq!(result.reasons, vec!["Address was empty or whitespace."]);
    }

    #[tokio::test]
    async fn test_geocoding_failure() {
        let p = provider(GeocodingResult::not_found(ADDRESS, "Stub"), vec![]);
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::Unknown);
        assert_eq!(result.scope, FloodDataScope::Unknown);
        assert_eq!(result.reasons, vec!["Geocoding failed: NotFound"]);
    }

    #[tokio::test]
    async fn test_tier1_parcel_hit() {
        let p = provider(
            geocoded(Some(point(-27.46, 153.02)), Some("3GTP102995")),
            vec![square_zone("z", FloodRisk::Low)],
        );
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::High);
        assert_eq!(result.proximity, FloodZoneProximity::Inside);
        assert_eq!(result.source, FloodDataSource::BccParcelMetrics);
        assert_eq!(result.scope, FloodDataScope::Parcel);
        assert!(result.has_any_extent_intersection);
        assert_eq!(
            result.reasons,
            vec![
                "Risk derived from BCC parcel metrics (parcel: 3GTP102995).",
                "Source flags: FL_HIGH_RIVER, FL_MED_CREEK",
            ]
        );
    }

    #[tokio::test]
    async fn test_tier1_plan_fallback() {
        let p = provider(geocoded(None, Some("ASP279272")), vec![]);
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::Medium);
        assert_eq!(result.scope, FloodDataScope::PlanFallback);
        assert_eq!(
            result.reasons,
            vec!["Risk derived from BCC parcel metrics (plan-level fallback for SP279272)."]
        );
    }

    #[tokio::test]
    async fn test_tier1_confirmed_clear() {
        let p = provider(
            geocoded(Some(point(-27.46, 153.02)), Some("1RP12345")),
            vec![square_zone("z", FloodRisk::High)],
        );
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::None);
        assert_eq!(result.proximity, FloodZoneProximity::None);
        assert_eq!(result.source, FloodDataSource::BccParcelMetrics);
        assert!(!result.has_any_extent_intersection);
        assert_eq!(
            result.reasons,
            vec!["BCC parcel metrics indicate no flood risk for 1RP12345."]
        );
    }

    #[tokio::test]
    async fn test_tier3_fallthrough_inside() {
        let p = provider(
            geocoded(Some(point(-27.46, 153.02)), Some("9SP999999")),
            vec![square_zone("medium", FloodRisk::Medium)],
        );
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.source, FloodDataSource::PointBuffer);
        assert_eq!(result.risk, FloodRisk::Medium);
        assert_eq!(result.proximity, FloodZoneProximity::Inside);
        assert_eq!(result.distance_metres, None);
        assert!(result.has_any_extent_intersection);
        assert_eq!(
            result.reasons,
            vec!["Location falls inside Medium likelihood flood zone (point buffer)."]
        );
    }

    #[tokio::test]
    async fn test_tier3_near() {
        let near = point(-27.46, 153.05 + 20.0 / metres_per_degree());
        let p = provider(geocoded(Some(near), None), vec![square_zone("z", FloodRisk::High)]);
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::High);
        assert_eq!(result.proximity, FloodZoneProximity::Near);
        assert!(!result.has_any_extent_intersection);
        let distance = result.distance_metres.unwrap();
        assert!((distance - 20.0).abs() < 0.5);
        assert_eq!(
            result.reasons,
            vec![format!(
                "Location is {:.1}m from High likelihood flood zone (point buffer).",
                distance
            )]
        );
    }

    #[tokio::test]
    async fn test_tier3_nothing_within_buffer() {
        let far = point(-27.46, 153.05 + 100.0 / metres_per_degree());
        let p = provider(geocoded(Some(far), None), vec![square_zone("z", FloodRisk::High)]);
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::None);
        assert_eq!(result.source, FloodDataSource::PointBuffer);
        assert_eq!(
            result.reasons,
            vec!["No flood zone found within buffer distance (point buffer)."]
        );

        // Un tampon plus large atteint la zone
        let wide = provider(geocoded(Some(far), None), vec![square_zone("z", FloodRisk::High)])
            .with_buffer_metres(200.0);
        assert_eq!(run(&wide, ADDRESS).await.proximity, FloodZoneProximity::Near);
    }

    #[tokio::test]
    async fn test_tier3_unclassified_extent() {
        let p = provider(
            geocoded(Some(point(-27.46, 153.02)), None),
            vec![square_zone("extent", FloodRisk::Unknown)],
        );
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::Unknown);
        assert_eq!(result.source, FloodDataSource::PointBuffer);
        assert!(result.has_any_extent_intersection);
        assert_eq!(result.reasons.len(), 1);
        assert!(result.reasons[0].contains("unclassified flood extent"));
    }

    #[tokio::test]
    async fn test_tier3_unclassified_extent_with_overlay() {
        let p = provider_with_overlay(
            geocoded(Some(point(-27.46, 153.02)), None),
            vec![square_zone("extent", FloodRisk::Unknown)],
            Some(FloodRisk::Low),
        );
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::Unknown);
        assert_eq!(
            result.reasons[1],
            "Flood-risk overlay classifies this location as Low."
        );
    }

    #[tokio::test]
    async fn test_no_lotplan_no_location() {
        let p = provider(geocoded(None, None), vec![]);
        let result = run(&p, ADDRESS).await;

        assert_eq!(result.risk, FloodRisk::Unknown);
        assert_eq!(
            result.reasons,
            vec!["Could not determine flood risk: no lotplan or location available."]
        );
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let p = provider(geocoded(Some(point(-27.46, 153.02)), None), vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(p.lookup(ADDRESS, &cancel).await, Err(LookupCancelled));
    }

    #[tokio::test]
    async fn test_cancelled_during_geocoding() {
        let dataset = FloodDataset::open(&FloodDataOptions {
            data_root: "/nonexistent/flood".into(),
            ..FloodDataOptions::default()
        });
        let p = HybridFloodDataProvider::new(
            Arc::new(PendingGeocoder),
            dataset.metrics.clone(),
            dataset.zones.clone(),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), p.lookup(ADDRESS, &cancel))
            .await
            .expect("geocoding was not interrupted");
        assert_eq!(outcome, Err(LookupCancelled));

        // Les niveaux suivants n'ont pas été atteints
        assert!(!dataset.metrics.is_loaded());
        assert!(!dataset.zones.is_extents_loaded());
        assert!(!dataset.zones.is_risk_overlay_loaded());
    }

    #[tokio::test]
    async fn test_idempotent() {
        let p = provider(
            geocoded(Some(point(-27.46, 153.02)), Some("9SP999999")),
            vec![square_zone("medium", FloodRisk::Medium)],
        );
        assert_eq!(run(&p, ADDRESS).await, run(&p, ADDRESS).await);
    }
}
