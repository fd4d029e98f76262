//! Tests d'intégration sur un jeu NDJSON complet écrit en répertoire temporaire

use std::path::PathBuf;

use floodzone::{
    FloodDataOptions, FloodDataset, FloodRisk, FloodZoneIndex, FloodZoneProximity, GeoPoint,
    MetricsScope, ParcelMetricsLookup,
};

/// Carré 153.10..153.12 / -27.40..-27.38, WKB little-endian en base64
const MEDIUM_SQUARE_WKB_BASE64: &str = "AQMAAAABAAAABQAAADMzMzMzI2NAZmZmZmZmO8CkcD0K1yNjQGZmZmZmZjvApHA9CtcjY0DhehSuR2E7wDMzMzMzI2NA4XoUrkdhO8AzMzMzMyNjQGZmZmZmZjvA";

/// Carré 153.01..153.02 / -27.47..-27.46
const OVERLAY_SQUARE_WKB_BASE64: &str = "AQMAAAABAAAABQAAALgehetRIGNAuB6F61F4O8BxPQrXoyBjQLgehetReDvAcT0K16MgY0D2KFyPwnU7wLgehetRIGNA9ihcj8J1O8C4HoXrUSBjQLgehetReDvA";

/// Carré lon/lat au format GeoJSON
fn square(west: f64, south: f64, east: f64, north: f64) -> String {
    format!(
        r#"{{"type":"Polygon","coordinates":[[[{w},{s}],[{e},{s}],[{e},{n}],[{w},{n}],[{w},{s}]]]}}"#,
        w = west,
        s = south,
        e = east,
        n = north
    )
}

fn write_dataset(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("floodzone_it_{}", name));
    let bcc = root.join("bcc");
    std::fs::create_dir_all(&bcc).unwrap();

    let extents = [
        format!(
            r#"{{"id":"ext-unclassified","risk":"Unknown","geometry":{}}}"#,
            square(153.00, -27.48, 153.05, -27.45)
        ),
        // Format de l'outil de préparation : WKB en base64
        format!(
            r#"{{"id":"ext-medium","risk":"Medium","polygonWkbBase64":"{}"}}"#,
            MEDIUM_SQUARE_WKB_BASE64
        ),
        "this line is not json".to_string(),
    ];
    std::fs::write(bcc.join("flood-awareness-extents.ndjson"), extents.join("\n")).unwrap();

    let overlay = [format!(
        r#"{{"id":"risk-high","risk":"High","polygonWkbBase64":"{}"}}"#,
        OVERLAY_SQUARE_WKB_BASE64
    )];
    std::fs::write(bcc.join("flood-awareness-overall.ndjson"), overlay.join("\n")).unwrap();

    let parcels = [
        r#"{"lotplan":"1RP12345","plan":"RP12345","overall_risk":"High","river_risk":"High","has_flood_info":true,"evidence_metrics":["FL_HIGH_RIVER","OLF_FLAG"],"has_overland_flow":true}"#,
        r#"{"lotplan":"2RP12345","plan":"RP12345","has_flood_info":false}"#,
        r#"{"lotplan":"#,
    ];
    std::fs::write(
        bcc.join("bcc-parcel-metrics-parcel.ndjson"),
        parcels.join("\n"),
    )
    .unwrap();

    let plans = [
        r#"{"plan":"GTP102995","overall_risk":"Medium","creek_risk":"Medium","has_flood_info":true}"#,
    ];
    std::fs::write(bcc.join("bcc-parcel-metrics-plan.ndjson"), plans.join("\n")).unwrap();

    root
}

fn options(root: &PathBuf) -> FloodDataOptions {
    FloodDataOptions {
        data_root: root.clone(),
        ..FloodDataOptions::default()
    }
}

#[test]
fn test_zone_queries_from_files() {
    let root = write_dataset("zones");
    let dataset = FloodDataset::open(&options(&root));

    let inside = GeoPoint::new(-27.465, 153.015).unwrap();
    let zone = dataset.zones.find_zone_for_point(inside).unwrap();
    assert_eq!(zone.id, "ext-unclassified");
    assert_eq!(zone.risk, FloodRisk::Unknown);

    assert_eq!(
        dataset.zones.find_risk_overlay_for_point(inside),
        Some(FloodRisk::High)
    );

    let near_medium = GeoPoint::new(-27.39, 153.1203).unwrap();
    let hit = dataset.zones.find_nearest_zone(near_medium, 100.0).unwrap();
    assert_eq!(hit.zone.id, "ext-medium");
    assert_eq!(hit.proximity, FloodZoneProximity::Near);
    assert!(hit.distance_metres > 0.0 && hit.distance_metres < 100.0);

    // La ligne illisible n'empêche pas le chargement des autres
    assert_eq!(dataset.zones.extents().len(), 2);

    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_metrics_queries_from_files() {
    let root = write_dataset("metrics");
    let dataset = FloodDataset::open(&options(&root));

    let parcel = dataset.metrics.lookup("1rp12345").unwrap();
    assert_eq!(parcel.scope, MetricsScope::Parcel);
    assert_eq!(parcel.overall_risk, FloodRisk::High);
    assert_eq!(parcel.overland_flow_risk, FloodRisk::Unknown);
    assert_eq!(parcel.evidence_metrics, vec!["FL_HIGH_RIVER", "OLF_FLAG"]);

    let clear = dataset.metrics.lookup("2RP12345").unwrap();
    assert!(!clear.has_flood_info);

    // Plan absent du fichier plan : agrégé depuis les lots
    let aggregated = dataset.metrics.lookup("9RP12345").unwrap();
    assert_eq!(aggregated.scope, MetricsScope::PlanFallback);
    assert_eq!(aggregated.key, "9RP12345");
    assert_eq!(aggregated.overall_risk, FloodRisk::High);
    assert!(aggregated.has_flood_info);

    let fallback = dataset.metrics.lookup("3GTP102995").unwrap();
    assert_eq!(fallback.scope, MetricsScope::PlanFallback);
    assert_eq!(fallback.overall_risk, FloodRisk::Medium);

    assert!(dataset.metrics.lookup("GTP102995").is_none());
    assert!(dataset.metrics.lookup("1SP999").is_none());

    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_missing_data_root_degrades_gracefully() {
    let dataset = FloodDataset::open(&options(&PathBuf::from("/nonexistent/floodzone")));
    let point = GeoPoint::new(-27.4705, 153.0260).unwrap();

    assert!(dataset.zones.find_zone_for_point(point).is_none());
    assert!(dataset.zones.find_nearest_zone(point, 500.0).is_none());
    assert!(dataset.zones.find_risk_overlay_for_point(point).is_none());
    assert!(dataset.metrics.lookup("1RP12345").is_none());
}
