//! Chargement des zones inondables depuis NDJSON
//!
//! Une ligne par zone :
//!
//! ```json
//! {"id":"ext-1","risk":"High","polygonWkbBase64":"AQMAAAAB..."}
//! {"id":"ext-2","risk":"Unknown","geometry":{"type":"Polygon","coordinates":[...]}}
//! {"id":"ext-3","risk":"Low","polygon_wkb_hex":"0103000000..."}
//! ```
//!
//! `polygonWkbBase64` est le format produit par l'outil de préparation des
//! données BCC ; GeoJSON et WKB hex restent acceptés. Les coordonnées sont en WGS84, ordre lon/lat. Les lignes illisibles sont
//! ignorées avec un warning, elles n'interrompent jamais le chargement.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geo::{Geometry, MultiPolygon};
use geozero::wkb::Wkb;
use geozero::ToGeo;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::ndjson;
use crate::options::FloodDataOptions;
use crate::types::{FloodRisk, FloodZone};
use crate::FloodError;

/// Source des deux collections de zones (emprises brutes et overlay classifié)
pub trait ZoneDataSource: Send + Sync {
    /// Emprises inondables brutes
    fn load_zones(&self) -> Result<Vec<FloodZone>, FloodError>;

    /// Zones de risque classifiées (Low/Medium/High), plus petites que les emprises
    fn load_risk_zones(&self) -> Result<Vec<FloodZone>, FloodError>;
}

/// Chargeur de zones basé sur les fichiers NDJSON de `FloodDataOptions`
#[derive(Debug, Clone)]
pub struct NdjsonZoneLoader {
    extents_path: PathBuf,
    risk_path: PathBuf,
}

impl NdjsonZoneLoader {
    pub fn new(options: &FloodDataOptions) -> Self {
        Self {
            extents_path: options.extents_path(),
            risk_path: options.overall_risk_path(),
        }
    }
}

impl ZoneDataSource for NdjsonZoneLoader {
    fn load_zones(&self) -> Result<Vec<FloodZone>, FloodError> {
        load_zones_from_file(&self.extents_path)
    }

    fn load_risk_zones(&self) -> Result<Vec<FloodZone>, FloodError> {
        load_zones_from_file(&self.risk_path)
    }
}

#[derive(Debug, Deserialize)]
struct FloodZoneRecord {
    #[serde(alias = "Id")]
    id: String,

    #[serde(default, alias = "Risk")]
    risk: Option<String>,

    /// WKB en base64, format de l'outil de préparation
    #[serde(
        default,
        rename = "polygonWkbBase64",
        alias = "polygon_wkb_base64",
        alias = "PolygonWkbBase64"
    )]
    polygon_wkb_base64: Option<String>,

    #[serde(default, alias = "Geometry")]
    geometry: Option<geojson::Geometry>,

    #[serde(default, alias = "polygonWkbHex", alias = "PolygonWkbHex")]
    polygon_wkb_hex: Option<String>,
}

/// Charge un fichier de zones ; fichier absent → collection vide
pub fn load_zones_from_file(path: &Path) -> Result<Vec<FloodZone>, FloodError> {
    let lines = ndjson::read_lines(path)?;
    let zones = parse_zone_lines(&lines);

    info!(
        path = %path.display(),
        lines = lines.len(),
        zones = zones.len(),
        skipped = lines.len() - zones.len(),
        "Loaded flood zones"
    );

    Ok(zones)
}

/// Décode les lignes en parallèle, en conservant l'ordre du fichier
pub fn parse_zone_lines(lines: &[String]) -> Vec<FloodZone> {
    lines
        .par_iter()
        .enumerate()
        .filter_map(|(idx, line)| match parse_zone_line(line) {
            Ok(zone) => Some(zone),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping malformed flood zone record");
                None
            }
        })
        .collect()
}

/// Décode une ligne NDJSON en zone
pub fn parse_zone_line(line: &str) -> Result<FloodZone, FloodError> {
    let record: FloodZoneRecord = serde_json::from_str(line)?;

    let id = record.id.as_str();
    let geometry = match (
        record.polygon_wkb_base64,
        record.geometry,
        record.polygon_wkb_hex,
    ) {
        (Some(b64), _, _) => {
            let bytes = BASE64
                .decode(b64.trim())
                .map_err(|e| FloodError::invalid_geometry(id, e.to_string()))?;
            decode_wkb(id, bytes)?
        }
        (None, Some(geojson), _) => Geometry::<f64>::try_from(geojson)
            .map_err(|e| FloodError::invalid_geometry(id, e.to_string()))?,
        (None, None, Some(hex_wkb)) => {
            let bytes = hex::decode(hex_wkb.trim())
                .map_err(|e| FloodError::invalid_geometry(id, e.to_string()))?;
            decode_wkb(id, bytes)?
        }
        (None, None, None) => {
            return Err(FloodError::invalid_geometry(id, "missing geometry"));
        }
    };

    let geometry = into_multi_polygon(geometry)
        .ok_or_else(|| FloodError::invalid_geometry(&record.id, "not a polygon"))?;

    let risk = record
        .risk
        .as_deref()
        .map(FloodRisk::parse_lenient)
        .unwrap_or_default();

    Ok(FloodZone {
        id: record.id,
        risk,
        geometry,
    })
}

fn decode_wkb(id: &str, bytes: Vec<u8>) -> Result<Geometry<f64>, FloodError> {
    Wkb(bytes)
        .to_geo()
        .map_err(|e| FloodError::invalid_geometry(id, e.to_string()))
}

/// Ne garde que les surfaces ; `None` si la géométrie n'en contient aucune
fn into_multi_polygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    let polygons = match geometry {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(mp) => mp.0,
        Geometry::GeometryCollection(gc) => gc
            .0
            .into_iter()
            .filter_map(into_multi_polygon)
            .flat_map(|mp| mp.0)
            .collect(),
        _ => Vec::new(),
    };

    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}
