//! Primitives géométriques (WGS84)
//!
//! Les distances sont calculées dans le plan lon/lat puis converties en mètres
//! avec un facteur fixe, calibré à la latitude de Brisbane. L'erreur reste
//! acceptable à l'échelle d'un tampon de quelques dizaines de mètres.

use std::fmt;

use geo::{Contains, Coord, EuclideanDistance, LineString, MultiPolygon, Point, Polygon};
use serde::Serialize;

use crate::FloodError;

/// Latitude de référence pour la conversion degrés → mètres (Brisbane CBD)
pub const REFERENCE_LATITUDE: f64 = -27.47;

/// Longueur d'un degré de méridien à l'équateur
const METRES_PER_DEGREE_EQUATOR: f64 = 111_320.0;

/// Un point WGS84 validé
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Centre de Brisbane (CBD)
    pub const BRISBANE_CBD: GeoPoint = GeoPoint {
        latitude: -27.4705,
        longitude: 153.0260,
    };

    /// Crée un point, en rejetant les coordonnées hors domaine
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FloodError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FloodError::invalid_argument(
                "latitude",
                format!("{} is not between -90 and 90", latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FloodError::invalid_argument(
                "longitude",
                format!("{} is not between -180 and 180", longitude),
            ));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Point `geo` en ordre (x = lon, y = lat)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Construit un polygone à partir de sommets (lat, lon), en fermant l'anneau si besoin
pub fn polygon_from_points(vertices: &[GeoPoint]) -> Result<Polygon<f64>, FloodError> {
    if vertices.len() < 3 {
        return Err(FloodError::invalid_argument(
            "vertices",
            "at least three vertices are required to create a polygon",
        ));
    }

    let mut coords: Vec<Coord> = vertices
        .iter()
        .map(|v| Coord {
            x: v.longitude,
            y: v.latitude,
        })
        .collect();

    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }

    Ok(Polygon::new(LineString::new(coords), Vec::new()))
}

/// Facteur de conversion degrés → mètres à la latitude de référence
pub fn metres_per_degree() -> f64 {
    METRES_PER_DEGREE_EQUATOR * REFERENCE_LATITUDE.to_radians().cos()
}

/// Le point est strictement à l'intérieur d'un des polygones
pub fn contains(geometry: &MultiPolygon<f64>, point: GeoPoint) -> bool {
    geometry.contains(&point.to_point())
}

/// Distance approximative en mètres entre le point et la géométrie (0 si contenu)
pub fn distance_metres(geometry: &MultiPolygon<f64>, point: GeoPoint) -> f64 {
    let p = point.to_point();
    let degrees = geometry
        .0
        .iter()
        .map(|polygon| p.euclidean_distance(polygon))
        .fold(f64::INFINITY, f64::min);

    degrees * metres_per_degree()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> MultiPolygon<f64> {
        let polygon = polygon_from_points(&[
            GeoPoint::new(-27.48, 153.00).unwrap(),
            GeoPoint::new(-27.48, 153.05).unwrap(),
            GeoPoint::new(-27.45, 153.05).unwrap(),
            GeoPoint::new(-27.45, 153.00).unwrap(),
        ])
        .unwrap();
        MultiPolygon::new(vec![polygon])
    }

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(-90.1, 0.0).is_err());
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.5).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_brisbane_cbd_is_valid() {
        let cbd = GeoPoint::BRISBANE_CBD;
        assert_eq!(GeoPoint::new(cbd.latitude(), cbd.longitude()).unwrap(), cbd);
    }

    #[test]
    fn test_geo_point_display() {
        let p = GeoPoint::new(-27.4705, 153.026).unwrap();
        assert_eq!(p.to_string(), "(-27.470500, 153.026000)");
    }

    #[test]
    fn test_polygon_is_closed() {
        let polygon = polygon_from_points(&[
            GeoPoint::new(0.0, 0.0).unwrap(),
            GeoPoint::new(0.0, 1.0).unwrap(),
            GeoPoint::new(1.0, 1.0).unwrap(),
        ])
        .unwrap();
        let ring = polygon.exterior();
        assert_eq!(ring.0.len(), 4);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let result = polygon_from_points(&[
            GeoPoint::new(0.0, 0.0).unwrap(),
            GeoPoint::new(0.0, 1.0).unwrap(),
        ]);
        assert!(matches!(result, Err(FloodError::InvalidArgument { .. })));
    }

    #[test]
    fn test_contains() {
        let zone = square();
        assert!(contains(&zone, GeoPoint::new(-27.46, 153.02).unwrap()));
        assert!(!contains(&zone, GeoPoint::new(-27.60, 153.20).unwrap()));
    }

    #[test]
    fn test_distance_metres() {
        let zone = square();
        let inside = GeoPoint::new(-27.46, 153.02).unwrap();
        assert_eq!(distance_metres(&zone, inside), 0.0);

        let offset = 50.0 / metres_per_degree();
        let outside = GeoPoint::new(-27.46, 153.05 + offset).unwrap();
        assert!((distance_metres(&zone, outside) - 50.0).abs() < 0.5);
    }
}
