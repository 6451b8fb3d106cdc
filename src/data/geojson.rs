use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

/// Discriminant of a geometry, used to detect data shape changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeoJsonGeometry {
    pub fn point(position: LatLng) -> Self {
        GeoJsonGeometry::Point {
            coordinates: position.to_lng_lat(),
        }
    }

    pub fn line_string(positions: &[LatLng]) -> Self {
        GeoJsonGeometry::LineString {
            coordinates: positions.iter().map(LatLng::to_lng_lat).collect(),
        }
    }

    /// Single-ring polygon; the ring is closed if the caller did not close it
    pub fn polygon(ring: &[LatLng]) -> Self {
        let mut coordinates: Vec<[f64; 2]> = ring.iter().map(LatLng::to_lng_lat).collect();
        if let (Some(first), Some(last)) = (coordinates.first().copied(), coordinates.last()) {
            if first != *last {
                coordinates.push(first);
            }
        }
        GeoJsonGeometry::Polygon {
            coordinates: vec![coordinates],
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            GeoJsonGeometry::Point { .. } => GeometryKind::Point,
            GeoJsonGeometry::LineString { .. } => GeometryKind::LineString,
            GeoJsonGeometry::Polygon { .. } => GeometryKind::Polygon,
            GeoJsonGeometry::MultiPoint { .. } => GeometryKind::MultiPoint,
            GeoJsonGeometry::MultiLineString { .. } => GeometryKind::MultiLineString,
            GeoJsonGeometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }

    fn for_each_position<F: FnMut(&[f64; 2])>(&self, f: &mut F) {
        match self {
            GeoJsonGeometry::Point { coordinates } => f(coordinates),
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => coordinates.iter().for_each(f),
            GeoJsonGeometry::Polygon { coordinates }
            | GeoJsonGeometry::MultiLineString { coordinates } => {
                coordinates.iter().flatten().for_each(f)
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(f)
            }
        }
    }
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Root GeoJSON object accepted by renderer sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    pub fn feature(geometry: GeoJsonGeometry) -> Self {
        GeoJson::Feature(GeoJsonFeature::new(geometry))
    }

    pub fn collection(features: Vec<GeoJsonFeature>) -> Self {
        GeoJson::FeatureCollection { features }
    }

    /// Gets all features in the document
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features.iter().collect(),
        }
    }

    /// Sorted, de-duplicated geometry kinds present in the document.
    ///
    /// An empty result means the document carries no geometry and is
    /// compatible with any shape.
    pub fn geometry_kinds(&self) -> Vec<GeometryKind> {
        let mut kinds: Vec<GeometryKind> = self
            .features()
            .into_iter()
            .filter_map(|feature| feature.geometry.as_ref().map(GeoJsonGeometry::kind))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut bounds: Option<LatLngBounds> = None;
        for feature in self.features() {
            if let Some(geometry) = &feature.geometry {
                geometry.for_each_position(&mut |position: &[f64; 2]| {
                    let point = LatLng::from_lng_lat(*position);
                    bounds = Some(match bounds.take() {
                        Some(mut b) => {
                            b.extend(&point);
                            b
                        }
                        None => LatLngBounds::new(point, point),
                    });
                });
            }
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_geojson() {
        let data = GeoJson::feature(GeoJsonGeometry::point(LatLng::new(35.6812, 139.7634)));
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [139.7634, 35.6812] },
                "properties": {}
            })
        );
    }

    #[test]
    fn test_parses_collection() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "point_type": "start" },
                  "geometry": { "type": "Point", "coordinates": [139.7671, 35.6812] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "LineString", "coordinates": [[139.7, 35.6], [139.8, 35.7]] } }
            ]
        }"#;
        let data: GeoJson = serde_json::from_str(raw).unwrap();

        assert_eq!(data.features().len(), 2);
        assert_eq!(
            data.geometry_kinds(),
            vec![GeometryKind::Point, GeometryKind::LineString]
        );
        assert_eq!(data.features()[0].properties["point_type"], json!("start"));
    }

    #[test]
    fn test_polygon_ring_is_closed() {
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ];
        match GeoJsonGeometry::polygon(&ring) {
            GeoJsonGeometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].len(), 4);
                assert_eq!(coordinates[0][0], coordinates[0][3]);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_bounds_and_empty_kinds() {
        let line = GeoJson::feature(GeoJsonGeometry::line_string(&[
            LatLng::new(35.6812, 139.7671),
            LatLng::new(35.6905, 139.7016),
        ]));
        let bounds = line.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(35.6812, 139.7016));

        let empty = GeoJson::collection(Vec::new());
        assert!(empty.geometry_kinds().is_empty());
        assert!(empty.bounds().is_none());
    }
}
