//! Ready-made overlay units for the demo screens

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    core::{config::AccuracyCircleConfig, geo::LatLng},
    data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
    layers::base::{LayerKind, LayerSpec},
    overlay::unit::OverlayUnit,
    routing::Waypoint,
};

pub const ACCURACY_CIRCLE_ID: &str = "accuracy-circle";
pub const POSITION_ID: &str = "geolocation-position";
pub const TRACK_LINE_ID: &str = "tracking-line";
pub const ROUTE_ID: &str = "route-source";
pub const WAYPOINTS_ID: &str = "waypoints-source";
pub const MARKERS_ID: &str = "markers";
pub const BUILDINGS_3D_ID: &str = "3d-buildings";

const POSITION_COLOR: &str = "#3F51B5";

/// A labelled point drawn by the [`markers`] unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: String,
    pub position: LatLng,
    pub label: String,
    pub color: String,
}

/// Ring of `segments` points approximating a circle of `radius_m`
/// metres around `center`
pub fn accuracy_ring(center: LatLng, radius_m: f64, segments: usize) -> Vec<LatLng> {
    (0..segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            center.offset_meters(radius_m * angle.cos(), radius_m * angle.sin())
        })
        .collect()
}

/// Filled polygon with an outline, sized in metres so it scales with zoom
pub fn accuracy_circle(
    center: LatLng,
    radius_m: f64,
    config: &AccuracyCircleConfig,
) -> OverlayUnit {
    let ring = accuracy_ring(center, radius_m, config.segments);
    let data = GeoJson::Feature(
        GeoJsonFeature::new(GeoJsonGeometry::polygon(&ring)).with_property("accuracy", radius_m),
    );

    OverlayUnit::new(ACCURACY_CIRCLE_ID, data)
        .with_layer(
            LayerSpec::new("accuracy-circle-fill", LayerKind::Fill)
                .paint("fill-color", config.fill_color.as_str()),
        )
        .with_layer(
            LayerSpec::new("accuracy-circle-stroke", LayerKind::Line)
                .paint("line-color", config.stroke_color.as_str())
                .paint("line-width", config.stroke_width),
        )
}

pub fn position_marker(center: LatLng) -> OverlayUnit {
    OverlayUnit::new(
        POSITION_ID,
        GeoJson::feature(GeoJsonGeometry::point(center)),
    )
    .with_layer(
        LayerSpec::new("geolocation-position-dot", LayerKind::Circle)
            .paint("circle-radius", 8)
            .paint("circle-color", POSITION_COLOR)
            .paint("circle-stroke-width", 2)
            .paint("circle-stroke-color", "#ffffff"),
    )
}

pub fn track_line(points: &[LatLng]) -> OverlayUnit {
    OverlayUnit::new(
        TRACK_LINE_ID,
        GeoJson::feature(GeoJsonGeometry::line_string(points)),
    )
    .with_layer(
        LayerSpec::new(TRACK_LINE_ID, LayerKind::Line)
            .layout("line-join", "round")
            .layout("line-cap", "round")
            .paint("line-color", POSITION_COLOR)
            .paint("line-width", 4)
            .paint("line-opacity", 0.8),
    )
}

/// Route polyline from `[lon, lat]` positions
pub fn route_line(path: &[[f64; 2]]) -> OverlayUnit {
    let points: Vec<LatLng> = path.iter().copied().map(LatLng::from_lng_lat).collect();
    OverlayUnit::new(
        ROUTE_ID,
        GeoJson::feature(GeoJsonGeometry::line_string(&points)),
    )
    .with_layer(
        LayerSpec::new("route-layer", LayerKind::Line)
            .layout("line-join", "round")
            .layout("line-cap", "round")
            .paint("line-color", "#0066ff")
            .paint("line-width", 6)
            .paint("line-opacity", 0.8),
    )
}

/// Start (green) and end (red) points of a route
pub fn waypoints(start: &Waypoint, end: &Waypoint) -> OverlayUnit {
    let endpoint = |waypoint: &Waypoint, point_type: &str| {
        GeoJsonFeature::new(GeoJsonGeometry::point(waypoint.position))
            .with_property("point_type", point_type)
            .with_property("name", waypoint.name.as_str())
    };
    let data = GeoJson::collection(vec![endpoint(start, "start"), endpoint(end, "end")]);

    OverlayUnit::new(WAYPOINTS_ID, data).with_layer(
        LayerSpec::new("waypoints-layer", LayerKind::Circle)
            .paint("circle-radius", 8)
            .paint(
                "circle-color",
                json!(["match", ["get", "point_type"], "start", "#00ff00", "end", "#ff0000", "#000000"]),
            )
            .paint("circle-stroke-width", 2)
            .paint("circle-stroke-color", "#ffffff"),
    )
}

/// One coloured dot per marker with its label above it
pub fn markers(markers: &[MapMarker]) -> OverlayUnit {
    let features = markers
        .iter()
        .map(|marker| {
            let mut feature = GeoJsonFeature::new(GeoJsonGeometry::point(marker.position))
                .with_property("label", marker.label.as_str())
                .with_property("color", marker.color.as_str());
            feature.id = Some(json!(marker.id));
            feature
        })
        .collect();

    OverlayUnit::new(MARKERS_ID, GeoJson::collection(features))
        .with_layer(
            LayerSpec::new("markers-circle", LayerKind::Circle)
                .paint("circle-radius", 7)
                .paint("circle-color", json!(["get", "color"]))
                .paint("circle-stroke-width", 2)
                .paint("circle-stroke-color", "#ffffff"),
        )
        .with_layer(
            LayerSpec::new("markers-label", LayerKind::Symbol)
                .layout("text-field", json!(["get", "label"]))
                .layout("text-offset", json!([0, -1.5]))
                .layout("text-anchor", "bottom"),
        )
}

/// Building extrusions drawn from the style's `composite` vector source
pub fn buildings_3d() -> OverlayUnit {
    OverlayUnit::on_style_source(BUILDINGS_3D_ID, "composite").with_layer(
        LayerSpec::new(BUILDINGS_3D_ID, LayerKind::FillExtrusion)
            .source_layer("building")
            .filter(json!(["==", "extrude", "true"]))
            .min_zoom(13.0)
            .paint("fill-extrusion-color", "#aaa")
            .paint(
                "fill-extrusion-height",
                json!(["interpolate", ["linear"], ["zoom"], 15, 0, 16, ["get", "height"]]),
            )
            .paint(
                "fill-extrusion-base",
                json!(["interpolate", ["linear"], ["zoom"], 15, 0, 16, ["get", "min_height"]]),
            )
            .paint("fill-extrusion-opacity", 0.6),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::GeometryKind;

    #[test]
    fn test_accuracy_ring_radius() {
        let center = LatLng::new(35.6812, 139.7634);
        let ring = accuracy_ring(center, 100.0, 64);

        assert_eq!(ring.len(), 64);
        // North-most point sits 100 m up
        let north = ring[16];
        assert!(((north.lat - center.lat) * 111_111.0 - 100.0).abs() < 1e-6);
        assert!((north.lng - center.lng).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_circle_is_polygon() {
        let unit = accuracy_circle(
            LatLng::new(35.0, 139.0),
            15.0,
            &AccuracyCircleConfig::default(),
        );
        assert_eq!(
            unit.data().map(|d| d.geometry_kinds()),
            Some(vec![GeometryKind::Polygon])
        );
        assert_eq!(
            unit.layer_ids().collect::<Vec<_>>(),
            vec!["accuracy-circle-fill", "accuracy-circle-stroke"]
        );
    }

    #[test]
    fn test_waypoint_properties() {
        let unit = waypoints(
            &Waypoint::new("Tokyo Station", 139.7671, 35.6812),
            &Waypoint::new("Shinjuku Station", 139.7016, 35.6905),
        );
        let types: Vec<_> = unit
            .data()
            .map(|d| {
                d.features()
                    .iter()
                    .map(|f| f.properties["point_type"].clone())
                    .collect()
            })
            .unwrap_or_default();

        assert_eq!(types, vec![json!("start"), json!("end")]);
    }

    #[test]
    fn test_buildings_use_style_source() {
        let unit = buildings_3d();
        assert_eq!(unit.source_id(), "composite");
        assert_eq!(unit.layers[0].min_zoom, Some(13.0));
    }
}
