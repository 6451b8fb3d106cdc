use mapsync::{
    prelude::*,
    renderer::headless::{HeadlessRenderer, RendererCall},
};

/// Overlay reconciliation against a headless renderer
#[cfg(test)]
mod overlay_sync {
    use super::*;

    fn ready_services() -> (MapServices<HeadlessFactory>, RendererHandle) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut services = MapServices::new(HeadlessFactory::new().with_style_sources(&["composite"]));
        let handle = services
            .lifecycle
            .create("map", StyleRef::demo(), ViewState::default())
            .unwrap();
        services.lifecycle.notify(handle, RendererEvent::Load).unwrap();
        services.process_events();
        (services, handle)
    }

    fn renderer(services: &MapServices<HeadlessFactory>, handle: RendererHandle) -> &HeadlessRenderer {
        services.lifecycle.renderer(handle).unwrap()
    }

    fn point_unit(id: &str, lat: f64, lng: f64) -> OverlayUnit {
        OverlayUnit::new(id, GeoJson::feature(GeoJsonGeometry::point(LatLng::new(lat, lng))))
            .with_layer(LayerSpec::new(format!("{}-layer", id), LayerKind::Circle))
    }

    #[test]
    fn test_repeated_upsert_swaps_data() {
        let (mut services, handle) = ready_services();

        assert_eq!(
            services.upsert(handle, &point_unit("pin", 35.0, 139.0)).unwrap(),
            UpsertOutcome::Created
        );
        let mut last = None;
        for step in 1..=3 {
            let unit = point_unit("pin", 35.0 + step as f64 * 0.01, 139.0);
            assert_eq!(services.upsert(handle, &unit).unwrap(), UpsertOutcome::Updated);
            last = Some(unit);
        }

        let renderer = renderer(&services, handle);
        assert_eq!(renderer.count_calls(|call| matches!(call, RendererCall::AddSource(_))), 1);
        assert_eq!(renderer.count_calls(|call| matches!(call, RendererCall::AddLayer { .. })), 1);
        assert_eq!(
            renderer.count_calls(|call| matches!(call, RendererCall::SetSourceData(_))),
            3
        );
        assert_eq!(renderer.layer_ids(), vec!["pin-layer"]);
        assert_eq!(renderer.source_data("pin"), last.as_ref().and_then(OverlayUnit::data));
    }

    #[test]
    fn test_geometry_change_rebuilds_in_place() {
        let (mut services, handle) = ready_services();
        services.upsert(handle, &point_unit("below", 35.0, 139.0)).unwrap();
        services.upsert(handle, &point_unit("above", 35.1, 139.1)).unwrap();

        let ring = presets::accuracy_ring(LatLng::new(35.0, 139.0), 50.0, 16);
        let polygon = OverlayUnit::new("below", GeoJson::feature(GeoJsonGeometry::polygon(&ring)))
            .with_layer(LayerSpec::new("below-layer", LayerKind::Circle));
        assert_eq!(services.upsert(handle, &polygon).unwrap(), UpsertOutcome::Rebuilt);

        let renderer = renderer(&services, handle);
        assert_eq!(renderer.layer_ids(), vec!["below-layer", "above-layer"]);
        assert_eq!(renderer.source_count(), 3);
    }

    #[test]
    fn test_remove_leaves_no_orphans() {
        let (mut services, handle) = ready_services();
        services
            .upsert(
                handle,
                &presets::accuracy_circle(
                    LatLng::new(35.0, 139.0),
                    20.0,
                    &AccuracyCircleConfig::default(),
                ),
            )
            .unwrap();

        assert!(services.remove_overlay(handle, presets::ACCURACY_CIRCLE_ID).unwrap());
        assert!(!services.remove_overlay(handle, presets::ACCURACY_CIRCLE_ID).unwrap());
        assert!(!services.remove_overlay(handle, "never-added").unwrap());

        let renderer = renderer(&services, handle);
        assert!(renderer.layer_ids().is_empty());
        // Only the style-defined source remains
        assert_eq!(renderer.source_count(), 1);
        assert!(renderer.source("composite").is_some());
    }

    #[test]
    fn test_restyle_recreates_overlays() {
        let (mut services, handle) = ready_services();
        services.upsert(handle, &point_unit("pin", 35.0, 139.0)).unwrap();

        services
            .lifecycle
            .set_style(handle, StyleRef::new("https://example.com/dark.json"))
            .unwrap();
        assert!(matches!(
            services.upsert(handle, &point_unit("pin", 35.0, 139.0)),
            Err(MapError::RendererNotReady(_))
        ));

        services.lifecycle.notify(handle, RendererEvent::StyleLoad).unwrap();
        let events = services.process_events();
        assert!(matches!(events.as_slice(), [LifecycleEvent::Restyled { .. }]));
        assert!(!services.overlays.contains(&services.lifecycle, handle, "pin"));

        assert_eq!(
            services.upsert(handle, &point_unit("pin", 35.0, 139.0)).unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(renderer(&services, handle).layer_ids(), vec!["pin-layer"]);
    }

    #[test]
    fn test_foreign_ids_conflict() {
        let (mut services, handle) = ready_services();

        let clash = OverlayUnit::new("composite", GeoJson::collection(Vec::new()))
            .with_layer(LayerSpec::new("composite-layer", LayerKind::Fill));
        assert!(matches!(
            services.upsert(handle, &clash),
            Err(MapError::SourceConflict(_))
        ));

        let missing = OverlayUnit::on_style_source("labels", "no-such-source")
            .with_layer(LayerSpec::new("labels", LayerKind::Symbol));
        assert!(matches!(
            services.upsert(handle, &missing),
            Err(MapError::SourceConflict(_))
        ));

        let renderer = renderer(&services, handle);
        assert!(renderer.layer_ids().is_empty());
        assert_eq!(renderer.count_calls(|call| matches!(call, RendererCall::AddLayer { .. })), 0);
    }

    #[test]
    fn test_writes_to_destroyed_handle_fail() {
        let (mut services, handle) = ready_services();
        services.upsert(handle, &point_unit("pin", 35.0, 139.0)).unwrap();

        services.lifecycle.destroy(handle).unwrap();
        services.process_events();

        assert!(matches!(
            services.upsert(handle, &point_unit("pin", 35.0, 139.0)),
            Err(MapError::HandleDestroyed(_))
        ));
        assert!(matches!(
            services.remove_overlay(handle, "pin"),
            Err(MapError::HandleDestroyed(_))
        ));
        assert_eq!(services.lifecycle.factory().live_count(), 0);
    }

    #[test]
    fn test_visibility_of_style_layers() {
        let (mut services, handle) = ready_services();
        services.upsert(handle, &presets::buildings_3d()).unwrap();

        services
            .set_layer_visibility(handle, presets::BUILDINGS_3D_ID, false)
            .unwrap();
        assert_eq!(
            services
                .overlays
                .layer_visibility(&services.lifecycle, handle, presets::BUILDINGS_3D_ID)
                .unwrap(),
            Some(false)
        );
        assert_eq!(
            services
                .overlays
                .layer_visibility(&services.lifecycle, handle, "missing")
                .unwrap(),
            None
        );
        assert!(services.set_layer_visibility(handle, "missing", true).is_err());
    }
}
