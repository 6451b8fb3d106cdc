use serde_json::json;

use crate::{
    data::geojson::{GeoJson, GeometryKind},
    layers::base::LayerSpec,
    overlay::unit::OverlayUnit,
    prelude::{HashMap, HashSet},
    renderer::{Renderer, RendererFactory, RendererHandle, RendererLifecycleController},
    MapError, Result,
};

/// What an upsert did to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Source and layers were added
    Created,
    /// Only the source data was replaced
    Updated,
    /// Source and layers were removed and re-added in place
    Rebuilt,
}

#[derive(Debug, Clone)]
struct UnitRecord {
    source_id: String,
    owns_source: bool,
    kinds: Vec<GeometryKind>,
    layers: Vec<LayerSpec>,
}

impl UnitRecord {
    fn new(unit: &OverlayUnit, layers: Vec<LayerSpec>, kinds: Vec<GeometryKind>) -> Self {
        Self {
            source_id: unit.source_id().to_string(),
            owns_source: unit.owns_source(),
            kinds,
            layers,
        }
    }

    fn is_intact<R: Renderer>(&self, renderer: &R) -> bool {
        renderer.has_source(&self.source_id)
            && self.layers.iter().all(|layer| renderer.has_layer(&layer.id))
    }

    /// Whether `unit` can be applied with a data swap alone
    fn matches(&self, unit: &OverlayUnit, layers: &[LayerSpec], kinds: &[GeometryKind]) -> bool {
        self.source_id == unit.source_id()
            && self.owns_source == unit.owns_source()
            && self.layers == layers
            && (self.kinds.is_empty() || kinds.is_empty() || self.kinds == kinds)
    }

    fn owns_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }
}

#[derive(Debug, Default)]
struct HandleOverlays {
    /// Restyle count the records below were written against
    generation: u64,
    /// Unit ids bottom to top
    order: Vec<String>,
    units: HashMap<String, UnitRecord>,
}

impl HandleOverlays {
    fn sync_generation(&mut self, handle: RendererHandle, generation: u64) {
        if self.generation != generation {
            log::debug!(
                "{} restyled, dropping {} overlay records",
                handle,
                self.units.len()
            );
            self.order.clear();
            self.units.clear();
            self.generation = generation;
        }
    }

    /// First live layer of the nearest unit stacked above `id`
    fn anchor_above<R: Renderer>(&self, renderer: &R, id: &str) -> Option<String> {
        let position = self.order.iter().position(|unit_id| unit_id == id)?;
        self.order[position + 1..]
            .iter()
            .filter_map(|unit_id| self.units.get(unit_id))
            .flat_map(|record| record.layers.iter())
            .find(|layer| renderer.has_layer(&layer.id))
            .map(|layer| layer.id.clone())
    }
}

/// Sole writer of overlay sources and layers.
///
/// Keeps per-renderer bookkeeping of which units it added so that repeated
/// upserts replace data in place, removals never leave orphaned layers, and
/// a restyle (which wipes runtime sources) is detected and rebuilt from
/// scratch on the next upsert.
#[derive(Debug, Default)]
pub struct OverlayReconciler {
    handles: HashMap<RendererHandle, HandleOverlays>,
}

impl OverlayReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the unit, or brings an existing one up to date.
    ///
    /// Data changes are applied with a source data swap. The unit is rebuilt
    /// at its previous z-position only when its layers change or its
    /// geometry kind changes. Fails with [`MapError::SourceConflict`] when
    /// the ids collide with sources or layers this reconciler did not add;
    /// nothing is written in that case.
    pub fn upsert<F: RendererFactory>(
        &mut self,
        lifecycle: &mut RendererLifecycleController<F>,
        handle: RendererHandle,
        unit: &OverlayUnit,
    ) -> Result<UpsertOutcome> {
        let (renderer, generation) = match lifecycle.ready_renderer_mut(handle) {
            Ok(ready) => ready,
            Err(err) => return Err(self.release_on_destroyed(handle, err)),
        };

        let overlays = self.handles.entry(handle).or_default();
        overlays.sync_generation(handle, generation);

        let layers = unit.bound_layers();
        let kinds = unit
            .data()
            .map(GeoJson::geometry_kinds)
            .unwrap_or_default();

        let existing = overlays
            .units
            .get(&unit.id)
            .map(|record| (record.is_intact(&*renderer), record.matches(unit, &layers, &kinds)));

        match existing {
            Some((true, true)) => {
                if let Some(data) = unit.data() {
                    renderer.set_source_data(&unit.id, data)?;
                }
                if let Some(record) = overlays.units.get_mut(&unit.id) {
                    if !kinds.is_empty() {
                        record.kinds = kinds;
                    }
                }
                log::trace!("{} updated overlay '{}'", handle, unit.id);
                Ok(UpsertOutcome::Updated)
            }
            Some((intact, _)) => {
                let before = overlays.anchor_above(&*renderer, &unit.id);
                let Some(record) = overlays.units.remove(&unit.id) else {
                    return Err(MapError::SourceConflict(unit.id.clone()));
                };

                if let Err(err) = check_free(&*renderer, unit, &layers, Some(&record)) {
                    overlays.units.insert(unit.id.clone(), record);
                    return Err(err);
                }

                if !intact {
                    log::warn!(
                        "{} overlay '{}' was partially removed outside the reconciler",
                        handle,
                        unit.id
                    );
                }
                // Whatever survives a failed teardown stays owned by the record.
                if let Err(err) = teardown(renderer, &record) {
                    overlays.units.insert(unit.id.clone(), record);
                    return Err(err);
                }

                match add_unit(renderer, unit, &layers, before.as_deref()) {
                    Ok(()) => {
                        overlays
                            .units
                            .insert(unit.id.clone(), UnitRecord::new(unit, layers, kinds));
                        log::debug!("{} rebuilt overlay '{}'", handle, unit.id);
                        Ok(if intact {
                            UpsertOutcome::Rebuilt
                        } else {
                            UpsertOutcome::Created
                        })
                    }
                    // add_unit rolled back its own writes, so nothing of the unit is left.
                    Err(err) => {
                        overlays.order.retain(|id| id != &unit.id);
                        Err(err)
                    }
                }
            }
            None => {
                check_free(&*renderer, unit, &layers, None)?;
                add_unit(renderer, unit, &layers, None)?;
                overlays.order.push(unit.id.clone());
                overlays
                    .units
                    .insert(unit.id.clone(), UnitRecord::new(unit, layers, kinds));
                log::debug!("{} created overlay '{}'", handle, unit.id);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    /// Removes the unit's layers (top first) and then its source.
    ///
    /// Returns `false` when no such unit exists, including units a restyle
    /// already wiped.
    pub fn remove<F: RendererFactory>(
        &mut self,
        lifecycle: &mut RendererLifecycleController<F>,
        handle: RendererHandle,
        id: &str,
    ) -> Result<bool> {
        let (renderer, generation) = match lifecycle.ready_renderer_mut(handle) {
            Ok(ready) => ready,
            Err(err) => return Err(self.release_on_destroyed(handle, err)),
        };

        let Some(overlays) = self.handles.get_mut(&handle) else {
            return Ok(false);
        };
        overlays.sync_generation(handle, generation);

        let Some(record) = overlays.units.remove(id) else {
            log::debug!("{} has no overlay '{}' to remove", handle, id);
            return Ok(false);
        };
        overlays.order.retain(|unit_id| unit_id != id);

        teardown(renderer, &record)?;
        log::debug!("{} removed overlay '{}'", handle, id);
        Ok(true)
    }

    /// Shows or hides any layer, overlay or style-defined
    pub fn set_layer_visibility<F: RendererFactory>(
        &mut self,
        lifecycle: &mut RendererLifecycleController<F>,
        handle: RendererHandle,
        layer_id: &str,
        visible: bool,
    ) -> Result<()> {
        let (renderer, _) = match lifecycle.ready_renderer_mut(handle) {
            Ok(ready) => ready,
            Err(err) => return Err(self.release_on_destroyed(handle, err)),
        };
        let value = if visible { "visible" } else { "none" };
        renderer.set_layout_property(layer_id, "visibility", json!(value))
    }

    /// `None` when the layer does not exist
    pub fn layer_visibility<F: RendererFactory>(
        &self,
        lifecycle: &RendererLifecycleController<F>,
        handle: RendererHandle,
        layer_id: &str,
    ) -> Result<Option<bool>> {
        let renderer = lifecycle.renderer(handle)?;
        if !renderer.has_layer(layer_id) {
            return Ok(None);
        }
        let visibility = renderer.layout_property(layer_id, "visibility");
        Ok(Some(visibility.as_ref().and_then(|v| v.as_str()) != Some("none")))
    }

    /// Whether the unit was added since the last restyle
    pub fn contains<F: RendererFactory>(
        &self,
        lifecycle: &RendererLifecycleController<F>,
        handle: RendererHandle,
        id: &str,
    ) -> bool {
        self.current(lifecycle, handle)
            .map_or(false, |overlays| overlays.units.contains_key(id))
    }

    /// Unit ids bottom to top
    pub fn unit_ids<F: RendererFactory>(
        &self,
        lifecycle: &RendererLifecycleController<F>,
        handle: RendererHandle,
    ) -> Vec<&str> {
        self.current(lifecycle, handle)
            .map(|overlays| overlays.order.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Drops all bookkeeping for a handle
    pub fn forget(&mut self, handle: RendererHandle) {
        if self.handles.remove(&handle).is_some() {
            log::debug!("{} overlay records released", handle);
        }
    }

    fn current<F: RendererFactory>(
        &self,
        lifecycle: &RendererLifecycleController<F>,
        handle: RendererHandle,
    ) -> Option<&HandleOverlays> {
        let overlays = self.handles.get(&handle)?;
        (lifecycle.is_ready(handle) && lifecycle.generation(handle) == Some(overlays.generation))
            .then_some(overlays)
    }

    fn release_on_destroyed(&mut self, handle: RendererHandle, err: MapError) -> MapError {
        if matches!(err, MapError::HandleDestroyed(_)) {
            self.forget(handle);
        }
        err
    }
}

fn check_free<R: Renderer>(
    renderer: &R,
    unit: &OverlayUnit,
    layers: &[LayerSpec],
    own: Option<&UnitRecord>,
) -> Result<()> {
    let mut seen = HashSet::default();
    for layer in layers {
        if !seen.insert(layer.id.as_str()) {
            return Err(MapError::SourceConflict(format!(
                "overlay '{}' declares layer '{}' twice",
                unit.id, layer.id
            )));
        }
    }

    if unit.owns_source() {
        let ours = own.map_or(false, |record| record.owns_source);
        if renderer.has_source(&unit.id) && !ours {
            return Err(MapError::SourceConflict(format!(
                "source '{}' exists and is not an overlay",
                unit.id
            )));
        }
    } else if !renderer.has_source(unit.source_id()) {
        return Err(MapError::SourceConflict(format!(
            "overlay '{}' needs style source '{}'",
            unit.id,
            unit.source_id()
        )));
    }

    for layer in layers {
        let ours = own.map_or(false, |record| record.owns_layer(&layer.id));
        if renderer.has_layer(&layer.id) && !ours {
            return Err(MapError::SourceConflict(format!(
                "layer '{}' exists and is not part of overlay '{}'",
                layer.id, unit.id
            )));
        }
    }
    Ok(())
}

/// Adds source then layers, undoing everything on the first failure
fn add_unit<R: Renderer>(
    renderer: &mut R,
    unit: &OverlayUnit,
    layers: &[LayerSpec],
    before: Option<&str>,
) -> Result<()> {
    if let Some(data) = unit.data() {
        renderer.add_source(&unit.id, data)?;
    }

    for (index, layer) in layers.iter().enumerate() {
        if let Err(err) = renderer.add_layer(layer, before) {
            for added in layers[..index].iter().rev() {
                if let Err(undo) = renderer.remove_layer(&added.id) {
                    log::warn!("failed to roll back layer '{}': {}", added.id, undo);
                }
            }
            if unit.owns_source() {
                if let Err(undo) = renderer.remove_source(&unit.id) {
                    log::warn!("failed to roll back source '{}': {}", unit.id, undo);
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

fn teardown<R: Renderer>(renderer: &mut R, record: &UnitRecord) -> Result<()> {
    for layer in record.layers.iter().rev() {
        if renderer.has_layer(&layer.id) {
            renderer.remove_layer(&layer.id)?;
        }
    }
    if record.owns_source && renderer.has_source(&record.source_id) {
        renderer.remove_source(&record.source_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{geo::LatLng, style::StyleRef, viewport::ViewState},
        data::geojson::GeoJsonGeometry,
        layers::base::LayerKind,
        renderer::{
            headless::{HeadlessFactory, RendererCall},
            RendererEvent,
        },
    };

    fn ready() -> (RendererLifecycleController<HeadlessFactory>, RendererHandle) {
        let mut lifecycle = RendererLifecycleController::new(HeadlessFactory::new());
        let handle = lifecycle
            .create("map", StyleRef::demo(), ViewState::default())
            .unwrap();
        lifecycle.notify(handle, RendererEvent::Load).unwrap();
        (lifecycle, handle)
    }

    fn dot(id: &str, lat: f64) -> OverlayUnit {
        OverlayUnit::new(
            id,
            GeoJson::feature(GeoJsonGeometry::point(LatLng::new(lat, 139.76))),
        )
        .with_layer(LayerSpec::new(format!("{id}-dot"), LayerKind::Circle))
    }

    #[test]
    fn test_repeat_upsert_swaps_data() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();

        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &dot("pos", 35.0)).unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &dot("pos", 35.5)).unwrap(),
            UpsertOutcome::Updated
        );

        let renderer = lifecycle.renderer(handle).unwrap();
        assert_eq!(
            renderer.count_calls(|call| matches!(call, RendererCall::AddLayer { .. })),
            1
        );
        assert_eq!(
            renderer.count_calls(|call| matches!(call, RendererCall::SetSourceData(_))),
            1
        );
        assert_eq!(renderer.source_data("pos"), dot("pos", 35.5).data());
    }

    #[test]
    fn test_kind_change_rebuilds_in_place() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();
        overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap();
        overlays.upsert(&mut lifecycle, handle, &dot("b", 35.1)).unwrap();

        let line = OverlayUnit::new(
            "a",
            GeoJson::feature(GeoJsonGeometry::line_string(&[
                LatLng::new(35.0, 139.0),
                LatLng::new(35.1, 139.1),
            ])),
        )
        .with_layer(LayerSpec::new("a-dot", LayerKind::Circle));

        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &line).unwrap(),
            UpsertOutcome::Rebuilt
        );
        assert_eq!(
            lifecycle.renderer(handle).unwrap().layer_ids(),
            vec!["a-dot", "b-dot"]
        );
    }

    #[test]
    fn test_conflict_leaves_renderer_untouched() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();
        overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap();

        // Different unit reusing a's layer id
        let clash = OverlayUnit::new(
            "b",
            GeoJson::feature(GeoJsonGeometry::point(LatLng::new(35.0, 139.0))),
        )
        .with_layer(LayerSpec::new("a-dot", LayerKind::Circle));

        let err = overlays.upsert(&mut lifecycle, handle, &clash).unwrap_err();
        assert!(matches!(err, MapError::SourceConflict(_)));

        let renderer = lifecycle.renderer(handle).unwrap();
        assert!(!renderer.has_source("b"));
        assert_eq!(renderer.layer_ids(), vec!["a-dot"]);
    }

    #[test]
    fn test_partially_removed_unit_recovers() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();
        let unit = dot("pos", 35.0).with_layer(LayerSpec::new("pos-ring", LayerKind::Line));
        overlays.upsert(&mut lifecycle, handle, &unit).unwrap();

        // Host code drops one layer behind the reconciler's back
        let (renderer, _) = lifecycle.ready_renderer_mut(handle).unwrap();
        renderer.remove_layer("pos-ring").unwrap();

        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &unit).unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &unit).unwrap(),
            UpsertOutcome::Updated
        );
        let renderer = lifecycle.renderer(handle).unwrap();
        assert_eq!(renderer.layer_ids(), vec!["pos-dot", "pos-ring"]);
        assert_eq!(renderer.source_count(), 1);
    }

    #[test]
    fn test_failed_teardown_keeps_ownership() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();
        overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap();

        // A layer the reconciler does not own pins the source
        let (renderer, _) = lifecycle.ready_renderer_mut(handle).unwrap();
        renderer
            .add_layer(&LayerSpec::new("foreign", LayerKind::Circle).bound_to("a"), None)
            .unwrap();

        let ring = [
            LatLng::new(35.0, 139.0),
            LatLng::new(35.0, 139.1),
            LatLng::new(35.1, 139.1),
            LatLng::new(35.0, 139.0),
        ];
        let polygon = OverlayUnit::new("a", GeoJson::feature(GeoJsonGeometry::polygon(&ring)))
            .with_layer(LayerSpec::new("a-dot", LayerKind::Circle));
        assert!(matches!(
            overlays.upsert(&mut lifecycle, handle, &polygon),
            Err(MapError::Renderer(_))
        ));
        assert!(overlays.contains(&lifecycle, handle, "a"));

        let (renderer, _) = lifecycle.ready_renderer_mut(handle).unwrap();
        renderer.remove_layer("foreign").unwrap();
        assert_eq!(
            overlays.upsert(&mut lifecycle, handle, &polygon).unwrap(),
            UpsertOutcome::Created
        );
        let renderer = lifecycle.renderer(handle).unwrap();
        assert_eq!(renderer.layer_ids(), vec!["a-dot"]);
        assert_eq!(renderer.source_count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();

        assert!(!overlays.remove(&mut lifecycle, handle, "missing").unwrap());
        overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap();
        assert!(overlays.remove(&mut lifecycle, handle, "a").unwrap());
        assert!(!overlays.remove(&mut lifecycle, handle, "a").unwrap());
        assert_eq!(lifecycle.renderer(handle).unwrap().source_count(), 0);
    }

    #[test]
    fn test_not_ready_rejected() {
        let mut lifecycle = RendererLifecycleController::new(HeadlessFactory::new());
        let handle = lifecycle
            .create("map", StyleRef::demo(), ViewState::default())
            .unwrap();
        let mut overlays = OverlayReconciler::new();

        let err = overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap_err();
        assert!(matches!(err, MapError::RendererNotReady(h) if h == handle));
    }

    #[test]
    fn test_visibility_toggle() {
        let (mut lifecycle, handle) = ready();
        let mut overlays = OverlayReconciler::new();
        overlays.upsert(&mut lifecycle, handle, &dot("a", 35.0)).unwrap();

        overlays
            .set_layer_visibility(&mut lifecycle, handle, "a-dot", false)
            .unwrap();
        assert_eq!(
            overlays.layer_visibility(&lifecycle, handle, "a-dot").unwrap(),
            Some(false)
        );
        assert_eq!(
            overlays.layer_visibility(&lifecycle, handle, "nope").unwrap(),
            None
        );
    }
}
