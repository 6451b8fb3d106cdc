//! In-memory renderer used by tests and the headless demo.
//!
//! It keeps the source/layer graph the way a real map engine would and
//! rejects the same invalid edits, so overlay bookkeeping can be checked
//! without a display.

use std::{cell::Cell, rc::Rc};

use serde_json::Value;

use crate::{
    core::{
        geo::{LatLng, LatLngBounds},
        style::StyleRef,
        viewport::{CameraMove, ViewState},
    },
    data::geojson::GeoJson,
    layers::base::LayerSpec,
    prelude::HashMap,
    renderer::{ContainerId, Renderer, RendererFactory},
    MapError, Result,
};

/// A mutation the headless renderer received, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    SetStyle(String),
    AddSource(String),
    SetSourceData(String),
    RemoveSource(String),
    AddLayer { id: String, before: Option<String> },
    RemoveLayer(String),
    SetLayoutProperty { layer: String, name: String },
}

/// Source data held by the headless renderer
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessSource {
    GeoJson(GeoJson),
    /// Defined by the style, e.g. a vector tile source
    Style,
}

pub struct HeadlessRenderer {
    container: ContainerId,
    style: StyleRef,
    view: ViewState,
    style_sources: Vec<String>,
    sources: HashMap<String, HeadlessSource>,
    /// Bottom to top
    layers: Vec<LayerSpec>,
    camera_log: Vec<CameraMove>,
    calls: Vec<RendererCall>,
    removed: bool,
    live: Rc<Cell<usize>>,
}

impl HeadlessRenderer {
    fn new(
        container: &str,
        style: &StyleRef,
        view: &ViewState,
        style_sources: Vec<String>,
        live: Rc<Cell<usize>>,
    ) -> Self {
        live.set(live.get() + 1);
        let mut renderer = Self {
            container: container.to_string(),
            style: style.clone(),
            view: *view,
            style_sources,
            sources: HashMap::default(),
            layers: Vec::new(),
            camera_log: Vec::new(),
            calls: Vec::new(),
            removed: false,
            live,
        };
        renderer.load_style_sources();
        renderer
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn style(&self) -> &StyleRef {
        &self.style
    }

    /// Camera position after the last applied move
    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn camera_log(&self) -> &[CameraMove] {
        &self.camera_log
    }

    pub fn calls(&self) -> &[RendererCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&RendererCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn source(&self, id: &str) -> Option<&HeadlessSource> {
        self.sources.get(id)
    }

    pub fn source_data(&self, id: &str) -> Option<&GeoJson> {
        match self.sources.get(id) {
            Some(HeadlessSource::GeoJson(data)) => Some(data),
            _ => None,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Layer ids bottom to top
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn load_style_sources(&mut self) {
        for id in &self.style_sources {
            self.sources.insert(id.clone(), HeadlessSource::Style);
        }
    }

    fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    fn check_alive(&self) -> Result<()> {
        if self.removed {
            return Err(MapError::Renderer(format!(
                "renderer in '{}' was removed",
                self.container
            )));
        }
        Ok(())
    }

    fn record_camera(&mut self, camera: CameraMove) {
        self.view = match &camera {
            CameraMove::JumpTo(view) => *view,
            CameraMove::FlyTo { center, zoom } => {
                ViewState::new(*center, zoom.unwrap_or(self.view.zoom))
            }
            CameraMove::PanTo { center } => ViewState::new(*center, self.view.zoom),
            CameraMove::FitBounds { bounds, .. } => ViewState::new(bounds.center(), self.view.zoom),
        };
        self.camera_log.push(camera);
    }
}

impl Renderer for HeadlessRenderer {
    fn set_style(&mut self, style: &StyleRef) -> Result<()> {
        self.check_alive()?;
        // Everything added at runtime disappears with the old style.
        self.sources.clear();
        self.layers.clear();
        self.load_style_sources();
        self.style = style.clone();
        self.calls.push(RendererCall::SetStyle(style.url().to_string()));
        Ok(())
    }

    fn jump_to(&mut self, view: &ViewState) {
        self.record_camera(CameraMove::JumpTo(*view));
    }

    fn fly_to(&mut self, center: LatLng, zoom: Option<f64>) {
        self.record_camera(CameraMove::FlyTo { center, zoom });
    }

    fn pan_to(&mut self, center: LatLng) {
        self.record_camera(CameraMove::PanTo { center });
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) {
        self.record_camera(CameraMove::FitBounds {
            bounds: *bounds,
            padding,
        });
    }

    fn add_source(&mut self, id: &str, data: &GeoJson) -> Result<()> {
        self.check_alive()?;
        if self.sources.contains_key(id) {
            return Err(MapError::Renderer(format!("source '{}' already exists", id)));
        }
        self.sources
            .insert(id.to_string(), HeadlessSource::GeoJson(data.clone()));
        self.calls.push(RendererCall::AddSource(id.to_string()));
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn set_source_data(&mut self, id: &str, data: &GeoJson) -> Result<()> {
        self.check_alive()?;
        match self.sources.get_mut(id) {
            Some(HeadlessSource::GeoJson(existing)) => {
                *existing = data.clone();
                self.calls.push(RendererCall::SetSourceData(id.to_string()));
                Ok(())
            }
            Some(HeadlessSource::Style) => Err(MapError::Renderer(format!(
                "source '{}' is not a GeoJSON source",
                id
            ))),
            None => Err(MapError::Renderer(format!("source '{}' does not exist", id))),
        }
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        self.check_alive()?;
        if !self.sources.contains_key(id) {
            return Err(MapError::Renderer(format!("source '{}' does not exist", id)));
        }
        if let Some(layer) = self.layers.iter().find(|layer| layer.source == id) {
            return Err(MapError::Renderer(format!(
                "source '{}' is still used by layer '{}'",
                id, layer.id
            )));
        }
        self.sources.remove(id);
        self.calls.push(RendererCall::RemoveSource(id.to_string()));
        Ok(())
    }

    fn add_layer(&mut self, spec: &LayerSpec, before: Option<&str>) -> Result<()> {
        self.check_alive()?;
        if self.layer_index(&spec.id).is_some() {
            return Err(MapError::Renderer(format!("layer '{}' already exists", spec.id)));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(MapError::Renderer(format!(
                "layer '{}' references missing source '{}'",
                spec.id, spec.source
            )));
        }

        let index = match before {
            Some(before_id) => self.layer_index(before_id).ok_or_else(|| {
                MapError::Renderer(format!("layer '{}' does not exist", before_id))
            })?,
            None => self.layers.len(),
        };
        self.layers.insert(index, spec.clone());
        self.calls.push(RendererCall::AddLayer {
            id: spec.id.clone(),
            before: before.map(str::to_string),
        });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer_index(id).is_some()
    }

    fn set_layout_property(&mut self, layer_id: &str, name: &str, value: Value) -> Result<()> {
        self.check_alive()?;
        let index = self
            .layer_index(layer_id)
            .ok_or_else(|| MapError::Renderer(format!("layer '{}' does not exist", layer_id)))?;
        self.layers[index].layout.insert(name.to_string(), value);
        self.calls.push(RendererCall::SetLayoutProperty {
            layer: layer_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn layout_property(&self, layer_id: &str, name: &str) -> Option<Value> {
        self.layer(layer_id)
            .and_then(|layer| layer.layout.get(name))
            .cloned()
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        self.check_alive()?;
        let index = self
            .layer_index(id)
            .ok_or_else(|| MapError::Renderer(format!("layer '{}' does not exist", id)))?;
        self.layers.remove(index);
        self.calls.push(RendererCall::RemoveLayer(id.to_string()));
        Ok(())
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.sources.clear();
        self.layers.clear();
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Builds [`HeadlessRenderer`]s and counts how many are alive
#[derive(Default)]
pub struct HeadlessFactory {
    live: Rc<Cell<usize>>,
    constructed: Vec<ContainerId>,
    style_sources: Vec<String>,
    fail_next: bool,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources every style provides, such as the `composite` vector source
    /// building extrusions read from
    pub fn with_style_sources(mut self, sources: &[&str]) -> Self {
        self.style_sources = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Makes the next `construct` call fail
    pub fn fail_next_construct(&mut self) {
        self.fail_next = true;
    }

    /// Instances constructed and not yet removed
    pub fn live_count(&self) -> usize {
        self.live.get()
    }

    /// Containers in construction order
    pub fn constructed(&self) -> &[ContainerId] {
        &self.constructed
    }
}

impl RendererFactory for HeadlessFactory {
    type Renderer = HeadlessRenderer;

    fn construct(
        &mut self,
        container: &str,
        style: &StyleRef,
        view: &ViewState,
    ) -> Result<HeadlessRenderer> {
        if std::mem::take(&mut self.fail_next) {
            return Err(MapError::Renderer(format!(
                "failed to construct renderer in '{}'",
                container
            )));
        }
        self.constructed.push(container.to_string());
        Ok(HeadlessRenderer::new(
            container,
            style,
            view,
            self.style_sources.clone(),
            self.live.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::geojson::GeoJsonGeometry, layers::base::LayerKind};

    fn renderer() -> HeadlessRenderer {
        HeadlessFactory::new()
            .construct("map", &StyleRef::demo(), &ViewState::default())
            .unwrap()
    }

    fn point() -> GeoJson {
        GeoJson::feature(GeoJsonGeometry::point(LatLng::new(35.6812, 139.7634)))
    }

    #[test]
    fn test_source_in_use_cannot_be_removed() {
        let mut renderer = renderer();
        renderer.add_source("pos", &point()).unwrap();
        renderer
            .add_layer(&LayerSpec::new("pos-dot", LayerKind::Circle).bound_to("pos"), None)
            .unwrap();

        assert!(renderer.remove_source("pos").is_err());
        renderer.remove_layer("pos-dot").unwrap();
        renderer.remove_source("pos").unwrap();
        assert_eq!(renderer.source_count(), 0);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut renderer = renderer();
        renderer.add_source("pos", &point()).unwrap();
        assert!(renderer.add_source("pos", &point()).is_err());

        let layer = LayerSpec::new("pos-dot", LayerKind::Circle).bound_to("pos");
        renderer.add_layer(&layer, None).unwrap();
        assert!(renderer.add_layer(&layer, None).is_err());
        assert!(renderer
            .add_layer(&LayerSpec::new("x", LayerKind::Line).bound_to("missing"), None)
            .is_err());
    }

    #[test]
    fn test_before_inserts_below() {
        let mut renderer = renderer();
        renderer.add_source("s", &point()).unwrap();
        for id in ["a", "c"] {
            renderer
                .add_layer(&LayerSpec::new(id, LayerKind::Circle).bound_to("s"), None)
                .unwrap();
        }
        renderer
            .add_layer(&LayerSpec::new("b", LayerKind::Circle).bound_to("s"), Some("c"))
            .unwrap();

        assert_eq!(renderer.layer_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_set_style_keeps_only_style_sources() {
        let mut renderer = HeadlessFactory::new()
            .with_style_sources(&["composite"])
            .construct("map", &StyleRef::demo(), &ViewState::default())
            .unwrap();
        renderer.add_source("pos", &point()).unwrap();

        renderer.set_style(&StyleRef::new("dark")).unwrap();

        assert!(!renderer.has_source("pos"));
        assert_eq!(renderer.source("composite"), Some(&HeadlessSource::Style));
    }

    #[test]
    fn test_live_count() {
        let mut factory = HeadlessFactory::new();
        let mut first = factory
            .construct("a", &StyleRef::demo(), &ViewState::default())
            .unwrap();
        let _second = factory
            .construct("b", &StyleRef::demo(), &ViewState::default())
            .unwrap();
        assert_eq!(factory.live_count(), 2);

        first.remove();
        first.remove();
        assert_eq!(factory.live_count(), 1);
        assert!(first.add_source("pos", &point()).is_err());
    }
}
