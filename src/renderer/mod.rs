//! Renderer capability and the lifecycle controller that owns its instances
//!
//! The map-drawing engine is an opaque capability. The crate only needs the
//! operations in [`Renderer`] and a [`RendererFactory`] able to build one
//! per container. Readiness is reported back by the host through
//! [`RendererEvent`]s.

pub mod handle;
pub mod headless;
pub mod lifecycle;

use serde_json::Value;

use crate::{
    core::{
        geo::{LatLng, LatLngBounds},
        style::StyleRef,
        viewport::ViewState,
    },
    data::geojson::GeoJson,
    layers::base::LayerSpec,
    Result,
};

pub use handle::RendererHandle;
pub use lifecycle::{LifecycleEvent, LifecycleState, RendererLifecycleController};

/// Identifier of the host element a renderer draws into
pub type ContainerId = String;

/// Notifications a renderer emits back to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererEvent {
    /// Initial style and tiles finished loading
    Load,
    /// A style swapped in with `set_style` finished loading
    StyleLoad,
}

/// Operations the synchronization layer needs from a live renderer instance.
///
/// Implementations are expected to reject invalid graph edits the way map
/// engines do: duplicate ids, layers pointing at missing sources, removing a
/// source a layer still references.
pub trait Renderer {
    /// Swaps the style in place. Sources and layers not defined by the new
    /// style are dropped once it loads.
    fn set_style(&mut self, style: &StyleRef) -> Result<()>;

    fn jump_to(&mut self, view: &ViewState);

    fn fly_to(&mut self, center: LatLng, zoom: Option<f64>);

    fn pan_to(&mut self, center: LatLng);

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64);

    fn add_source(&mut self, id: &str, data: &GeoJson) -> Result<()>;

    fn has_source(&self, id: &str) -> bool;

    fn set_source_data(&mut self, id: &str, data: &GeoJson) -> Result<()>;

    fn remove_source(&mut self, id: &str) -> Result<()>;

    /// Adds a layer on top, or directly below `before` when given
    fn add_layer(&mut self, spec: &LayerSpec, before: Option<&str>) -> Result<()>;

    fn has_layer(&self, id: &str) -> bool;

    fn set_layout_property(&mut self, layer_id: &str, name: &str, value: Value) -> Result<()>;

    fn layout_property(&self, layer_id: &str, name: &str) -> Option<Value>;

    fn remove_layer(&mut self, id: &str) -> Result<()>;

    /// Releases the instance and everything attached to it
    fn remove(&mut self);
}

/// Builds renderer instances
pub trait RendererFactory {
    type Renderer: Renderer;

    /// Starts constructing a renderer. The instance reports
    /// [`RendererEvent::Load`] once it is usable.
    fn construct(
        &mut self,
        container: &str,
        style: &StyleRef,
        view: &ViewState,
    ) -> Result<Self::Renderer>;
}
