use crate::{
    core::viewport::CameraMove,
    overlay::{reconciler::UpsertOutcome, OverlayReconciler, OverlayUnit},
    renderer::{
        LifecycleEvent, RendererFactory, RendererHandle, RendererLifecycleController,
    },
    Result,
};

/// Map-side effects a location session produces
pub trait MapSink {
    fn move_camera(&mut self, handle: RendererHandle, camera: CameraMove) -> Result<()>;

    fn upsert_overlay(&mut self, handle: RendererHandle, unit: &OverlayUnit) -> Result<()>;
}

/// Sink for sessions that run without a map
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl MapSink for Detached {
    fn move_camera(&mut self, _handle: RendererHandle, _camera: CameraMove) -> Result<()> {
        Ok(())
    }

    fn upsert_overlay(&mut self, _handle: RendererHandle, _unit: &OverlayUnit) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle controller and overlay reconciler wired together
pub struct MapServices<F: RendererFactory> {
    pub lifecycle: RendererLifecycleController<F>,
    pub overlays: OverlayReconciler,
}

impl<F: RendererFactory> MapServices<F> {
    pub fn new(factory: F) -> Self {
        Self {
            lifecycle: RendererLifecycleController::new(factory),
            overlays: OverlayReconciler::new(),
        }
    }

    pub fn upsert(&mut self, handle: RendererHandle, unit: &OverlayUnit) -> Result<UpsertOutcome> {
        self.overlays.upsert(&mut self.lifecycle, handle, unit)
    }

    pub fn remove_overlay(&mut self, handle: RendererHandle, id: &str) -> Result<bool> {
        self.overlays.remove(&mut self.lifecycle, handle, id)
    }

    pub fn set_layer_visibility(
        &mut self,
        handle: RendererHandle,
        layer_id: &str,
        visible: bool,
    ) -> Result<()> {
        self.overlays
            .set_layer_visibility(&mut self.lifecycle, handle, layer_id, visible)
    }

    /// Drains lifecycle events, releasing overlay records of destroyed
    /// renderers along the way
    pub fn process_events(&mut self) -> Vec<LifecycleEvent> {
        let events = self.lifecycle.process_events();
        for event in &events {
            if let LifecycleEvent::Destroyed(handle) = event {
                self.overlays.forget(*handle);
            }
        }
        events
    }
}

impl<F: RendererFactory> MapSink for MapServices<F> {
    fn move_camera(&mut self, handle: RendererHandle, camera: CameraMove) -> Result<()> {
        self.lifecycle.move_camera(handle, camera)
    }

    fn upsert_overlay(&mut self, handle: RendererHandle, unit: &OverlayUnit) -> Result<()> {
        self.upsert(handle, unit).map(|_| ())
    }
}
