//! Headless controllers behind the demo screens.
//!
//! Each screen owns one renderer instance and keeps its overlays in sync
//! with its own state. Overlay writes issued before the renderer is ready
//! are skipped; the screen replays them from [`Screen::sync`] when the
//! instance reports ready or finishes a restyle.

pub mod basic_map;
pub mod geolocation;
pub mod markers;
pub mod routing;
pub mod styles;

use crate::{
    overlay::MapServices,
    renderer::{LifecycleEvent, RendererFactory, RendererHandle},
    MapError, Result,
};

pub use basic_map::{BasicMapScreen, City, CITIES};
pub use geolocation::{GeolocationScreen, LocationPanel};
pub use markers::{MarkerDraft, MarkersScreen};
pub use routing::RoutingScreen;
pub use styles::StylesScreen;

pub trait Screen<F: RendererFactory> {
    fn name(&self) -> &str;

    fn handle(&self) -> RendererHandle;

    /// Pushes the screen's overlays to the renderer
    fn sync(&mut self, _services: &mut MapServices<F>) -> Result<()> {
        Ok(())
    }

    /// Reacts to lifecycle events of the screen's own renderer
    fn on_event(&mut self, event: &LifecycleEvent, services: &mut MapServices<F>) -> Result<()> {
        match event {
            LifecycleEvent::Ready(handle) | LifecycleEvent::Restyled { handle, .. }
                if *handle == self.handle() =>
            {
                self.sync(services)
            }
            _ => Ok(()),
        }
    }

    /// Releases the renderer
    fn unmount(&mut self, services: &mut MapServices<F>) -> Result<()> {
        services.lifecycle.destroy(self.handle())
    }
}

/// Turns "renderer not ready" into a skipped write
pub(crate) fn deferred<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MapError::RendererNotReady(handle)) => {
            log::debug!("{} not ready, overlay write deferred", handle);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
