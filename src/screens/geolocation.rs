use serde::Serialize;

use crate::{
    core::{style::StyleRef, viewport::ViewState},
    location::{GeoFix, LocationError, RequestId, TrackingSession, TrackingState, WatchId},
    overlay::MapServices,
    renderer::{RendererFactory, RendererHandle},
    runtime::TimerId,
    screens::Screen,
    Result,
};

/// What the location side panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationPanel {
    pub current: Option<GeoFix>,
    /// Earlier fixes, most recent first
    pub previous: Vec<GeoFix>,
    pub advisory: Option<&'static str>,
    pub speed_kmh: Option<f64>,
    pub simulated: bool,
    pub tracking: bool,
}

/// Current position, tracking toggle and fix history on a map
pub struct GeolocationScreen {
    handle: RendererHandle,
    session: TrackingSession,
}

impl GeolocationScreen {
    pub fn handle(&self) -> RendererHandle {
        self.handle
    }

    pub fn mount<F: RendererFactory>(
        services: &mut MapServices<F>,
        container: &str,
        style: StyleRef,
        view: ViewState,
        mut session: TrackingSession,
    ) -> Result<Self> {
        let handle = services.lifecycle.create(container, style, view)?;
        session.attach(handle);
        Ok(Self { handle, session })
    }

    pub fn locate_once<F: RendererFactory>(&mut self, services: &mut MapServices<F>) -> TrackingState {
        self.session.request_once(services)
    }

    /// Starts tracking when stopped and stops it when running
    pub fn toggle_tracking(&mut self) -> TrackingState {
        if self.session.is_tracking() {
            self.session.stop_tracking();
        } else {
            self.session.start_tracking();
        }
        self.session.state()
    }

    pub fn on_current_fix<F: RendererFactory>(
        &mut self,
        request: RequestId,
        result: std::result::Result<GeoFix, LocationError>,
        services: &mut MapServices<F>,
    ) {
        self.session.on_current_fix(request, result, services);
    }

    pub fn on_watch_update<F: RendererFactory>(
        &mut self,
        watch: WatchId,
        result: std::result::Result<GeoFix, LocationError>,
        services: &mut MapServices<F>,
    ) {
        self.session.on_watch_update(watch, result, services);
    }

    pub fn on_tick<F: RendererFactory>(&mut self, timer: TimerId, services: &mut MapServices<F>) {
        self.session.on_tick(timer, services);
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TrackingSession {
        &mut self.session
    }

    pub fn panel(&self) -> LocationPanel {
        let current = self.session.latest().cloned();
        LocationPanel {
            simulated: current.as_ref().map_or(false, |fix| fix.is_simulated),
            speed_kmh: current.as_ref().and_then(GeoFix::speed_kmh),
            current,
            previous: self.session.history().skip(1).cloned().collect(),
            advisory: self.session.advisory(),
            tracking: self.session.is_tracking(),
        }
    }
}

impl<F: RendererFactory> Screen<F> for GeolocationScreen {
    fn name(&self) -> &str {
        "geolocation"
    }

    fn handle(&self) -> RendererHandle {
        self.handle
    }

    fn sync(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.session.resync(services);
        Ok(())
    }

    fn unmount(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.session.stop_tracking();
        self.session.detach();
        services.lifecycle.destroy(self.handle)
    }
}
