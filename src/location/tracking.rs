use std::{collections::VecDeque, time::Duration};

use crate::{
    core::{
        config::{AccuracyCircleConfig, SyncConfig, TrackingConfig},
        geo::LatLng,
        viewport::CameraMove,
    },
    location::{
        simulator::SimulatedFeed, GeoFix, LocationError, LocationProvider, RequestId, WatchId,
    },
    overlay::{presets, MapSink},
    renderer::RendererHandle,
    runtime::{TickScheduler, TimerId},
};

/// What feeds a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// Host watch
    Real(WatchId),
    /// Simulator timer
    Simulated(TimerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    Idle,
    /// A one-shot request is outstanding
    Acquiring(RequestId),
    Tracking(Subscription),
}

/// How a fix moves the camera
#[derive(Debug, Clone, Copy, PartialEq)]
enum Recenter {
    FlyTo(Option<f64>),
    PanTo,
}

/// Geolocation state machine.
///
/// One-shot requests resolve to `Idle` with a fix, real or fallback.
/// Tracking uses the host watch when one is available and switches to the
/// simulated feed when the host is absent, refuses or fails mid-watch.
/// Results that arrive for a request, watch or timer the session no longer
/// holds are dropped.
pub struct TrackingSession {
    config: TrackingConfig,
    circle: AccuracyCircleConfig,
    location: Option<Box<dyn LocationProvider>>,
    ticker: Box<dyn TickScheduler>,
    simulator: SimulatedFeed,
    interval: Duration,
    state: TrackingState,
    /// Most recent first
    history: VecDeque<GeoFix>,
    track: Vec<LatLng>,
    attached: Option<RendererHandle>,
    last_error: Option<LocationError>,
    dropped_map_updates: u64,
}

impl TrackingSession {
    pub fn new(
        config: &SyncConfig,
        location: Option<Box<dyn LocationProvider>>,
        ticker: Box<dyn TickScheduler>,
    ) -> Self {
        let mut tracking = config.tracking.clone();
        if tracking.history_capacity == 0 {
            log::warn!("tracking history capacity of 0 raised to 1");
            tracking.history_capacity = 1;
        }
        Self {
            history: VecDeque::with_capacity(tracking.history_capacity),
            config: tracking,
            circle: config.accuracy_circle.clone(),
            location,
            ticker,
            simulator: SimulatedFeed::new(config.simulation.clone()),
            interval: Duration::from_millis(config.simulation.interval_ms),
            state: TrackingState::Idle,
            track: Vec::new(),
            attached: None,
            last_error: None,
            dropped_map_updates: 0,
        }
    }

    /// Sends camera moves and overlays for later fixes to `handle`
    pub fn attach(&mut self, handle: RendererHandle) {
        self.attached = Some(handle);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    pub fn attached(&self) -> Option<RendererHandle> {
        self.attached
    }

    /// Asks for a single fix. Without a location service, or when it refuses
    /// the request, the fallback fix is recorded at once.
    pub fn request_once(&mut self, map: &mut dyn MapSink) -> TrackingState {
        if self.state != TrackingState::Idle {
            log::debug!("one-shot request ignored while {:?}", self.state);
            return self.state;
        }

        let requested = match self.location.as_mut() {
            Some(location) => location.get_current_fix(&self.config.position_options),
            None => Err(LocationError::CapabilityAbsent),
        };

        match requested {
            Ok(request) => {
                self.last_error = None;
                self.state = TrackingState::Acquiring(request);
            }
            Err(err) => self.fall_back(err, map),
        }
        self.state
    }

    /// Delivers the result of a one-shot request
    pub fn on_current_fix(
        &mut self,
        request: RequestId,
        result: Result<GeoFix, LocationError>,
        map: &mut dyn MapSink,
    ) {
        if self.state != TrackingState::Acquiring(request) {
            log::debug!("dropping stale result for request {:?}", request);
            return;
        }

        self.state = TrackingState::Idle;
        match result {
            Ok(fix) => {
                self.last_error = None;
                let zoom = self.config.recenter_zoom;
                self.record(fix, Recenter::FlyTo(Some(zoom)), map);
            }
            Err(err) => self.fall_back(err, map),
        }
    }

    /// Starts continuous tracking. Does nothing when already tracking; an
    /// outstanding one-shot request is abandoned.
    pub fn start_tracking(&mut self) -> TrackingState {
        if let TrackingState::Tracking(_) = self.state {
            return self.state;
        }

        let watched = match self.location.as_mut() {
            Some(location) => location.watch_fix(&self.config.position_options),
            None => Err(LocationError::CapabilityAbsent),
        };

        match watched {
            Ok(watch) => {
                log::debug!("watching host location ({:?})", watch);
                self.last_error = None;
                self.state = TrackingState::Tracking(Subscription::Real(watch));
            }
            Err(err) => {
                log::warn!("host watch unavailable ({}), simulating", err);
                self.last_error = Some(err);
                self.start_simulated();
            }
        }
        self.state
    }

    /// Delivers a fix or failure from the host watch. A failure cancels the
    /// watch and continues on the simulated feed.
    pub fn on_watch_update(
        &mut self,
        watch: WatchId,
        result: Result<GeoFix, LocationError>,
        map: &mut dyn MapSink,
    ) {
        if self.state != TrackingState::Tracking(Subscription::Real(watch)) {
            log::debug!("dropping update from inactive watch {:?}", watch);
            return;
        }

        match result {
            Ok(fix) => self.record(fix, Recenter::PanTo, map),
            Err(err) => {
                log::warn!("host watch failed ({}), simulating", err);
                self.last_error = Some(err);
                if let Some(location) = self.location.as_mut() {
                    location.cancel_watch(watch);
                }
                self.start_simulated();
            }
        }
    }

    /// Delivers a simulator timer expiry
    pub fn on_tick(&mut self, timer: TimerId, map: &mut dyn MapSink) {
        if self.state != TrackingState::Tracking(Subscription::Simulated(timer)) {
            log::debug!("dropping tick from inactive {}", timer);
            return;
        }
        let fix = self.simulator.next_fix();
        self.record(fix, Recenter::FlyTo(None), map);
    }

    /// Ends tracking and cancels the subscription exactly once. Returns
    /// `false` when nothing was running.
    pub fn stop_tracking(&mut self) -> bool {
        let TrackingState::Tracking(subscription) = self.state else {
            return false;
        };
        self.state = TrackingState::Idle;

        match subscription {
            Subscription::Real(watch) => {
                if let Some(location) = self.location.as_mut() {
                    location.cancel_watch(watch);
                }
            }
            Subscription::Simulated(timer) => self.ticker.cancel(timer),
        }
        log::debug!("stopped tracking ({:?})", subscription);
        true
    }

    /// Re-issues overlays for the current fix and track, e.g. after a
    /// restyle wiped them
    pub fn resync(&mut self, map: &mut dyn MapSink) {
        let Some(handle) = self.attached else {
            return;
        };
        let Some(fix) = self.history.front().cloned() else {
            return;
        };
        if !self.push_overlays(handle, &fix, map) {
            self.dropped_map_updates += 1;
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking(_))
    }

    /// Whether the running subscription is the simulated feed
    pub fn is_simulating(&self) -> bool {
        matches!(
            self.state,
            TrackingState::Tracking(Subscription::Simulated(_))
        )
    }

    /// Most recent fix first
    pub fn history(&self) -> impl Iterator<Item = &GeoFix> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&GeoFix> {
        self.history.front()
    }

    /// Positions recorded while tracking, oldest first
    pub fn track(&self) -> &[LatLng] {
        &self.track
    }

    pub fn clear_track(&mut self) {
        self.track.clear();
    }

    pub fn last_error(&self) -> Option<LocationError> {
        self.last_error
    }

    /// User-facing message for the last location failure
    pub fn advisory(&self) -> Option<&'static str> {
        self.last_error.map(|err| err.advisory())
    }

    /// Fixes whose camera or overlay update the renderer rejected
    pub fn dropped_map_updates(&self) -> u64 {
        self.dropped_map_updates
    }

    pub fn simulator(&self) -> &SimulatedFeed {
        &self.simulator
    }

    fn fall_back(&mut self, err: LocationError, map: &mut dyn MapSink) {
        log::warn!("location request failed ({}), using fallback fix", err);
        self.last_error = Some(err);
        self.state = TrackingState::Idle;
        let fix = self.simulator.fallback_fix();
        let zoom = self.config.recenter_zoom;
        self.record(fix, Recenter::FlyTo(Some(zoom)), map);
    }

    fn start_simulated(&mut self) {
        self.simulator.reset();
        let timer = self.ticker.start(self.interval);
        log::debug!("simulating location every {:?} ({})", self.interval, timer);
        self.state = TrackingState::Tracking(Subscription::Simulated(timer));
    }

    fn record(&mut self, fix: GeoFix, recenter: Recenter, map: &mut dyn MapSink) {
        if self.is_tracking() {
            self.track.push(fix.position());
        }
        self.history.push_front(fix.clone());
        self.history.truncate(self.config.history_capacity);

        let Some(handle) = self.attached else {
            return;
        };

        let camera = match recenter {
            Recenter::FlyTo(zoom) => CameraMove::FlyTo {
                center: fix.position(),
                zoom,
            },
            Recenter::PanTo => CameraMove::PanTo {
                center: fix.position(),
            },
        };
        let moved = match map.move_camera(handle, camera) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("camera update for {} dropped: {}", handle, err);
                false
            }
        };

        if !(self.push_overlays(handle, &fix, map) && moved) {
            self.dropped_map_updates += 1;
        }
    }

    fn push_overlays(&self, handle: RendererHandle, fix: &GeoFix, map: &mut dyn MapSink) -> bool {
        let mut units = vec![
            presets::accuracy_circle(fix.position(), fix.accuracy_m, &self.circle),
            presets::position_marker(fix.position()),
        ];
        if self.is_tracking() && !self.track.is_empty() {
            units.push(presets::track_line(&self.track));
        }

        let mut delivered = true;
        for unit in &units {
            if let Err(err) = map.upsert_overlay(handle, unit) {
                log::warn!("overlay '{}' for {} dropped: {}", unit.id, handle, err);
                delivered = false;
            }
        }
        delivered
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlay::Detached, runtime::ManualTicker};

    fn session_without_location() -> (TrackingSession, ManualTicker) {
        let ticker = ManualTicker::new();
        let session = TrackingSession::new(&SyncConfig::default(), None, Box::new(ticker.clone()));
        (session, ticker)
    }

    #[test]
    fn test_request_once_without_location_uses_fallback() {
        let (mut session, _) = session_without_location();

        assert_eq!(session.request_once(&mut Detached), TrackingState::Idle);
        let fix = session.latest().unwrap();
        assert!(fix.is_simulated);
        assert_eq!(fix.accuracy_m, 15.0);
        assert_eq!(session.last_error(), Some(LocationError::CapabilityAbsent));
        assert!(session.track().is_empty());
    }

    #[test]
    fn test_zero_history_capacity_keeps_latest() {
        let mut config = SyncConfig::default();
        config.tracking.history_capacity = 0;
        let mut session = TrackingSession::new(&config, None, Box::new(ManualTicker::new()));

        session.request_once(&mut Detached);
        session.request_once(&mut Detached);

        assert!(session.latest().is_some());
        assert_eq!(session.history().count(), 1);
    }

    #[test]
    fn test_stop_twice() {
        let (mut session, ticker) = session_without_location();
        session.start_tracking();
        let timers = ticker.active_timers();
        assert_eq!(timers.len(), 1);
        let timer = timers[0];

        assert!(session.stop_tracking());
        assert!(!session.stop_tracking());
        assert_eq!(ticker.cancelled(), vec![timer]);
        assert_eq!(session.state(), TrackingState::Idle);
    }

    #[test]
    fn test_ticks_after_stop_are_dropped() {
        let (mut session, ticker) = session_without_location();
        session.start_tracking();
        let timer = ticker.active_timers()[0];

        session.on_tick(timer, &mut Detached);
        session.stop_tracking();
        session.on_tick(timer, &mut Detached);

        assert_eq!(session.history().count(), 1);
        assert_eq!(session.track().len(), 1);
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (mut session, ticker) = session_without_location();
        session.start_tracking();
        assert_eq!(ticker.active_timers().len(), 1);

        drop(session);
        assert!(ticker.active_timers().is_empty());
    }
}
