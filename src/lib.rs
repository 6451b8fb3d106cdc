//! # mapsync
//!
//! Keeps a live map renderer's source/layer graph consistent with application
//! state that changes asynchronously: user input, a geolocation stream, or a
//! simulated feed.
//!
//! The renderer and the host location service are injected capabilities
//! ([`renderer::Renderer`], [`location::LocationProvider`]), so the whole
//! synchronization layer runs headless and deterministically in tests.
//!
//! - [`renderer::RendererLifecycleController`] owns renderer instances and the
//!   ready / restyle / destroy lifecycle.
//! - [`overlay::OverlayReconciler`] is the only component that mutates
//!   renderer sources and layers.
//! - [`location::TrackingSession`] is the geolocation state machine with its
//!   simulated fallback.
//! - [`routing::estimate`] builds placeholder routes with distance and ETA.
//! - [`screens`] holds the headless controllers behind each demo screen.

pub mod core;
pub mod data;
pub mod layers;
pub mod location;
pub mod overlay;
pub mod prelude;
pub mod renderer;
pub mod routing;
pub mod runtime;
pub mod screens;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::SyncConfig,
    geo::{LatLng, LatLngBounds},
    style::{StyleCatalog, StyleRef},
    viewport::{CameraMove, ViewState},
};

pub use data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use layers::base::{LayerKind, LayerSpec};

pub use location::{
    GeoFix, LocationError, LocationProvider, RequestId, TrackingSession, TrackingState, WatchId,
};

pub use overlay::{MapServices, MapSink, OverlayReconciler, OverlayUnit, UpsertOutcome};

pub use renderer::{
    headless::{HeadlessFactory, HeadlessRenderer},
    ContainerId, LifecycleEvent, LifecycleState, Renderer, RendererEvent, RendererFactory,
    RendererHandle, RendererLifecycleController,
};

pub use routing::{estimate, RouteEstimate, Waypoint};

pub use runtime::{ManualTicker, TickScheduler, TimerId};

#[cfg(feature = "tokio-runtime")]
pub use runtime::TokioTicker;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("renderer not ready: {0}")]
    RendererNotReady(RendererHandle),

    #[error("handle not live: {0}")]
    HandleDestroyed(RendererHandle),

    #[error("container '{0}' already hosts a live renderer")]
    ContainerOccupied(String),

    #[error("source conflict: {0}")]
    SourceConflict(String),

    #[error("renderer rejected operation: {0}")]
    Renderer(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;
