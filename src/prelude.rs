//! Prelude module for common mapsync types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapsync::prelude::*;`

pub use crate::core::{
    config::{
        AccuracyCircleConfig, PositionOptions, RouteConfig, SimulationConfig, SyncConfig,
        TrackingConfig,
    },
    geo::{LatLng, LatLngBounds},
    style::{StyleCatalog, StyleRef},
    viewport::{CameraMove, ViewState},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::layers::base::{LayerKind, LayerSpec};

pub use crate::location::{
    GeoFix, LocationError, LocationProvider, RequestId, SimulatedFeed, TrackingSession,
    TrackingState, WatchId,
};

pub use crate::overlay::{
    presets, MapMarker, MapServices, MapSink, OverlayReconciler, OverlayUnit, UpsertOutcome,
};

pub use crate::renderer::{
    headless::HeadlessFactory, LifecycleEvent, LifecycleState, Renderer, RendererEvent,
    RendererFactory, RendererHandle, RendererLifecycleController,
};

pub use crate::routing::{estimate, RouteEstimate, Waypoint};

pub use crate::runtime::{ManualTicker, TickScheduler, TimerId};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioTicker;

pub use crate::screens::{
    BasicMapScreen, GeolocationScreen, MarkersScreen, RoutingScreen, Screen, StylesScreen,
};

pub use crate::{MapError, Result};

pub use std::time::Duration;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
