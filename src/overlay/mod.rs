//! Named overlay units and the reconciler that keeps them in the renderer

pub mod presets;
pub mod reconciler;
pub mod sink;
pub mod unit;

pub use presets::MapMarker;
pub use reconciler::{OverlayReconciler, UpsertOutcome};
pub use sink::{Detached, MapServices, MapSink};
pub use unit::{OverlaySource, OverlayUnit};
