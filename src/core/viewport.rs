use crate::core::{
    constants::{REFERENCE_LATITUDE, REFERENCE_LONGITUDE},
    geo::{LatLng, LatLngBounds},
};
use serde::{Deserialize, Serialize};

/// Camera position requested by consumers: center and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The zoom level
    pub zoom: f64,
}

impl ViewState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    /// Convenience constructor in the `{longitude, latitude, zoom}` order screens use
    pub fn from_lng_lat_zoom(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Self::new(LatLng::new(latitude, longitude), zoom)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_lng_lat_zoom(REFERENCE_LONGITUDE, REFERENCE_LATITUDE, 8.0)
    }
}

/// A camera movement the renderer should perform.
///
/// `JumpTo` is immediate; the other variants are animated by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CameraMove {
    JumpTo(ViewState),
    FlyTo { center: LatLng, zoom: Option<f64> },
    PanTo { center: LatLng },
    FitBounds { bounds: LatLngBounds, padding: f64 },
}

impl CameraMove {
    /// The point the camera ends up centred on
    pub fn target(&self) -> LatLng {
        match self {
            CameraMove::JumpTo(view) => view.center,
            CameraMove::FlyTo { center, .. } | CameraMove::PanTo { center } => *center,
            CameraMove::FitBounds { bounds, .. } => bounds.center(),
        }
    }
}
