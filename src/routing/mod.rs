//! Route estimation between named points of interest

pub mod estimator;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::geo::LatLng;

pub use estimator::{estimate, estimate_with, eta_minutes, RouteEstimate};

/// A named route endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub position: LatLng,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            name: name.into(),
            position: LatLng::new(latitude, longitude),
        }
    }
}

static POINTS_OF_INTEREST: Lazy<Vec<Waypoint>> = Lazy::new(|| {
    vec![
        Waypoint::new("Tokyo Station", 139.7671, 35.6812),
        Waypoint::new("Shinjuku Station", 139.7016, 35.6905),
        Waypoint::new("Shibuya Station", 139.7020, 35.6580),
        Waypoint::new("Ikebukuro Station", 139.7103, 35.7295),
        Waypoint::new("Ueno Station", 139.7770, 35.7141),
    ]
});

/// Selectable route endpoints
pub fn points_of_interest() -> &'static [Waypoint] {
    &POINTS_OF_INTEREST
}

pub fn find_point_of_interest(name: &str) -> Option<&'static Waypoint> {
    POINTS_OF_INTEREST.iter().find(|poi| poi.name == name)
}
