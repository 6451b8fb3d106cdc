//! Geolocation: the host location capability, the simulated feed that
//! stands in for it, and the tracking session driving both.

pub mod fix;
pub mod simulator;
pub mod tracking;

use serde::{Deserialize, Serialize};

use crate::core::config::PositionOptions;

pub use fix::GeoFix;
pub use simulator::SimulatedFeed;
pub use tracking::{Subscription, TrackingSession, TrackingState};

/// Failure reported by the host location service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("no location service available")]
    CapabilityAbsent,
}

impl LocationError {
    /// Maps the W3C geolocation error codes; anything else is treated as an
    /// unavailable position
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            _ => LocationError::PositionUnavailable,
        }
    }

    /// Message suitable for showing to the user next to simulated data
    pub fn advisory(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location access was denied. Allow location in your browser settings. Showing simulated data instead."
            }
            LocationError::PositionUnavailable => {
                "Position information is unavailable. Check your device's location settings. Showing simulated data instead."
            }
            LocationError::Timeout => {
                "Timed out while acquiring the position. Showing simulated data instead."
            }
            LocationError::CapabilityAbsent => {
                "This environment does not support geolocation. Showing simulated data instead."
            }
        }
    }
}

/// Correlates a one-shot request with its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Identifies a continuous watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchId(pub u64);

/// The host's location service.
///
/// Results are delivered back through
/// [`TrackingSession::on_current_fix`] and
/// [`TrackingSession::on_watch_update`] with the id returned here.
pub trait LocationProvider {
    /// Starts a one-shot position request
    fn get_current_fix(
        &mut self,
        options: &PositionOptions,
    ) -> std::result::Result<RequestId, LocationError>;

    /// Starts a continuous watch
    fn watch_fix(&mut self, options: &PositionOptions)
        -> std::result::Result<WatchId, LocationError>;

    fn cancel_watch(&mut self, watch: WatchId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LocationError::from_code(1), LocationError::PermissionDenied);
        assert_eq!(LocationError::from_code(2), LocationError::PositionUnavailable);
        assert_eq!(LocationError::from_code(3), LocationError::Timeout);
        assert_eq!(LocationError::from_code(42), LocationError::PositionUnavailable);
    }

    #[test]
    fn test_advisory_mentions_simulation() {
        for err in [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::CapabilityAbsent,
        ] {
            assert!(err.advisory().contains("simulated"));
        }
    }
}
