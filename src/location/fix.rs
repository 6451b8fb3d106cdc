use serde::{Deserialize, Serialize};

use crate::core::geo::LatLng;

/// One position reading, from the device or the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub longitude: f64,
    pub latitude: f64,
    /// Horizontal accuracy radius in metres
    pub accuracy_m: f64,
    pub altitude_m: Option<f64>,
    pub altitude_accuracy_m: Option<f64>,
    /// Degrees clockwise from north
    pub heading_deg: Option<f64>,
    pub speed_mps: Option<f64>,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub is_simulated: bool,
}

impl GeoFix {
    /// A device reading with only the mandatory fields set
    pub fn new(position: LatLng, accuracy_m: f64, timestamp_ms: i64) -> Self {
        Self {
            longitude: position.lng,
            latitude: position.lat,
            accuracy_m,
            altitude_m: None,
            altitude_accuracy_m: None,
            heading_deg: None,
            speed_mps: None,
            timestamp_ms,
            is_simulated: false,
        }
    }

    pub fn with_altitude(mut self, altitude_m: f64, accuracy_m: Option<f64>) -> Self {
        self.altitude_m = Some(altitude_m);
        self.altitude_accuracy_m = accuracy_m;
        self
    }

    pub fn with_motion(mut self, heading_deg: Option<f64>, speed_mps: Option<f64>) -> Self {
        self.heading_deg = heading_deg;
        self.speed_mps = speed_mps;
        self
    }

    pub fn simulated(mut self) -> Self {
        self.is_simulated = true;
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_mps.map(|mps| mps * 3.6)
    }

    /// Local wall-clock time of the reading, `HH:MM:SS`
    pub fn time_label(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms)
            .map(|utc| {
                utc.with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
