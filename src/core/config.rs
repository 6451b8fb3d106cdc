//! Configuration for the synchronization layer
//!
//! Every section has reference defaults matching the demo screens. The
//! simulated feed can be tuned through presets or a custom configuration, and
//! the whole tree can be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        constants::{
            ACCURACY_CIRCLE_SEGMENTS, FIT_BOUNDS_PADDING, HISTORY_CAPACITY, MAX_PITCH,
            RECENTER_ZOOM, REFERENCE_LATITUDE, REFERENCE_LONGITUDE, ROUTE_JITTER_DEG,
            SIMULATION_INTERVAL_MS, SIMULATION_RADIUS_DEG, SIMULATION_STEP_DEG,
            WALKING_SPEED_KMH,
        },
        geo::LatLng,
        style::StyleRef,
        viewport::ViewState,
    },
    MapError, Result,
};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub map: MapConfig,
    pub tracking: TrackingConfig,
    pub simulation: SimulationConfig,
    pub accuracy_circle: AccuracyCircleConfig,
    pub route: RouteConfig,
}

impl SyncConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.history_capacity == 0 {
            return Err(MapError::Config(
                "tracking.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.simulation.interval_ms == 0 {
            return Err(MapError::Config(
                "simulation.interval_ms must be positive".to_string(),
            ));
        }
        if self.accuracy_circle.segments < 3 {
            return Err(MapError::Config(
                "accuracy_circle.segments must be at least 3".to_string(),
            ));
        }
        if self.route.walking_speed_kmh <= 0.0 {
            return Err(MapError::Config(
                "route.walking_speed_kmh must be positive".to_string(),
            ));
        }
        if !self.simulation.base.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "simulation.base {:?}",
                self.simulation.base
            )));
        }
        Ok(())
    }
}

/// Renderer construction defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub style: StyleRef,
    pub initial_view: ViewState,
    pub max_pitch: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: StyleRef::demo(),
            initial_view: ViewState::new(
                LatLng::new(REFERENCE_LATITUDE, REFERENCE_LONGITUDE),
                8.0,
            ),
            max_pitch: MAX_PITCH,
        }
    }
}

/// Options forwarded to the host location capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub history_capacity: usize,
    pub position_options: PositionOptions,
    /// Zoom used when flying to a one-shot fix
    pub recenter_zoom: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            position_options: PositionOptions::default(),
            recenter_zoom: RECENTER_ZOOM,
        }
    }
}

/// Presets for the simulated location feed
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationProfile {
    /// Reference behaviour: 2 s ticks with jittered accuracy and speed
    Reference,
    /// Same trajectory, faster ticks and no jitter
    Steady,
    Custom(SimulationConfig),
}

impl SimulationProfile {
    pub fn resolve(&self) -> SimulationConfig {
        match self {
            Self::Reference => SimulationConfig::default(),
            Self::Steady => SimulationConfig {
                interval_ms: 1000,
                accuracy_jitter_m: 0.0,
                speed_jitter_mps: 0.0,
                ..SimulationConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self::Reference
    }
}

/// Simulated feed parameters. The trajectory is fully determined by
/// `base`, `radius_deg` and `step_deg`; only accuracy and speed are jittered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base: LatLng,
    pub radius_deg: f64,
    pub step_deg: f64,
    pub interval_ms: u64,
    pub accuracy_base_m: f64,
    pub accuracy_jitter_m: f64,
    pub speed_base_mps: f64,
    pub speed_jitter_mps: f64,
    pub altitude_m: f64,
    pub altitude_accuracy_m: f64,
    /// Fix returned by a one-shot request that could not be served
    pub fallback: FallbackFixConfig,
    /// Jitter seed; 0 draws from entropy
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base: LatLng::new(REFERENCE_LATITUDE, REFERENCE_LONGITUDE),
            radius_deg: SIMULATION_RADIUS_DEG,
            step_deg: SIMULATION_STEP_DEG,
            interval_ms: SIMULATION_INTERVAL_MS,
            accuracy_base_m: 10.0,
            accuracy_jitter_m: 5.0,
            speed_base_mps: 5.0,
            speed_jitter_mps: 2.0,
            altitude_m: 40.5,
            altitude_accuracy_m: 10.0,
            fallback: FallbackFixConfig::default(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackFixConfig {
    pub accuracy_m: f64,
    pub altitude_m: f64,
    pub altitude_accuracy_m: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
}

impl Default for FallbackFixConfig {
    fn default() -> Self {
        Self {
            accuracy_m: 15.0,
            altitude_m: 40.5,
            altitude_accuracy_m: 10.0,
            heading_deg: 90.0,
            speed_mps: 4.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyCircleConfig {
    pub segments: usize,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl Default for AccuracyCircleConfig {
    fn default() -> Self {
        Self {
            segments: ACCURACY_CIRCLE_SEGMENTS,
            fill_color: "rgba(63, 81, 181, 0.2)".to_string(),
            stroke_color: "rgba(63, 81, 181, 0.8)".to_string(),
            stroke_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub walking_speed_kmh: f64,
    /// Full width of the midpoint jitter, in degrees
    pub jitter_deg: f64,
    pub fit_padding: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            walking_speed_kmh: WALKING_SPEED_KMH,
            jitter_deg: ROUTE_JITTER_DEG,
            fit_padding: FIT_BOUNDS_PADDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_profile_presets() {
        let reference = SimulationProfile::Reference.resolve();
        let steady = SimulationProfile::Steady.resolve();

        assert_eq!(reference.interval_ms, 2000);
        assert_eq!(reference.step_deg, 10.0);
        assert_eq!(reference.radius_deg, 0.001);

        // Steady keeps the trajectory but drops the jitter
        assert_eq!(steady.base, reference.base);
        assert_eq!(steady.accuracy_jitter_m, 0.0);
        assert_eq!(steady.speed_jitter_mps, 0.0);
        assert!(steady.interval_ms < reference.interval_ms);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SyncConfig::from_json_str(
            r#"{ "route": { "walking_speed_kmh": 5.0 }, "simulation": { "seed": 7 } }"#,
        )
        .unwrap();

        assert_eq!(config.route.walking_speed_kmh, 5.0);
        assert_eq!(config.route.fit_padding, 50.0);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.tracking.history_capacity, 5);
        assert_eq!(config.map.style, StyleRef::demo());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = SyncConfig::from_json_str(r#"{ "tracking": { "history_capacity": 0 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));

        let result = SyncConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(MapError::Serialization(_))));
    }

    #[test]
    fn test_position_options_defaults() {
        let options = PositionOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.maximum_age_ms, 0);
    }
}
