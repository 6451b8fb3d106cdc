//! Core constants taken from the reference demo behaviour.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Mean Earth radius used by the route distance estimate, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Metres per degree of latitude for the equirectangular offsets.
pub const METERS_PER_DEGREE: f64 = 111_111.0;

/// Reference longitude (Tokyo Station area) used for fallback and simulated fixes.
pub const REFERENCE_LONGITUDE: f64 = 139.7634;

/// Reference latitude used for fallback and simulated fixes.
pub const REFERENCE_LATITUDE: f64 = 35.6812;

/// Number of fixes kept in a tracking session's history.
pub const HISTORY_CAPACITY: usize = 5;

/// Radius of the simulated circular trajectory, in degrees.
pub const SIMULATION_RADIUS_DEG: f64 = 0.001;

/// Bearing increment per simulated tick, in degrees.
pub const SIMULATION_STEP_DEG: f64 = 10.0;

/// Period of the simulated tick timer.
pub const SIMULATION_INTERVAL_MS: u64 = 2000;

/// Assumed walking speed for route ETAs.
pub const WALKING_SPEED_KMH: f64 = 4.5;

/// Full width of the perpendicular jitter applied to route midpoints, in degrees.
pub const ROUTE_JITTER_DEG: f64 = 0.01;

/// Fractions along the straight line where placeholder route midpoints sit.
pub const ROUTE_MIDPOINT_FRACTIONS: [f64; 2] = [0.33, 0.66];

/// Segments used to approximate an accuracy circle polygon.
pub const ACCURACY_CIRCLE_SEGMENTS: usize = 64;

/// Zoom used when flying to a one-shot fix.
pub const RECENTER_ZOOM: f64 = 15.0;

/// Padding (pixels) used when fitting a route into view.
pub const FIT_BOUNDS_PADDING: f64 = 50.0;

/// Style that needs no API key.
pub const DEMO_STYLE_URL: &str = "https://demotiles.maplibre.org/style.json";

/// Environment variable holding the MapTiler API key.
pub const MAPTILER_API_KEY_ENV: &str = "MAPTILER_API_KEY";

/// Maximum camera pitch requested at construction.
pub const MAX_PITCH: f64 = 85.0;
