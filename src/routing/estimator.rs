//! Placeholder routes: a four-point polyline with a great-circle distance
//! and a walking-pace ETA. Not a road router.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::{
    config::RouteConfig,
    constants::ROUTE_MIDPOINT_FRACTIONS,
    geo::{LatLng, LatLngBounds},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    /// `[lon, lat]` positions: start, two jittered midpoints, end
    pub path: Vec<[f64; 2]>,
    /// Haversine distance between start and end
    pub distance_km: f64,
    pub eta_minutes: u32,
}

impl RouteEstimate {
    pub fn start(&self) -> Option<LatLng> {
        self.path.first().copied().map(LatLng::from_lng_lat)
    }

    pub fn end(&self) -> Option<LatLng> {
        self.path.last().copied().map(LatLng::from_lng_lat)
    }

    /// Box around start and end, what the camera fits to
    pub fn endpoint_bounds(&self) -> Option<LatLngBounds> {
        let (start, end) = (self.start()?, self.end()?);
        LatLngBounds::from_points(&[start, end])
    }
}

/// Estimates a route with the reference walking speed and jitter
pub fn estimate(start: LatLng, end: LatLng) -> RouteEstimate {
    estimate_with(start, end, &RouteConfig::default(), &mut rand::thread_rng())
}

/// Estimates a route drawing midpoint jitter from `rng`
pub fn estimate_with<R: Rng + ?Sized>(
    start: LatLng,
    end: LatLng,
    config: &RouteConfig,
    rng: &mut R,
) -> RouteEstimate {
    let mut path = Vec::with_capacity(ROUTE_MIDPOINT_FRACTIONS.len() + 2);
    path.push(start.to_lng_lat());
    for fraction in ROUTE_MIDPOINT_FRACTIONS {
        let [lng, lat] = start.lerp(&end, fraction).to_lng_lat();
        path.push([
            lng + (rng.gen::<f64>() - 0.5) * config.jitter_deg,
            lat + (rng.gen::<f64>() - 0.5) * config.jitter_deg,
        ]);
    }
    path.push(end.to_lng_lat());

    let distance_km = start.haversine_km(&end);
    RouteEstimate {
        path,
        distance_km,
        eta_minutes: eta_minutes(distance_km, config.walking_speed_kmh),
    }
}

/// Minutes to cover `distance_km` at `speed_kmh`, rounded half away from zero
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    (distance_km / speed_kmh * 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_same_point_route() {
        let tokyo = LatLng::new(35.6812, 139.7671);
        let route = estimate(tokyo, tokyo);

        assert_eq!(route.distance_km, 0.0);
        assert_eq!(route.eta_minutes, 0);
        assert_eq!(route.path.len(), 4);
    }

    #[test]
    fn test_midpoints_stay_within_jitter() {
        let start = LatLng::new(35.6812, 139.7671);
        let end = LatLng::new(35.6905, 139.7016);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..20 {
            let route = estimate_with(start, end, &RouteConfig::default(), &mut rng);
            assert_eq!(route.path[0], start.to_lng_lat());
            assert_eq!(route.path[3], end.to_lng_lat());
            for (point, fraction) in route.path[1..3].iter().zip(ROUTE_MIDPOINT_FRACTIONS) {
                let [lng, lat] = start.lerp(&end, fraction).to_lng_lat();
                assert!((point[0] - lng).abs() <= 0.005 + 1e-9);
                assert!((point[1] - lat).abs() <= 0.005 + 1e-9);
            }
        }
    }

    #[test]
    fn test_eta_rounding() {
        assert_eq!(eta_minutes(4.5, 4.5), 60);
        assert_eq!(eta_minutes(0.06, 4.5), 1);
        assert_eq!(eta_minutes(0.03, 4.5), 0);
    }
}
