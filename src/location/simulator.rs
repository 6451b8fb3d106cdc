//! Deterministic stand-in for a device location feed.
//!
//! Tick `n` (starting at 1) sits on a circle around the configured base:
//! `lon = base_lon + r·cos(n·step)`, `lat = base_lat + r·sin(n·step)`.
//! Accuracy and speed get uniform jitter from a seedable generator.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    core::{config::SimulationConfig, geo::LatLng},
    location::fix::{now_millis, GeoFix},
};

/// A seed of 0 draws from system entropy; anything else is reproducible
pub fn seeded_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

/// Uniform jitter with reproducible seeding
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    pub fn new(seed: u64) -> Self {
        Self { rng: seeded_rng(seed) }
    }

    /// Uniform sample in `[0, width)`
    pub fn uniform(&mut self, width: f64) -> f64 {
        if width == 0.0 {
            return 0.0;
        }
        self.rng.gen::<f64>() * width
    }

    /// Uniform sample in `[-width/2, width/2)`
    pub fn centered(&mut self, width: f64) -> f64 {
        self.uniform(width) - width / 2.0
    }
}

pub struct SimulatedFeed {
    config: SimulationConfig,
    tick: u64,
    jitter: Jitter,
}

impl SimulatedFeed {
    pub fn new(config: SimulationConfig) -> Self {
        let jitter = Jitter::new(config.seed);
        Self {
            config,
            tick: 0,
            jitter,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks produced since the last reset
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Restarts the trajectory from tick 1
    pub fn reset(&mut self) {
        self.tick = 0;
    }

    /// Bearing of tick `n` in degrees
    pub fn heading_at(&self, tick: u64) -> f64 {
        (tick as f64 * self.config.step_deg) % 360.0
    }

    /// Closed-form position of tick `n`
    pub fn position_at(&self, tick: u64) -> LatLng {
        let angle = tick as f64 * self.config.step_deg * (std::f64::consts::PI / 180.0);
        LatLng::new(
            self.config.base.lat + self.config.radius_deg * angle.sin(),
            self.config.base.lng + self.config.radius_deg * angle.cos(),
        )
    }

    /// Advances one tick and produces its fix
    pub fn next_fix(&mut self) -> GeoFix {
        self.tick += 1;
        let config = &self.config;
        let accuracy = config.accuracy_base_m + self.jitter.uniform(config.accuracy_jitter_m);
        let speed = config.speed_base_mps + self.jitter.uniform(config.speed_jitter_mps);

        GeoFix::new(self.position_at(self.tick), accuracy, now_millis())
            .with_altitude(config.altitude_m, Some(config.altitude_accuracy_m))
            .with_motion(Some(self.heading_at(self.tick)), Some(speed))
            .simulated()
    }

    /// Fixed reading used when a one-shot request cannot be served
    pub fn fallback_fix(&self) -> GeoFix {
        let fallback = &self.config.fallback;
        GeoFix::new(self.config.base, fallback.accuracy_m, now_millis())
            .with_altitude(fallback.altitude_m, Some(fallback.altitude_accuracy_m))
            .with_motion(Some(fallback.heading_deg), Some(fallback.speed_mps))
            .simulated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut a = Jitter::new(42);
        let mut b = Jitter::new(42);
        for _ in 0..50 {
            assert_eq!(a.uniform(5.0), b.uniform(5.0));
        }
    }

    #[test]
    fn test_seeded_rng_matches_jitter() {
        let mut rng = seeded_rng(9);
        let mut jitter = Jitter::new(9);
        assert_eq!(rng.gen::<f64>() * 2.0, jitter.uniform(2.0));
    }

    #[test]
    fn test_zero_width() {
        let mut jitter = Jitter::new(7);
        assert_eq!(jitter.uniform(0.0), 0.0);
    }

    #[test]
    fn test_tick_nine_is_due_north() {
        let feed = SimulatedFeed::new(SimulationConfig::default());
        let base = feed.config().base;
        let pos = feed.position_at(9);

        assert!((pos.lat - (base.lat + 0.001)).abs() < 1e-12);
        assert!((pos.lng - base.lng).abs() < 1e-12);
        assert_eq!(feed.heading_at(9), 90.0);
        assert_eq!(feed.heading_at(36), 0.0);
    }

    #[test]
    fn test_fix_ranges() {
        let mut feed = SimulatedFeed::new(SimulationConfig {
            seed: 3,
            ..SimulationConfig::default()
        });
        for n in 1..=40 {
            let fix = feed.next_fix();
            assert_eq!(feed.tick(), n);
            assert!(fix.is_simulated);
            assert!((10.0..15.0).contains(&fix.accuracy_m));
            assert!(fix.speed_mps.map_or(false, |s| (5.0..7.0).contains(&s)));
            assert_eq!(fix.altitude_m, Some(40.5));
            assert_eq!(fix.altitude_accuracy_m, Some(10.0));
        }
    }

    #[test]
    fn test_fallback_fix() {
        let feed = SimulatedFeed::new(SimulationConfig::default());
        let fix = feed.fallback_fix();

        assert_eq!(fix.position(), LatLng::new(35.6812, 139.7634));
        assert_eq!(fix.accuracy_m, 15.0);
        assert_eq!(fix.heading_deg, Some(90.0));
        assert_eq!(fix.speed_mps, Some(4.2));
        assert!(fix.is_simulated);
    }
}
