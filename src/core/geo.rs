use serde::{Deserialize, Serialize};

use crate::core::constants::{EARTH_RADIUS_KM, METERS_PER_DEGREE};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate from GeoJSON `[lng, lat]` order
    pub fn from_lng_lat(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }

    /// Returns the coordinate in GeoJSON `[lng, lat]` order
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Great-circle distance in kilometres using the Haversine formula
    pub fn haversine_km(&self, other: &LatLng) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Linear interpolation in degree space
    pub fn lerp(&self, other: &LatLng, t: f64) -> LatLng {
        LatLng::new(
            self.lat + (other.lat - self.lat) * t,
            self.lng + (other.lng - self.lng) * t,
        )
    }

    /// Moves the coordinate by metres east/north with an equirectangular approximation.
    ///
    /// `Δlat = north / 111111`, `Δlng = east / (111111 · cos(lat))`. Good enough
    /// for accuracy circles of a few hundred metres away from the poles.
    pub fn offset_meters(&self, east: f64, north: f64) -> LatLng {
        let d_lat = north / METERS_PER_DEGREE;
        let d_lng = east / (METERS_PER_DEGREE * self.lat.to_radians().cos());
        LatLng::new(self.lat + d_lat, self.lng + d_lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(35.6812, 139.7634);
        assert_eq!(coord.lat, 35.6812);
        assert_eq!(coord.lng, 139.7634);
        assert!(coord.is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
    }

    #[test]
    fn test_lng_lat_order() {
        let coord = LatLng::from_lng_lat([139.7016, 35.6905]);
        assert_eq!(coord.lat, 35.6905);
        assert_eq!(coord.to_lng_lat(), [139.7016, 35.6905]);
    }

    #[test]
    fn test_haversine_distance() {
        let nyc = LatLng::new(40.7128, -74.0060);
        let la = LatLng::new(34.0522, -118.2437);
        let distance = nyc.haversine_km(&la);

        // Distance should be approximately 3936 km on a 6371 km sphere
        assert!((distance - 3936.0).abs() < 10.0);
        assert_eq!(nyc.haversine_km(&nyc), 0.0);
    }

    #[test]
    fn test_offset_meters() {
        let origin = LatLng::new(0.0, 0.0);
        let moved = origin.offset_meters(111_111.0, 111_111.0);
        assert!((moved.lat - 1.0).abs() < 1e-12);
        assert!((moved.lng - 1.0).abs() < 1e-12);

        // Longitude degrees stretch away from the equator
        let north = LatLng::new(60.0, 0.0).offset_meters(111_111.0, 0.0);
        assert!((north.lng - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = LatLngBounds::from_points(&[
            LatLng::new(35.6812, 139.7671),
            LatLng::new(35.6905, 139.7016),
        ])
        .unwrap();

        assert_eq!(bounds.south_west, LatLng::new(35.6812, 139.7016));
        assert_eq!(bounds.north_east, LatLng::new(35.6905, 139.7671));
        assert!(bounds.contains(&bounds.center()));
        assert!(LatLngBounds::from_points(&[]).is_none());
    }
}
