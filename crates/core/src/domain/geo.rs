use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Smallest and largest search radius the provider accepts, in meters.
pub const MIN_RADIUS_M: u32 = 1;
pub const MAX_RADIUS_M: u32 = 50_000;

/// A validated WGS84 coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }
}

pub fn validate_radius(radius_m: u32) -> Result<u32, ValidationError> {
    if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius_m) {
        return Err(ValidationError::RadiusOutOfRange(radius_m));
    }
    Ok(radius_m)
}

/// Cache key for an area lookup. The coordinate is rounded to three decimal
/// degrees (~111 m) so nearby clicks within the same cell share an entry.
pub fn area_cache_key(location: &Coordinate, radius_m: u32) -> String {
    format!(
        "area:{}:{}:{}",
        (location.latitude * 1000.0).round() as i64,
        (location.longitude * 1000.0).round() as i64,
        radius_m
    )
}

/// Popularity aggregation key, rounded to two decimal degrees (~1.1 km) —
/// coarser than the area cache on purpose.
pub fn popularity_area_key(location: &Coordinate) -> String {
    format!(
        "pop:{}:{}",
        (location.latitude * 100.0).round() as i64,
        (location.longitude * 100.0).round() as i64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_inclusive_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn coordinate_rejects_out_of_range_latitude() {
        let err = Coordinate::new(90.0001, 0.0).unwrap_err();
        assert!(matches!(err, ValidationError::LatitudeOutOfRange(_)));
    }

    #[test]
    fn coordinate_rejects_out_of_range_longitude() {
        let err = Coordinate::new(0.0, -180.5).unwrap_err();
        assert!(matches!(err, ValidationError::LongitudeOutOfRange(_)));
    }

    #[test]
    fn coordinate_rejects_non_finite_values() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn cache_key_is_stable_within_a_rounding_cell() {
        let a = Coordinate::new(40.7121, -74.0061).unwrap();
        let b = Coordinate::new(40.7124, -74.0058).unwrap();
        assert_eq!(area_cache_key(&a, 3000), area_cache_key(&b, 3000));
    }

    #[test]
    fn cache_key_differs_across_cells_and_radii() {
        let a = Coordinate::new(40.712, -74.006).unwrap();
        let b = Coordinate::new(40.714, -74.006).unwrap();
        assert_ne!(area_cache_key(&a, 3000), area_cache_key(&b, 3000));
        assert_ne!(area_cache_key(&a, 3000), area_cache_key(&a, 1500));
    }

    #[test]
    fn popularity_key_is_coarser_than_cache_key() {
        let a = Coordinate::new(40.712, -74.006).unwrap();
        let b = Coordinate::new(40.714, -74.008).unwrap();
        assert_eq!(popularity_area_key(&a), popularity_area_key(&b));
    }
}
