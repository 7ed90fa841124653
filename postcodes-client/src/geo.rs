//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean radius of the Earth in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point. No range checks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Longitude first, matching the API's `lon`/`lat` parameter order.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Neither component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

/// Great-circle distance between two points in kilometres (Haversine).
///
/// # Examples
///
/// ```
/// use postcodes_client::geo::{Coordinate, haversine_km};
///
/// let poole = Coordinate::new(-1.93115910963689, 50.7299678681388);
/// let portland = Coordinate::new(-2.42684168122331, 50.647813093741);
/// assert_eq!(haversine_km(poole, portland) as i64, 36);
/// ```
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finiteness() {
        assert!(Coordinate::new(-1.9, 50.7).is_finite());
        assert!(!Coordinate::new(f64::NAN, 50.7).is_finite());
        assert!(!Coordinate::new(0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn known_distance() {
        let poole = Coordinate::new(-1.93115910963689, 50.7299678681388);
        let portland = Coordinate::new(-2.42684168122331, 50.647813093741);
        let d = haversine_km(poole, portland);
        assert_eq!(d.trunc() as i64, 36);
    }

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(0.629834723775309, 51.7923246977375);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(180.0, 0.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((haversine_km(a, b) - half).abs() < 1e-6);
    }
}
