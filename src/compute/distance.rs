//! Great-circle distance and degree conversions.

use geo::{Distance, HaversineMeasure, Point};

/// Mean Earth radius in kilometres used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const SPHERE: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0);

/// Kilometres spanned by one degree of latitude on a sphere of [`EARTH_RADIUS_KM`].
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Haversine distance between two latitude/longitude pairs, in kilometres.
///
/// # Examples
///
/// ```
/// use geocache::compute::distance::haversine_km;
///
/// let d = haversine_km(40.7128, -74.0060, 34.0522, -118.2437);
/// assert!((d - 3935.7).abs() < 5.0);
/// ```
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    SPHERE.distance(Point::new(lon1, lat1), Point::new(lon2, lat2)) / 1000.0
}

/// Degrees of latitude and longitude that cover `radius_km` around `latitude`.
///
/// The longitude span widens towards the poles; once it exceeds a full
/// turn it is clamped to 360 degrees.
pub fn radius_in_degrees(radius_km: f64, latitude: f64) -> (f64, f64) {
    let lat_deg = radius_km / KM_PER_DEGREE;

    // Widest parallel the radius can reach.
    let extreme_lat = (latitude.abs() + lat_deg).min(90.0);
    let cos = extreme_lat.to_radians().cos();

    let lon_deg = if cos <= f64::EPSILON {
        360.0
    } else {
        (lat_deg / cos).min(360.0)
    };

    (lat_deg, lon_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_km(10.0, 20.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn test_known_distances() {
        // London -> Paris ~343.5 km
        let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 343.5).abs() < 1.0, "got {}", d);

        // One degree of latitude
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        let a = haversine_km(-6.401994716099995, 106.79402488730072, -6.356400295925741, 106.72704406220986);
        let b = haversine_km(-6.356400295925741, 106.72704406220986, -6.401994716099995, 106.79402488730072);
        assert!((a - b).abs() < 1e-12);
        assert!(a > 8.0 && a < 10.0, "got {}", a);
    }

    #[test]
    fn test_radius_in_degrees() {
        let (lat, lon) = radius_in_degrees(KM_PER_DEGREE, 0.0);
        assert!((lat - 1.0).abs() < 1e-12);
        assert!(lon >= 1.0);

        let (_, lon) = radius_in_degrees(10.0, 60.0);
        assert!(lon > 10.0 / KM_PER_DEGREE * 1.9);

        let (_, lon) = radius_in_degrees(10.0, 90.0);
        assert_eq!(lon, 360.0);
    }
}
