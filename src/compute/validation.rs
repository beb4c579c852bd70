//! Validation for geographic coordinates and cache parameters.

use crate::error::{GeocacheError, Result};

/// Validates a latitude/longitude pair.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geocache::compute::validation::validate_lat_lon;
///
/// assert!(validate_lat_lon(40.7128, -74.0060).is_ok());
///
/// // Invalid latitude
/// assert!(validate_lat_lon(95.0, -74.0).is_err());
///
/// // Invalid longitude
/// assert!(validate_lat_lon(40.0, 200.0).is_err());
/// ```
pub fn validate_lat_lon(latitude: f64, longitude: f64) -> Result<()> {
    let in_range = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);

    if !in_range {
        return Err(GeocacheError::OutOfRangeCoordinate {
            latitude,
            longitude,
        });
    }

    Ok(())
}

/// Validates a geohash precision (1-12 characters).
pub fn validate_precision(precision: usize) -> Result<()> {
    if !(1..=12).contains(&precision) {
        return Err(GeocacheError::InvalidInput(format!(
            "Geohash precision must be between 1 and 12, got: {}",
            precision
        )));
    }
    Ok(())
}

/// Validates a search radius in kilometres.
pub fn validate_radius_km(radius_km: f64) -> Result<()> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeocacheError::InvalidInput(format!(
            "Radius must be finite and non-negative, got: {}",
            radius_km
        )));
    }
    Ok(())
}
