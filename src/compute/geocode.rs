//! Geohash encoding and decoding on top of the `geohash` crate.
//!
//! Encodings are prefix-monotonic: truncating a precision-9 hash to five
//! characters yields the precision-5 hash of the same point. The quadtree
//! relies on this to branch on prefix divergence.

use crate::compute::validation::{validate_lat_lon, validate_precision};
use crate::error::{GeocacheError, Result};
use geo::Rect;

/// Base-32 alphabet used by geohash strings.
pub const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision used for coordinate hashes (~4.8m x 4.8m cells).
pub const DEFAULT_PRECISION: usize = 9;

/// Centre of a decoded geohash cell with its half-extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedHash {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_error: f64,
    pub longitude_error: f64,
}

/// Encode a latitude/longitude pair at the given precision.
///
/// # Examples
///
/// ```
/// use geocache::compute::geocode::encode;
///
/// let hash = encode(40.7128, -74.0060, 9).unwrap();
/// assert_eq!(hash.len(), 9);
/// assert!(hash.starts_with(&encode(40.7128, -74.0060, 5).unwrap()));
/// ```
pub fn encode(latitude: f64, longitude: f64, precision: usize) -> Result<String> {
    validate_lat_lon(latitude, longitude)?;
    validate_precision(precision)?;

    let coord = geohash::Coord {
        x: longitude,
        y: latitude,
    };
    geohash::encode(coord, precision).map_err(|e| {
        log::debug!("geohash encode rejected ({}, {}): {}", latitude, longitude, e);
        GeocacheError::OutOfRangeCoordinate {
            latitude,
            longitude,
        }
    })
}

/// Decode a geohash into the centre of its cell.
pub fn decode(hash: &str) -> Result<DecodedHash> {
    let (center, lon_err, lat_err) = geohash::decode(hash)
        .map_err(|e| GeocacheError::InvalidInput(format!("Invalid geohash '{}': {}", hash, e)))?;

    Ok(DecodedHash {
        latitude: center.y,
        longitude: center.x,
        latitude_error: lat_err,
        longitude_error: lon_err,
    })
}

/// Bounding rectangle of the cell addressed by a geohash prefix.
///
/// The empty prefix addresses the whole world.
pub fn cell_bounds(prefix: &str) -> Result<Rect> {
    if prefix.is_empty() {
        return Ok(Rect::new(
            geo::coord! { x: -180.0, y: -90.0 },
            geo::coord! { x: 180.0, y: 90.0 },
        ));
    }

    geohash::decode_bbox(prefix)
        .map_err(|e| GeocacheError::InvalidInput(format!("Invalid geohash '{}': {}", prefix, e)))
}

/// Length of the common prefix of two geohashes, in characters.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// Whether every character belongs to the geohash alphabet.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.chars().all(|c| GEOHASH_ALPHABET.contains(c))
}
