//! Pure computations shared by the index and the cache.
//!
//! - Geohash encoding/decoding
//! - Great-circle distance
//! - Coordinate and parameter validation

pub mod distance;
pub mod geocode;
pub mod validation;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use geocode::{DEFAULT_PRECISION, cell_bounds, common_prefix_len, decode, encode};
