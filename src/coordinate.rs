//! Immutable geographic coordinate with its precomputed geohash.

use crate::compute::distance::haversine_km;
use crate::compute::geocode::{DEFAULT_PRECISION, encode};
use crate::error::Result;
use geo::Point;
use serde::Serialize;
use std::fmt;

/// A validated latitude/longitude pair and its geohash.
///
/// Two coordinates are the same point for indexing purposes iff their
/// geohashes are equal.
///
/// # Examples
///
/// ```
/// use geocache::Coordinate;
///
/// let nyc = Coordinate::new(40.7128, -74.0060)?;
/// assert_eq!(nyc.hash(), "dr5regw3p");
///
/// assert!(Coordinate::new(120.0, 0.0).is_err());
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
    hash: String,
}

impl Coordinate {
    /// Build a coordinate hashed at [`DEFAULT_PRECISION`].
    ///
    /// Every coordinate shares that precision, so one hash is a prefix of
    /// another only when the two are equal.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let hash = encode(latitude, longitude, DEFAULT_PRECISION)?;
        Ok(Self {
            latitude,
            longitude,
            hash,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The coordinate as a `geo::Point` (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Haversine distance to another coordinate in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Whether both coordinates fall into the same geohash cell.
    pub fn same_cell(&self, other: &Coordinate) -> bool {
        self.hash == other.hash
    }
}

impl TryFrom<Point> for Coordinate {
    type Error = crate::error::GeocacheError;

    fn try_from(point: Point) -> Result<Self> {
        Self::new(point.y(), point.x())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} ({})", self.latitude, self.longitude, self.hash)
    }
}
