//! Error types for the proximity cache.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GeocacheError>;

#[derive(Debug, Error)]
pub enum GeocacheError {
    /// Latitude/longitude outside the valid WGS84 range (or not finite).
    #[error("Coordinate out of range: latitude {latitude}, longitude {longitude}")]
    OutOfRangeCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored envelope or tree bytes could not be decoded.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Backing store unavailable: {0}")]
    BackingStoreUnavailable(String),

    #[error("Weather provider not registered: {0}")]
    ProviderNotFound(String),

    /// An upstream provider failed to produce a payload.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GeocacheError {
    /// Whether this error is recovered locally by the cache (miss / rebuild).
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, GeocacheError::DecodeFailure(_))
    }
}
