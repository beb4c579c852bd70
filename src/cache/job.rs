//! Deferred cache writes.

use super::store::ProximityCache;
use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::storage::BackingStore;

/// A cache write produced by a fetch, to be applied now or by a worker.
///
/// The job owns everything it needs, so it can be sent to another thread
/// and run against a shared cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheWrite {
    pub cache_key: String,
    pub coordinate: Coordinate,
    pub payload: String,
}

impl CacheWrite {
    pub fn new(
        cache_key: impl Into<String>,
        coordinate: Coordinate,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            cache_key: cache_key.into(),
            coordinate,
            payload: payload.into(),
        }
    }

    /// Apply the write with a lifetime of `ttl_minutes`.
    pub fn run<S: BackingStore>(self, cache: &ProximityCache<S>, ttl_minutes: u64) -> Result<()> {
        log::debug!(
            "running cache write for {} at {}",
            self.cache_key,
            self.coordinate
        );
        cache.insert(&self.cache_key, &self.coordinate, self.payload, ttl_minutes)
    }
}
