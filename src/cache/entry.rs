//! The persisted cache envelope.
//!
//! One entry exists per provider key. It is stored as JSON:
//!
//! ```text
//! {
//!   "first_cached_at": 1700000000,
//!   "serialized_root_tree": [71, 81, 84, ...],
//!   "cached_hash": { "qqggw4t19": "<payload>", ... }
//! }
//! ```

use crate::config::Config;
use crate::coordinate::Coordinate;
use crate::error::{GeocacheError, Result};
use crate::quadtree::QuadTree;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix timestamp (seconds) of the write that created the entry
    pub first_cached_at: i64,
    /// Framed tree bytes, see [`crate::quadtree::codec`]
    pub serialized_root_tree: Vec<u8>,
    /// Geohash -> opaque payload
    pub cached_hash: BTreeMap<String, String>,
}

impl CacheEntry {
    /// Entry holding a single coordinate and its payload.
    pub fn fresh(
        now: SystemTime,
        coordinate: &Coordinate,
        payload: String,
        config: &Config,
    ) -> Result<Self> {
        let mut tree = config.tune_tree(QuadTree::new());
        tree.insert(coordinate);

        let mut cached_hash = BTreeMap::new();
        cached_hash.insert(coordinate.hash().to_string(), payload);

        Ok(Self {
            first_cached_at: unix_seconds(now),
            serialized_root_tree: tree.to_bytes()?,
            cached_hash,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| GeocacheError::DecodeFailure(format!("cache envelope: {}", e)))
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode the stored tree with the configured budget and pruning.
    pub fn tree(&self, config: &Config) -> Result<QuadTree> {
        QuadTree::from_bytes(&self.serialized_root_tree).map(|tree| config.tune_tree(tree))
    }

    pub fn payload(&self, hash: &str) -> Option<&str> {
        self.cached_hash.get(hash).map(String::as_str)
    }

    /// Insert a coordinate into the stored tree and record its payload.
    ///
    /// A later payload for the same geohash replaces the earlier one.
    pub fn merge(&mut self, coordinate: &Coordinate, payload: String, config: &Config) -> Result<()> {
        let mut tree = self.tree(config)?;
        tree.insert(coordinate);

        self.serialized_root_tree = tree.to_bytes()?;
        self.cached_hash.insert(coordinate.hash().to_string(), payload);
        Ok(())
    }

    /// Whole minutes elapsed since the entry was created; negative when
    /// `first_cached_at` lies in the future. Saturates for corrupt
    /// timestamps.
    pub fn minutes_since_first_cached(&self, now: SystemTime) -> i64 {
        unix_seconds(now).saturating_sub(self.first_cached_at) / 60
    }

    /// Minutes left until the entry's original deadline.
    pub fn remaining_ttl_minutes(&self, ttl_minutes: u64, now: SystemTime) -> i64 {
        ttl_as_i64(ttl_minutes).saturating_sub(self.minutes_since_first_cached(now))
    }

    /// Whether the entry must be discarded and rebuilt rather than merged.
    ///
    /// Stale when less than a minute remains, or when more than the full
    /// lifetime remains (clock skew or a corrupt timestamp).
    pub fn is_stale(&self, ttl_minutes: u64, now: SystemTime) -> bool {
        // More than the full lifetime remaining <=> negative elapsed time
        self.minutes_since_first_cached(now) < 0
            || self.remaining_ttl_minutes(ttl_minutes, now) < 1
    }
}

fn ttl_as_i64(ttl_minutes: u64) -> i64 {
    i64::try_from(ttl_minutes).unwrap_or(i64::MAX)
}

/// Seconds since the Unix epoch, negative for earlier times.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}
