//! Backing key/value store abstraction
//!
//! The proximity cache keeps one serialized blob per provider key in a
//! store that supports TTLs. Any store with `get`/`put`/`forget` semantics
//! can back it; [`MemoryStore`] is the in-process implementation.

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Trait for TTL-aware key/value stores.
///
/// Implementations are shared between readers and writers, so every method
/// takes `&self`. A failing store should report
/// [`GeocacheError::BackingStoreUnavailable`](crate::GeocacheError::BackingStoreUnavailable).
pub trait BackingStore: Send + Sync {
    /// Get a live value by key
    fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Insert or replace a value that expires after `ttl`
    fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Remove a key, returning whether a live value was removed
    fn forget(&self, key: &str) -> Result<bool>;
}

impl<T: BackingStore + ?Sized> BackingStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        (**self).put(key, value, ttl)
    }

    fn forget(&self, key: &str) -> Result<bool> {
        (**self).forget(key)
    }
}

/// A stored value with its expiry.
#[derive(Debug, Clone)]
pub struct StoredValue {
    pub value: Bytes,
    pub stored_at: SystemTime,
    /// `None` when `stored_at + ttl` is not representable; such values
    /// never expire.
    pub expires_at: Option<SystemTime>,
}

impl StoredValue {
    pub fn new(value: Bytes, now: SystemTime, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    /// Check if this value has expired at a specific time
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Remaining TTL at a specific time; `Duration::MAX` for values that
    /// never expire.
    pub fn remaining_ttl_at(&self, now: SystemTime) -> Duration {
        match self.expires_at {
            Some(expires_at) => expires_at.duration_since(now).unwrap_or(Duration::ZERO),
            None => Duration::MAX,
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys held, including expired ones not yet cleaned up
    pub key_count: usize,
    /// Number of expired keys cleaned up
    pub expired_count: usize,
    /// Number of writes (puts and forgets)
    pub write_count: u64,
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: BTreeMap<String, StoredValue>,
    stats: StoreStats,
}

/// In-memory TTL store.
///
/// Expiry is lazy: expired values are invisible to `get` and are removed by
/// [`MemoryStore::cleanup_expired`] or by being overwritten.
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
            clock,
        }
    }

    /// Remaining TTL of a live key.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.inner
            .read()
            .data
            .get(key)
            .filter(|v| !v.is_expired_at(now))
            .map(|v| v.remaining_ttl_at(now))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.inner
            .read()
            .data
            .values()
            .filter(|v| !v.is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired key, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.write();

        let before = inner.data.len();
        inner.data.retain(|_, v| !v.is_expired_at(now));
        let removed = before - inner.data.len();

        inner.stats.expired_count += removed;
        inner.stats.key_count = inner.data.len();

        if removed > 0 {
            log::debug!("removed {} expired cache entries", removed);
        }
        removed
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            key_count: inner.data.len(),
            ..inner.stats.clone()
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let now = self.clock.now();
        Ok(self
            .inner
            .read()
            .data
            .get(key)
            .filter(|v| !v.is_expired_at(now))
            .map(|v| v.value.clone()))
    }

    fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let item = StoredValue::new(value, self.clock.now(), ttl);
        let mut inner = self.inner.write();
        inner.data.insert(key.to_string(), item);
        inner.stats.write_count += 1;
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let removed = inner.data.remove(key);
        inner.stats.write_count += 1;
        Ok(removed.is_some_and(|v| !v.is_expired_at(now)))
    }
}
