//! Proximity cache over a backing TTL store.

use super::entry::CacheEntry;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::coordinate::Coordinate;
use crate::error::{GeocacheError, Result};
use crate::storage::BackingStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    /// The query's own geohash was cached.
    Exact,
    /// A different cached coordinate lies within the radius.
    Proximity,
}

/// A cached payload together with the hash that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub payload: String,
    pub hash: String,
    pub kind: HitKind,
}

/// Answers coordinate lookups from exact or nearby cached payloads.
///
/// Each provider key maps to one [`CacheEntry`] in the backing store.
/// Inserts are read-modify-write without a compare-and-swap: when two
/// writers merge into the same key concurrently the last write wins and
/// the other coordinate is lost, costing one extra upstream fetch later.
///
/// ```rust
/// use geocache::{Config, Coordinate, MemoryStore, ProximityCache};
///
/// let cache = ProximityCache::new(MemoryStore::new(), Config::default())?;
/// let here = Coordinate::new(-6.401994716099995, 106.79402488730072)?;
/// cache.insert("weather_api", &here, r#"{"temp_c":31}"#, 60)?;
///
/// // ~2 km away, within the default 5 km radius
/// let nearby = Coordinate::new(-6.385, 106.79)?;
/// assert_eq!(cache.lookup("weather_api", &nearby).as_deref(), Some(r#"{"temp_c":31}"#));
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
pub struct ProximityCache<S: BackingStore> {
    store: S,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl<S: BackingStore> ProximityCache<S> {
    /// Create a cache on the system clock.
    ///
    /// # Errors
    ///
    /// Returns `GeocacheError::InvalidConfig` if `config` does not validate.
    pub fn new(store: S, config: Config) -> Result<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate().map_err(GeocacheError::InvalidConfig)?;
        Ok(Self {
            store,
            config,
            clock,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Cached payload for `coordinate` or a coordinate near it.
    pub fn lookup(&self, provider_key: &str, coordinate: &Coordinate) -> Option<String> {
        self.lookup_detailed(provider_key, coordinate)
            .map(|hit| hit.payload)
    }

    /// Like [`ProximityCache::lookup`], reporting how the hit was found.
    ///
    /// Store failures and undecodable entries are logged and reported as a
    /// miss; they never reach the caller.
    pub fn lookup_detailed(&self, provider_key: &str, coordinate: &Coordinate) -> Option<CacheHit> {
        let entry = match self.read_entry(provider_key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                log::debug!("cache miss for {}: no entry", provider_key);
                return None;
            }
            Err(e) => {
                log::warn!("cache lookup for {} degraded to miss: {}", provider_key, e);
                return None;
            }
        };

        if let Some(payload) = entry.payload(coordinate.hash()) {
            log::debug!("exact cache hit for {} at {}", provider_key, coordinate.hash());
            return Some(CacheHit {
                payload: payload.to_string(),
                hash: coordinate.hash().to_string(),
                kind: HitKind::Exact,
            });
        }

        let tree = match entry.tree(&self.config) {
            Ok(tree) => tree,
            Err(e) => {
                log::warn!("unreadable tree for {}, treating as miss: {}", provider_key, e);
                return None;
            }
        };

        let hash = tree.nearest_hash(coordinate, self.config.radius_km)?;
        let payload = entry.payload(&hash)?;

        log::debug!(
            "proximity cache hit for {}: {} answered by {}",
            provider_key,
            coordinate.hash(),
            hash
        );
        Some(CacheHit {
            payload: payload.to_string(),
            hash,
            kind: HitKind::Proximity,
        })
    }

    /// Merge a payload for `coordinate` into the entry for `provider_key`.
    ///
    /// A missing, undecodable or stale entry is rebuilt from scratch with a
    /// fresh `first_cached_at` and a TTL of `ttl_minutes`. Otherwise the
    /// entry is merged and written back with the minutes remaining until
    /// its original deadline.
    pub fn insert(
        &self,
        provider_key: &str,
        coordinate: &Coordinate,
        payload: impl Into<String>,
        ttl_minutes: u64,
    ) -> Result<()> {
        if provider_key.is_empty() {
            return Err(GeocacheError::InvalidInput(
                "Provider key cannot be empty".into(),
            ));
        }
        if ttl_minutes == 0 {
            return Err(GeocacheError::InvalidInput(
                "TTL must be at least one minute".into(),
            ));
        }

        let payload = payload.into();
        let now = self.clock.now();

        let mut entry = match self.read_entry(provider_key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return self.write_fresh(provider_key, coordinate, payload, ttl_minutes, now),
            Err(e) if e.is_decode_failure() => {
                log::warn!("discarding corrupt cache entry {}: {}", provider_key, e);
                self.store.forget(provider_key)?;
                return self.write_fresh(provider_key, coordinate, payload, ttl_minutes, now);
            }
            Err(e) => return Err(e),
        };

        if entry.is_stale(ttl_minutes, now) {
            log::info!(
                "cache entry {} is stale ({} minutes remaining), rebuilding",
                provider_key,
                entry.remaining_ttl_minutes(ttl_minutes, now)
            );
            self.store.forget(provider_key)?;
            return self.write_fresh(provider_key, coordinate, payload, ttl_minutes, now);
        }

        let remaining = entry.remaining_ttl_minutes(ttl_minutes, now);

        match entry.merge(coordinate, payload.clone(), &self.config) {
            Ok(()) => {}
            Err(e) if e.is_decode_failure() => {
                log::warn!("corrupt tree in cache entry {}, rebuilding: {}", provider_key, e);
                self.store.forget(provider_key)?;
                return self.write_fresh(provider_key, coordinate, payload, ttl_minutes, now);
            }
            Err(e) => return Err(e),
        }

        log::debug!(
            "merged {} into {} ({} entries, {} minutes left)",
            coordinate.hash(),
            provider_key,
            entry.cached_hash.len(),
            remaining
        );
        self.store
            .put(provider_key, entry.to_bytes()?, minutes(remaining))
    }

    /// Read and decode the entry for `provider_key`.
    pub fn read_entry(&self, provider_key: &str) -> Result<Option<CacheEntry>> {
        match self.store.get(provider_key)? {
            Some(bytes) => CacheEntry::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write_fresh(
        &self,
        provider_key: &str,
        coordinate: &Coordinate,
        payload: String,
        ttl_minutes: u64,
        now: SystemTime,
    ) -> Result<()> {
        let entry = CacheEntry::fresh(now, coordinate, payload, &self.config)?;
        log::debug!("created cache entry {} at {}", provider_key, coordinate.hash());
        self.store
            .put(provider_key, entry.to_bytes()?, minutes(ttl_minutes))
    }
}

fn minutes<T: TryInto<u64>>(minutes: T) -> Duration {
    Duration::from_secs(minutes.try_into().unwrap_or(0).saturating_mul(60))
}
