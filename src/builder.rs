//! Builder for proximity caches
//!
//! Collects configuration and a time source, then produces a
//! [`ProximityCache`] over either an in-memory store or a caller-supplied
//! [`BackingStore`].

use crate::cache::ProximityCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{GeocacheError, Result};
use crate::storage::{BackingStore, MemoryStore};
use std::sync::Arc;

/// Builder for cache configuration.
///
/// ```rust
/// use geocache::{CacheBuilder, Config};
/// use geocache::clock::ManualClock;
/// use std::sync::Arc;
///
/// let clock = ManualClock::new();
/// let cache = CacheBuilder::new()
///     .config(Config::default().with_radius_km(2.0))
///     .clock(Arc::new(clock.clone()))
///     .build()?;
///
/// assert_eq!(cache.config().radius_km, 2.0);
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
pub struct CacheBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
}

impl CacheBuilder {
    /// Create a new builder with the default configuration and system clock.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the cache configuration (radius, lifetime, tree tuning).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn radius_km(mut self, radius_km: f64) -> Self {
        self.config = self.config.with_radius_km(radius_km);
        self
    }

    pub fn lifetime_minutes(mut self, minutes: u64) -> Self {
        self.config = self.config.with_lifetime_minutes(minutes);
        self
    }

    /// Time source for TTL accounting, shared with the in-memory store.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration without building.
    pub fn validate(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(GeocacheError::InvalidConfig)
    }

    /// Build over a caller-supplied store.
    pub fn build_with<S: BackingStore>(self, store: S) -> Result<ProximityCache<S>> {
        self.validate()?;
        log::debug!(
            "building proximity cache: radius {} km, lifetime {} min",
            self.config.radius_km,
            self.config.lifetime_minutes
        );
        ProximityCache::with_clock(store, self.config, self.clock)
    }

    /// Build over an in-memory store sharing this builder's clock.
    pub fn build(self) -> Result<ProximityCache<MemoryStore>> {
        let store = MemoryStore::with_clock(Arc::clone(&self.clock));
        self.build_with(store)
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
