//! Upstream weather providers and the registry that selects between them.
//!
//! The HTTP clients themselves live outside this crate. A provider only
//! has to name the cache key its payloads are stored under and produce an
//! opaque payload for a coordinate.

use crate::coordinate::Coordinate;
use crate::error::{GeocacheError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Source of weather payloads for a coordinate.
pub trait WeatherProvider: Send + Sync {
    /// Backing store key holding this provider's cache entry.
    fn cache_key(&self) -> &str;

    /// Fetch the current payload for `coordinate`.
    ///
    /// Failures should be reported as [`GeocacheError::Fetch`].
    fn fetch(&self, coordinate: &Coordinate) -> Result<String>;
}

/// Provider backed by a closure.
///
/// ```rust
/// use geocache::provider::{FnProvider, WeatherProvider};
/// use geocache::Coordinate;
///
/// let provider = FnProvider::new("static", |c: &Coordinate| Ok(format!("{{\"lat\":{}}}", c.latitude())));
/// let payload = provider.fetch(&Coordinate::new(1.5, 2.0)?)?;
/// assert_eq!(payload, "{\"lat\":1.5}");
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
pub struct FnProvider<F> {
    cache_key: String,
    fetch: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&Coordinate) -> Result<String> + Send + Sync,
{
    pub fn new(cache_key: impl Into<String>, fetch: F) -> Self {
        Self {
            cache_key: cache_key.into(),
            fetch,
        }
    }
}

impl<F> WeatherProvider for FnProvider<F>
where
    F: Fn(&Coordinate) -> Result<String> + Send + Sync,
{
    fn cache_key(&self) -> &str {
        &self.cache_key
    }

    fn fetch(&self, coordinate: &Coordinate) -> Result<String> {
        (self.fetch)(coordinate)
    }
}

impl<F> fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider")
            .field("cache_key", &self.cache_key)
            .finish_non_exhaustive()
    }
}

/// Named providers, safe to share between threads.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<BTreeMap<String, Arc<dyn WeatherProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `key`.
    ///
    /// An existing registration is only replaced when `override_existing`
    /// is set. Returns whether `provider` was stored.
    pub fn register(
        &self,
        key: impl Into<String>,
        provider: Arc<dyn WeatherProvider>,
        override_existing: bool,
    ) -> bool {
        let key = key.into();
        let mut providers = self.providers.write();

        if providers.contains_key(&key) && !override_existing {
            log::debug!("provider {} already registered, keeping existing", key);
            return false;
        }

        log::debug!("registered provider {}", key);
        providers.insert(key, provider);
        true
    }

    pub fn has(&self, key: &str) -> bool {
        self.providers.read().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn WeatherProvider>> {
        self.providers
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| GeocacheError::ProviderNotFound(key.to_string()))
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    pub fn all(&self) -> Vec<(String, Arc<dyn WeatherProvider>)> {
        self.providers
            .read()
            .iter()
            .map(|(key, provider)| (key.clone(), Arc::clone(provider)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
