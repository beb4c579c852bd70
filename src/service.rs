//! Read-through weather lookups.
//!
//! [`WeatherService`] answers from the proximity cache when it can and
//! falls back to the provider otherwise, writing the fetched payload back
//! so nearby queries are served from cache afterwards.

use crate::cache::{CacheWrite, HitKind, ProximityCache};
use crate::config::Config;
use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::provider::ProviderRegistry;
use crate::storage::BackingStore;
use std::sync::Arc;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Exact,
    Proximity,
    Fetched,
}

impl From<HitKind> for Source {
    fn from(kind: HitKind) -> Self {
        match kind {
            HitKind::Exact => Source::Exact,
            HitKind::Proximity => Source::Proximity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub payload: String,
    pub source: Source,
}

impl Lookup {
    pub fn is_cached(&self) -> bool {
        self.source != Source::Fetched
    }
}

/// Outcome of a warm-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmStats {
    pub hits: usize,
    pub fetched: usize,
    pub failed: usize,
}

impl WarmStats {
    pub fn total(&self) -> usize {
        self.hits + self.fetched + self.failed
    }
}

/// Weather lookups through a proximity cache.
///
/// ```rust
/// use geocache::provider::{FnProvider, ProviderRegistry};
/// use geocache::service::{Source, WeatherService};
/// use geocache::{CacheBuilder, Coordinate};
/// use std::sync::Arc;
///
/// let registry = Arc::new(ProviderRegistry::new());
/// registry.register(
///     "weather_api",
///     Arc::new(FnProvider::new("weather_api", |_: &Coordinate| Ok("{\"temp_c\":28}".to_string()))),
///     false,
/// );
///
/// let service = WeatherService::new(registry, Arc::new(CacheBuilder::new().build()?));
/// let jakarta = Coordinate::new(-6.2088, 106.8456)?;
///
/// assert_eq!(service.current(&jakarta)?.source, Source::Fetched);
/// assert_eq!(service.current(&jakarta)?.source, Source::Exact);
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
pub struct WeatherService<S: BackingStore> {
    registry: Arc<ProviderRegistry>,
    cache: Arc<ProximityCache<S>>,
}

impl<S: BackingStore> WeatherService<S> {
    pub fn new(registry: Arc<ProviderRegistry>, cache: Arc<ProximityCache<S>>) -> Self {
        Self { registry, cache }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ProximityCache<S> {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        self.cache.config()
    }

    /// Current weather from the default provider.
    pub fn current(&self, coordinate: &Coordinate) -> Result<Lookup> {
        let provider = self.config().default_provider.clone();
        self.current_with(&provider, coordinate)
    }

    /// Current weather from the provider registered as `provider_key`.
    ///
    /// A failed cache write after a successful fetch is logged; the
    /// fetched payload is still returned.
    pub fn current_with(&self, provider_key: &str, coordinate: &Coordinate) -> Result<Lookup> {
        let provider = self.registry.get(provider_key)?;
        let cache_key = provider.cache_key();

        if let Some(hit) = self.cache.lookup_detailed(cache_key, coordinate) {
            return Ok(Lookup {
                payload: hit.payload,
                source: hit.kind.into(),
            });
        }

        log::debug!("cache miss for {} at {}, fetching", cache_key, coordinate);
        let payload = provider.fetch(coordinate)?;

        let job = CacheWrite::new(cache_key, coordinate.clone(), payload.clone());
        if let Err(e) = job.run(&self.cache, self.config().lifetime_minutes) {
            log::warn!("failed to cache payload for {}: {}", cache_key, e);
        }

        Ok(Lookup {
            payload,
            source: Source::Fetched,
        })
    }

    /// Resolve every coordinate through the default provider so later
    /// lookups nearby hit the cache.
    pub fn warm<'a, I>(&self, coordinates: I) -> Result<WarmStats>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let provider = self.config().default_provider.clone();
        self.warm_with(&provider, coordinates)
    }

    /// Like [`WeatherService::warm`] for a named provider.
    ///
    /// Fails only if the provider is unknown; per-coordinate failures are
    /// logged and counted.
    pub fn warm_with<'a, I>(&self, provider_key: &str, coordinates: I) -> Result<WarmStats>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        self.registry.get(provider_key)?;

        let mut stats = WarmStats::default();
        for coordinate in coordinates {
            match self.current_with(provider_key, coordinate) {
                Ok(lookup) if lookup.is_cached() => stats.hits += 1,
                Ok(_) => stats.fetched += 1,
                Err(e) => {
                    log::warn!("warm-up failed for {}: {}", coordinate, e);
                    stats.failed += 1;
                }
            }
        }

        log::info!(
            "warmed {} cache: {} hits, {} fetched, {} failed",
            provider_key,
            stats.hits,
            stats.fetched,
            stats.failed
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocacheError;
    use crate::provider::WeatherProvider;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WeatherProvider for CountingProvider {
        fn cache_key(&self) -> &str {
            "weather_api"
        }

        fn fetch(&self, coordinate: &Coordinate) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if coordinate.latitude() > 80.0 {
                return Err(GeocacheError::Fetch("no coverage".into()));
            }
            Ok(format!("weather@{}", coordinate.hash()))
        }
    }

    fn service(provider: Arc<CountingProvider>) -> WeatherService<MemoryStore> {
        let registry = Arc::new(ProviderRegistry::new());
        registry.register("weather_api", provider, false);
        let cache = ProximityCache::new(MemoryStore::new(), Config::default()).unwrap();
        WeatherService::new(registry, Arc::new(cache))
    }

    #[test]
    fn test_fetch_then_cache_hits() {
        let provider = CountingProvider::new();
        let service = service(Arc::clone(&provider));

        let a = Coordinate::new(-6.401994716099995, 106.79402488730072).unwrap();
        let first = service.current(&a).unwrap();
        assert_eq!(first.source, Source::Fetched);
        assert_eq!(first.payload, "weather@qqggw4t19");

        let second = service.current(&a).unwrap();
        assert_eq!(second.source, Source::Exact);
        assert_eq!(second.payload, first.payload);

        let nearby = Coordinate::new(-6.385, 106.79).unwrap();
        let third = service.current(&nearby).unwrap();
        assert_eq!(third.source, Source::Proximity);
        assert_eq!(third.payload, first.payload);

        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_fetch_error_propagates() {
        let provider = CountingProvider::new();
        let service = service(Arc::clone(&provider));

        let arctic = Coordinate::new(85.0, 0.0).unwrap();
        assert!(matches!(service.current(&arctic), Err(GeocacheError::Fetch(_))));
        assert!(service.cache().lookup("weather_api", &arctic).is_none());
    }

    #[test]
    fn test_unknown_provider() {
        let service = service(CountingProvider::new());
        let c = Coordinate::new(0.0, 0.0).unwrap();
        assert!(matches!(
            service.current_with("openweathermap", &c),
            Err(GeocacheError::ProviderNotFound(_))
        ));
        assert!(service.warm_with("openweathermap", [&c]).is_err());
    }

    #[test]
    fn test_warm_counts_outcomes() {
        let provider = CountingProvider::new();
        let service = service(Arc::clone(&provider));

        let coordinates = vec![
            Coordinate::new(40.7128, -74.0060).unwrap(),
            Coordinate::new(40.7130, -74.0055).unwrap(),
            Coordinate::new(51.5074, -0.1278).unwrap(),
            Coordinate::new(85.0, 10.0).unwrap(),
        ];

        let stats = service.warm(&coordinates).unwrap();
        assert_eq!(
            stats,
            WarmStats {
                hits: 1,
                fetched: 2,
                failed: 1
            }
        );
        assert_eq!(stats.total(), 4);
        assert_eq!(provider.calls(), 3);

        let again = service.warm(&coordinates[..3]).unwrap();
        assert_eq!(again.hits, 3);
        assert_eq!(provider.calls(), 3);
    }
}
