use geocache::clock::ManualClock;
use geocache::quadtree::Quadrant;
use geocache::{
    BackingStore, CacheBuilder, Config, Coordinate, FnProvider, HitKind, MemoryStore,
    ProviderRegistry, ProximityCache, Source, WeatherService,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

const KEY: &str = "weather_api";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn point_a() -> Coordinate {
    Coordinate::new(-6.401994716099995, 106.79402488730072).unwrap()
}

fn point_b() -> Coordinate {
    Coordinate::new(-6.356400295925741, 106.72704406220986).unwrap()
}

#[test]
fn test_two_point_scenario() {
    init_logging();
    let cache = CacheBuilder::new().build().unwrap();

    cache.insert(KEY, &point_a(), "payload-a", 60).unwrap();
    cache.insert(KEY, &point_b(), "payload-b", 60).unwrap();

    let entry = cache.read_entry(KEY).unwrap().unwrap();
    assert_eq!(entry.cached_hash.len(), 2);

    let tree = entry.tree(cache.config()).unwrap();
    let root = tree.root().unwrap();
    assert!(root.branch);
    assert_eq!(root.hash, "qqgg");
    assert_eq!(root.latitude, point_b().latitude());
    assert_eq!(root.child(Quadrant::NW).unwrap().hash, "qqggudu72");
    assert_eq!(root.child(Quadrant::NE).unwrap().hash, "qqggw4t19");

    // B is its own nearest hash, not the branch prefix
    assert_eq!(tree.nearest_hash(&point_b(), 5.0).as_deref(), Some("qqggudu72"));

    let hit = cache.lookup_detailed(KEY, &point_b()).unwrap();
    assert_eq!(hit.kind, HitKind::Exact);
    assert_eq!(hit.payload, "payload-b");
}

#[test]
fn test_every_cached_coordinate_finds_itself() {
    let cache = CacheBuilder::new().build().unwrap();
    let cities = [
        (40.7128, -74.0060),
        (51.5074, -0.1278),
        (48.8566, 2.3522),
        (35.6762, 139.6503),
        (-33.8688, 151.2093),
        (55.7558, 37.6173),
        (-6.401994716099995, 106.79402488730072),
        (-6.356400295925741, 106.72704406220986),
    ];

    for (i, (lat, lon)) in cities.iter().enumerate() {
        let c = Coordinate::new(*lat, *lon).unwrap();
        cache.insert(KEY, &c, format!("city-{}", i), 60).unwrap();
    }

    let tree = cache
        .read_entry(KEY)
        .unwrap()
        .unwrap()
        .tree(cache.config())
        .unwrap();

    for (i, (lat, lon)) in cities.iter().enumerate() {
        let c = Coordinate::new(*lat, *lon).unwrap();
        assert_eq!(tree.nearest_hash(&c, 5.0).as_deref(), Some(c.hash()));
        assert_eq!(cache.lookup(KEY, &c), Some(format!("city-{}", i)));
    }
}

#[test]
fn test_proximity_hits_respect_radius() {
    let cache = CacheBuilder::new().radius_km(2.0).build().unwrap();
    let anchor = Coordinate::new(52.5200, 13.4050).unwrap();
    cache.insert(KEY, &anchor, "berlin", 60).unwrap();

    for step in 0..40 {
        let offset = step as f64 * 0.002;
        let query = Coordinate::new(52.5200 + offset, 13.4050).unwrap();
        let distance = anchor.distance_km(&query);

        match cache.lookup_detailed(KEY, &query) {
            Some(hit) => {
                assert!(distance <= 2.0, "hit at {:.3} km", distance);
                assert_eq!(hit.payload, "berlin");
            }
            None => assert!(distance > 2.0, "miss at {:.3} km", distance),
        }
    }
}

#[test]
fn test_entry_lifetime_is_anchored_at_first_write() {
    init_logging();
    let clock = ManualClock::new();
    let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
    let cache = CacheBuilder::new()
        .clock(Arc::new(clock.clone()))
        .build_with(Arc::clone(&store))
        .unwrap();

    cache.insert(KEY, &point_a(), "a", 60).unwrap();
    clock.advance_minutes(45);
    cache.insert(KEY, &point_b(), "b", 60).unwrap();
    assert_eq!(store.remaining_ttl(KEY), Some(Duration::from_secs(15 * 60)));

    clock.advance_minutes(15);
    assert!(cache.lookup(KEY, &point_a()).is_none());
    assert!(cache.lookup(KEY, &point_b()).is_none());

    // A new write starts a new lifetime
    cache.insert(KEY, &point_b(), "b2", 60).unwrap();
    assert_eq!(store.remaining_ttl(KEY), Some(Duration::from_secs(3600)));
    assert!(cache.lookup(KEY, &point_a()).is_none());
}

#[test]
fn test_provider_keys_are_isolated() {
    let cache = CacheBuilder::new().build().unwrap();
    cache.insert("weather_api", &point_a(), "from-weather-api", 60).unwrap();
    cache.insert("openweathermap", &point_a(), "from-owm", 60).unwrap();

    assert_eq!(
        cache.lookup("weather_api", &point_a()).as_deref(),
        Some("from-weather-api")
    );
    assert_eq!(
        cache.lookup("openweathermap", &point_a()).as_deref(),
        Some("from-owm")
    );
    assert_eq!(cache.store().len(), 2);
}

#[test]
fn test_concurrent_writers_on_separate_keys() {
    let cache = Arc::new(CacheBuilder::new().build().unwrap());
    let mut handles = Vec::new();

    for worker in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            let key = format!("provider-{}", worker);
            for i in 0..10 {
                let c = Coordinate::new(10.0 * worker as f64, i as f64).unwrap();
                cache.insert(&key, &c, format!("{}-{}", worker, i), 60).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for worker in 0..4 {
        let key = format!("provider-{}", worker);
        let entry = cache.read_entry(&key).unwrap().unwrap();
        assert_eq!(entry.cached_hash.len(), 10);
    }
}

#[test]
fn test_weather_service_read_through() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ProviderRegistry::new());
    {
        let calls = Arc::clone(&calls);
        registry.register(
            "weather_api",
            Arc::new(FnProvider::new("weather_api", move |c: &Coordinate| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("{{\"hash\":\"{}\"}}", c.hash()))
            })),
            false,
        );
    }

    let cache: ProximityCache<MemoryStore> = CacheBuilder::new()
        .config(Config::default().with_lifetime_minutes(30))
        .build().unwrap();
    let service = WeatherService::new(registry, Arc::new(cache));

    let first = service.current(&point_a()).unwrap();
    assert_eq!(first.source, Source::Fetched);

    let near_a = Coordinate::new(-6.385, 106.79).unwrap();
    let second = service.current(&near_a).unwrap();
    assert_eq!(second.source, Source::Proximity);
    assert_eq!(second.payload, first.payload);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = service.cache().store().get(KEY).unwrap();
    assert!(stored.is_some());
    assert!(service.cache().store().remaining_ttl(KEY).unwrap() <= Duration::from_secs(1800));
}
