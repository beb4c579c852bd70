//! Proximity cache for location-keyed weather lookups.
//!
//! Payloads are cached per provider under the geohash of the coordinate
//! they were fetched for. A geohash-prefix quadtree indexes the cached
//! coordinates, so a query near an already-cached coordinate is answered
//! without another upstream call.
//!
//! ```rust
//! use geocache::{CacheBuilder, Coordinate};
//!
//! let cache = CacheBuilder::new().build()?;
//!
//! let a = Coordinate::new(-6.401994716099995, 106.79402488730072)?;
//! let b = Coordinate::new(-6.356400295925741, 106.72704406220986)?;
//! cache.insert("weather_api", &a, r#"{"temp_c":31}"#, 60)?;
//! cache.insert("weather_api", &b, r#"{"temp_c":29}"#, 60)?;
//!
//! // A few hundred metres from B
//! let query = Coordinate::new(-6.3580, 106.7290)?;
//! assert_eq!(cache.lookup("weather_api", &query).as_deref(), Some(r#"{"temp_c":29}"#));
//! # Ok::<(), geocache::GeocacheError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod clock;
pub mod compute;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod provider;
pub mod quadtree;
pub mod service;
pub mod storage;

pub use builder::CacheBuilder;
pub use cache::{CacheEntry, CacheHit, CacheWrite, HitKind, ProximityCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BudgetPolicy, Config, PruneStrategy};
pub use coordinate::Coordinate;
pub use error::{GeocacheError, Result};
pub use provider::{FnProvider, ProviderRegistry, WeatherProvider};
pub use quadtree::{Nearest, Node, QuadTree};
pub use service::{Lookup, Source, WarmStats, WeatherService};
pub use storage::{BackingStore, MemoryStore, StoreStats};

pub use compute::{haversine_km, decode as decode_geohash, encode as encode_geohash};

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CacheBuilder, Coordinate, GeocacheError, ProximityCache, Result};

    pub use crate::{BackingStore, MemoryStore};

    pub use crate::{Config, QuadTree};

    pub use crate::{Lookup, ProviderRegistry, Source, WeatherProvider, WeatherService};

    pub use geo::Point;

    pub use std::time::Duration;
}
