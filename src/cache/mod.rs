//! Location-keyed proximity cache.
//!
//! ```text
//!   lookup(provider, coord)
//!        |
//!        v
//!   store.get(provider) --none/err--> miss
//!        |
//!        v
//!   cached_hash[coord.hash]? --yes--> exact hit
//!        |
//!        v
//!   decode tree --err--> miss
//!        |
//!        v
//!   tree.nearest_hash(coord, radius) --> proximity hit / miss
//! ```
//!
//! Writes merge the new coordinate into the stored tree and keep the
//! entry's original deadline. An entry that is missing, stale or corrupt
//! is rebuilt from the new coordinate alone.

pub mod entry;
pub mod job;
pub mod store;

pub use entry::CacheEntry;
pub use job::CacheWrite;
pub use store::{CacheHit, HitKind, ProximityCache};
