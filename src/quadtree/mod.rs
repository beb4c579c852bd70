//! # Geohash-prefix quadtree
//!
//! Coordinates are indexed by where their geohashes diverge. Inserting a
//! coordinate whose hash shares only a prefix with an existing node
//! synthesises a branch node carrying that prefix, with the new leaf and
//! the displaced subtree as sibling quadrants:
//!
//! ```text
//! before          after inserting B (shares "qqgg" with A)
//!
//!  A qqggw4t19      [qqgg] @B
//!                   ├─ NW: B qqggudu72
//!                   └─ NE: A qqggw4t19
//! ```
//!
//! Searches are depth-first and radius-bounded; see [`QuadTree::nearest`].
//!
//! ## Depth budget
//!
//! Every node visited during insertion consumes one unit of a depth
//! budget. [`BudgetPolicy`] decides whether the budget is reset for each
//! insertion or shared by all insertions into one tree instance.
//!
//! ## Pruning
//!
//! [`PruneStrategy::GeohashCell`] only descends into a node when the query
//! lies within the node's geohash cell grown by the radius. Every
//! coordinate beneath a node lies in that cell, so no qualifying leaf is
//! skipped. [`PruneStrategy::RawDelta`] compares raw degree deltas with the
//! kilometre radius and can skip qualifying leaves.

pub mod codec;
pub mod node;
pub mod tree;

pub use codec::MAX_TREE_HEIGHT;
pub use node::{Node, Quadrant};
pub use tree::{DEFAULT_DEPTH_BUDGET, MAX_DEPTH_BUDGET, Nearest, QuadTree};

use serde::{Deserialize, Serialize};

/// How the insertion depth budget is accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Each insertion starts with the full budget.
    #[default]
    PerInsertion,
    /// One budget shared by every insertion into the same tree instance.
    Shared,
}

/// Subtree pruning rule used by nearest-hash search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PruneStrategy {
    /// Descend when the query is within the node's cell grown by the radius.
    #[default]
    GeohashCell,
    /// Descend when either degree delta is below the radius in kilometres.
    RawDelta,
}
