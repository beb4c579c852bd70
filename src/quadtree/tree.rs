//! Geohash-prefix quadtree: insertion and radius-bounded nearest-hash search.

use super::codec::{decode_root, encode_root};
use super::node::{Node, Quadrant};
use super::{BudgetPolicy, PruneStrategy};
use crate::compute::distance::{haversine_km, radius_in_degrees};
use crate::compute::geocode::{cell_bounds, common_prefix_len};
use crate::coordinate::Coordinate;
use crate::error::Result;

/// Default recursion budget for insertions.
pub const DEFAULT_DEPTH_BUDGET: usize = 10;

/// Largest accepted depth budget. Keeps every tree `insert` can build
/// within the height the codec accepts.
pub const MAX_DEPTH_BUDGET: usize = 64;

/// A hash returned by [`QuadTree::nearest`] with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearest {
    pub hash: String,
    pub distance_km: f64,
}

/// Spatial index over coordinates, keyed by geohash prefix divergence.
///
/// # Examples
///
/// ```rust
/// use geocache::{Coordinate, QuadTree};
///
/// let mut tree = QuadTree::new();
/// let a = Coordinate::new(-6.401994716099995, 106.79402488730072)?;
/// let b = Coordinate::new(-6.356400295925741, 106.72704406220986)?;
/// tree.insert(&a);
/// tree.insert(&b);
///
/// assert_eq!(tree.nearest_hash(&b, 1.0).as_deref(), Some(b.hash()));
/// # Ok::<(), geocache::GeocacheError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QuadTree {
    root: Option<Box<Node>>,
    depth_budget: usize,
    /// Budget left for [`BudgetPolicy::Shared`] trees.
    remaining_budget: usize,
    budget_policy: BudgetPolicy,
    prune_strategy: PruneStrategy,
}

impl QuadTree {
    pub fn new() -> Self {
        Self {
            root: None,
            depth_budget: DEFAULT_DEPTH_BUDGET,
            remaining_budget: DEFAULT_DEPTH_BUDGET,
            budget_policy: BudgetPolicy::default(),
            prune_strategy: PruneStrategy::default(),
        }
    }

    /// Wrap an existing root node.
    pub fn from_root(root: Node) -> Self {
        Self {
            root: Some(Box::new(root)),
            ..Self::new()
        }
    }

    /// Decode a tree previously produced by [`QuadTree::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let root = decode_root(bytes)?;
        Ok(Self {
            root: root.map(Box::new),
            ..Self::new()
        })
    }

    /// Serialize the tree for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_root(self.root.as_deref())
    }

    /// Set the insertion budget, clamped to [`MAX_DEPTH_BUDGET`].
    pub fn with_depth_budget(mut self, budget: usize, policy: BudgetPolicy) -> Self {
        let budget = budget.min(MAX_DEPTH_BUDGET);
        self.depth_budget = budget;
        self.remaining_budget = budget;
        self.budget_policy = policy;
        self
    }

    pub fn with_prune_strategy(mut self, strategy: PruneStrategy) -> Self {
        self.prune_strategy = strategy;
        self
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn into_root(self) -> Option<Node> {
        self.root.map(|node| *node)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total node count (leaves and branches).
    pub fn node_count(&self) -> usize {
        self.root().map_or(0, Node::node_count)
    }

    /// Number of leaves, i.e. stored coordinates.
    pub fn leaf_count(&self) -> usize {
        self.root().map_or(0, Node::leaf_count)
    }

    pub fn height(&self) -> usize {
        self.root().map_or(0, Node::height)
    }

    /// Budget that the next insertion starts with.
    pub fn remaining_budget(&self) -> usize {
        match self.budget_policy {
            BudgetPolicy::PerInsertion => self.depth_budget,
            BudgetPolicy::Shared => self.remaining_budget,
        }
    }

    /// Insert a coordinate.
    ///
    /// Every visited node consumes one unit of the depth budget; once the
    /// budget hits zero the insertion is dropped below that point.
    pub fn insert(&mut self, coordinate: &Coordinate) {
        let mut budget = self.remaining_budget();

        insert_into(&mut self.root, coordinate, &mut budget);

        if self.budget_policy == BudgetPolicy::Shared {
            self.remaining_budget = budget;
        }
    }

    /// Hash of the closest acceptable node within `radius_km`, if any.
    pub fn nearest_hash(&self, query: &Coordinate, radius_km: f64) -> Option<String> {
        self.nearest(query, radius_km).map(|n| n.hash)
    }

    /// Like [`QuadTree::nearest_hash`], also reporting the distance.
    ///
    /// A root whose hash equals the query hash is an exact hit. Otherwise
    /// the tree is walked depth-first; the first leaf within the radius
    /// that improves on the best distance is recorded and its subtree is
    /// not descended further. Branch nodes only route the search.
    pub fn nearest(&self, query: &Coordinate, radius_km: f64) -> Option<Nearest> {
        let root = self.root()?;

        if root.hash == query.hash() {
            return Some(Nearest {
                hash: root.hash.clone(),
                distance_km: haversine_km(
                    root.latitude,
                    root.longitude,
                    query.latitude(),
                    query.longitude(),
                ),
            });
        }

        let mut best: Option<(&str, f64)> = None;
        search(root, query, radius_km, self.prune_strategy, &mut best);

        best.map(|(hash, distance_km)| Nearest {
            hash: hash.to_string(),
            distance_km,
        })
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_into(slot: &mut Option<Box<Node>>, coordinate: &Coordinate, budget: &mut usize) {
    let Some(mut node) = slot.take() else {
        *slot = Some(Box::new(Node::leaf(coordinate)));
        return;
    };

    *budget = budget.saturating_sub(1);
    if *budget == 0 {
        log::debug!("depth budget exhausted, dropping {}", coordinate.hash());
        *slot = Some(node);
        return;
    }

    let hash = coordinate.hash();
    let shared = common_prefix_len(&node.hash, hash);

    if shared == hash.len() {
        // Same cell already represented here.
        insert_into(&mut node.nw, coordinate, budget);
        *slot = Some(node);
    } else if shared == node.hash.len() {
        let quadrant = Quadrant::locate(coordinate.latitude(), coordinate.longitude(), &node);
        insert_into(node.child_slot(quadrant), coordinate, budget);
        *slot = Some(node);
    } else {
        let quadrant = Quadrant::locate(coordinate.latitude(), coordinate.longitude(), &node);
        let mut branch = Node::branch(&hash[..shared], coordinate);
        *branch.child_slot(quadrant) = Some(Box::new(Node::leaf(coordinate)));
        *branch.child_slot(quadrant.sibling()) = Some(node);
        *slot = Some(Box::new(branch));
    }
}

fn search<'a>(
    node: &'a Node,
    query: &Coordinate,
    radius_km: f64,
    prune: PruneStrategy,
    best: &mut Option<(&'a str, f64)>,
) {
    if node.is_leaf() {
        let distance = haversine_km(
            node.latitude,
            node.longitude,
            query.latitude(),
            query.longitude(),
        );
        let best_distance = best.map_or(f64::INFINITY, |(_, d)| d);

        if distance <= radius_km && distance < best_distance {
            *best = Some((node.hash.as_str(), distance));
            return;
        }
    }

    if should_descend(node, query, radius_km, prune) {
        for child in node.children() {
            search(child, query, radius_km, prune, best);
        }
    }
}

fn should_descend(node: &Node, query: &Coordinate, radius_km: f64, prune: PruneStrategy) -> bool {
    match prune {
        PruneStrategy::RawDelta => {
            (query.latitude() - node.latitude).abs() < radius_km
                || (query.longitude() - node.longitude).abs() < radius_km
        }
        PruneStrategy::GeohashCell => {
            let Ok(cell) = cell_bounds(&node.hash) else {
                return true;
            };
            let (lat_deg, lon_deg) = radius_in_degrees(radius_km, query.latitude());

            let lat = query.latitude();
            let lat_ok = lat >= cell.min().y - lat_deg && lat <= cell.max().y + lat_deg;

            lat_ok && longitude_gap(query.longitude(), cell.min().x, cell.max().x) <= lon_deg
        }
    }
}

/// Degrees between `lon` and the interval `[min, max]`, across the antimeridian.
fn longitude_gap(lon: f64, min: f64, max: f64) -> f64 {
    if (min..=max).contains(&lon) {
        return 0.0;
    }
    let west = (min - lon).rem_euclid(360.0);
    let east = (lon - max).rem_euclid(360.0);
    west.min(east)
}
