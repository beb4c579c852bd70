//! Tree nodes and quadrant selection.

use crate::compute::geocode::DEFAULT_PRECISION;
use crate::coordinate::Coordinate;
use serde::{Deserialize, Serialize};

/// One of the four child slots of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NE,
    NW,
    SE,
    SW,
}

impl Quadrant {
    /// Search order used when visiting children.
    pub const VISIT_ORDER: [Quadrant; 4] = [Quadrant::NW, Quadrant::NE, Quadrant::SW, Quadrant::SE];

    /// Quadrant of `(latitude, longitude)` relative to a node's coordinate.
    ///
    /// Ties go north and east.
    pub fn locate(latitude: f64, longitude: f64, node: &Node) -> Quadrant {
        match (latitude >= node.latitude, longitude >= node.longitude) {
            (true, true) => Quadrant::NE,
            (true, false) => Quadrant::NW,
            (false, true) => Quadrant::SE,
            (false, false) => Quadrant::SW,
        }
    }

    /// Slot that receives the displaced node when a branch is synthesised.
    pub fn sibling(self) -> Quadrant {
        match self {
            Quadrant::NE => Quadrant::NW,
            Quadrant::NW => Quadrant::NE,
            Quadrant::SE => Quadrant::SW,
            Quadrant::SW => Quadrant::SE,
        }
    }
}

/// A quadtree node.
///
/// Leaves carry a coordinate's full geohash. Branches are synthesised when
/// two hashes diverge and carry the shared prefix; their coordinate is the
/// one whose insertion created them. Every node's hash is a prefix of the
/// hash of every coordinate stored beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub latitude: f64,
    pub longitude: f64,
    pub hash: String,
    pub branch: bool,
    pub ne: Option<Box<Node>>,
    pub nw: Option<Box<Node>>,
    pub se: Option<Box<Node>>,
    pub sw: Option<Box<Node>>,
}

impl Node {
    /// Leaf holding a coordinate's full hash.
    pub fn leaf(coordinate: &Coordinate) -> Self {
        Self::new(
            coordinate.latitude(),
            coordinate.longitude(),
            coordinate.hash().to_string(),
            false,
        )
    }

    /// Branch holding a shared prefix, positioned at `coordinate`.
    pub fn branch(prefix: &str, coordinate: &Coordinate) -> Self {
        Self::new(
            coordinate.latitude(),
            coordinate.longitude(),
            prefix.to_string(),
            true,
        )
    }

    fn new(latitude: f64, longitude: f64, hash: String, branch: bool) -> Self {
        Self {
            latitude,
            longitude,
            hash,
            branch,
            ne: None,
            nw: None,
            se: None,
            sw: None,
        }
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<&Node> {
        match quadrant {
            Quadrant::NE => self.ne.as_deref(),
            Quadrant::NW => self.nw.as_deref(),
            Quadrant::SE => self.se.as_deref(),
            Quadrant::SW => self.sw.as_deref(),
        }
    }

    pub fn child_slot(&mut self, quadrant: Quadrant) -> &mut Option<Box<Node>> {
        match quadrant {
            Quadrant::NE => &mut self.ne,
            Quadrant::NW => &mut self.nw,
            Quadrant::SE => &mut self.se,
            Quadrant::SW => &mut self.sw,
        }
    }

    /// Present children in visit order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        Quadrant::VISIT_ORDER
            .into_iter()
            .filter_map(move |q| self.child(q))
    }

    pub fn is_leaf(&self) -> bool {
        !self.branch
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(Node::node_count).sum::<usize>()
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        usize::from(self.is_leaf()) + self.children().map(Node::leaf_count).sum::<usize>()
    }

    /// Height of this subtree (a lone node has height 1).
    pub fn height(&self) -> usize {
        1 + self.children().map(Node::height).max().unwrap_or(0)
    }

    /// Checks structural invariants of a decoded subtree.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if !self.latitude.is_finite()
            || !self.longitude.is_finite()
            || !(-90.0..=90.0).contains(&self.latitude)
            || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(format!(
                "node '{}' has invalid coordinate {},{}",
                self.hash, self.latitude, self.longitude
            ));
        }

        if !crate::compute::geocode::is_valid_hash(&self.hash) {
            return Err(format!("node hash '{}' is not a geohash", self.hash));
        }

        if self.is_leaf() && self.hash.len() != DEFAULT_PRECISION {
            return Err(format!(
                "leaf hash '{}' is not {} characters long",
                self.hash, DEFAULT_PRECISION
            ));
        }

        for child in self.children() {
            if !child.hash.starts_with(&self.hash) {
                return Err(format!(
                    "child '{}' does not extend parent '{}'",
                    child.hash, self.hash
                ));
            }
            child.check_invariants()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_locate_quadrants() {
        let node = Node::leaf(&coord(10.0, 10.0));
        assert_eq!(Quadrant::locate(11.0, 11.0, &node), Quadrant::NE);
        assert_eq!(Quadrant::locate(11.0, 9.0, &node), Quadrant::NW);
        assert_eq!(Quadrant::locate(9.0, 11.0, &node), Quadrant::SE);
        assert_eq!(Quadrant::locate(9.0, 9.0, &node), Quadrant::SW);
        // Ties go north-east
        assert_eq!(Quadrant::locate(10.0, 10.0, &node), Quadrant::NE);
    }

    #[test]
    fn test_sibling_pairs() {
        assert_eq!(Quadrant::NE.sibling(), Quadrant::NW);
        assert_eq!(Quadrant::NW.sibling(), Quadrant::NE);
        assert_eq!(Quadrant::SE.sibling(), Quadrant::SW);
        assert_eq!(Quadrant::SW.sibling(), Quadrant::SE);
    }

    #[test]
    fn test_counts() {
        let a = coord(10.0, 10.0);
        let b = coord(10.5, 9.5);
        let mut root = Node::branch("s", &b);
        *root.child_slot(Quadrant::NW) = Some(Box::new(Node::leaf(&b)));
        *root.child_slot(Quadrant::NE) = Some(Box::new(Node::leaf(&a)));

        assert_eq!(root.node_count(), 3);
        assert_eq!(root.leaf_count(), 2);
        assert_eq!(root.height(), 2);
        assert_eq!(root.children().count(), 2);
        assert!(root.check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_violation_detected() {
        let mut root = Node::leaf(&coord(10.0, 10.0));
        root.nw = Some(Box::new(Node::leaf(&coord(-40.0, 120.0))));
        assert!(root.check_invariants().is_err());

        let mut bad = Node::leaf(&coord(10.0, 10.0));
        bad.hash = "not-a-hash".into();
        assert!(bad.check_invariants().is_err());

        // A shortened leaf hash cannot come from a coordinate
        let mut short = Node::leaf(&coord(10.0, 10.0));
        short.hash.truncate(5);
        assert!(short.check_invariants().is_err());
    }
}
