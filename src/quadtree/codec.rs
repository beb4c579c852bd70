//! Binary framing for persisted trees.
//!
//! Layout: `GQTREE` magic, one format-version byte, then the bincode
//! encoding (fixed-width integers) of the nodes in pre-order. Each node
//! carries a bitmask of the child slots that follow it, in
//! [`Quadrant::VISIT_ORDER`]. Trees are flattened and rebuilt without
//! recursion, and a tree taller than [`MAX_TREE_HEIGHT`] is rejected.
//! Trailing bytes, unknown versions and structurally invalid trees are
//! rejected too.

use super::node::{Node, Quadrant};
use crate::error::{GeocacheError, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};

const TREE_MAGIC: &[u8] = b"GQTREE";
const TREE_FORMAT_VERSION: u8 = 2;
const MAX_TREE_BYTES: u64 = 16 * 1024 * 1024;

/// Tallest tree the codec reads or writes.
pub const MAX_TREE_HEIGHT: usize = 1024;

const ALL_CHILDREN: u8 = 0b1111;

#[derive(Debug, Serialize, Deserialize)]
struct FlatNode {
    latitude: f64,
    longitude: f64,
    hash: String,
    branch: bool,
    children: u8,
}

impl FlatNode {
    fn from_node(node: &Node) -> Self {
        let children = Quadrant::VISIT_ORDER
            .iter()
            .enumerate()
            .filter(|(_, q)| node.child(**q).is_some())
            .fold(0u8, |mask, (bit, _)| mask | (1 << bit));

        Self {
            latitude: node.latitude,
            longitude: node.longitude,
            hash: node.hash.clone(),
            branch: node.branch,
            children,
        }
    }
}

/// Node being rebuilt, with the child slots still to fill (last = next).
struct Frame {
    node: Node,
    pending: Vec<Quadrant>,
}

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_TREE_BYTES)
        .reject_trailing_bytes()
}

/// Serialize a tree root (or an empty tree) into framed bytes.
pub fn encode_root(root: Option<&Node>) -> Result<Vec<u8>> {
    let mut flat = Vec::new();
    let mut stack: Vec<(&Node, usize)> = root.map(|node| (node, 1)).into_iter().collect();

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_TREE_HEIGHT {
            return Err(GeocacheError::InvalidInput(format!(
                "Tree cannot be encoded: deeper than {} levels",
                MAX_TREE_HEIGHT
            )));
        }
        flat.push(FlatNode::from_node(node));
        for quadrant in Quadrant::VISIT_ORDER.iter().rev() {
            if let Some(child) = node.child(*quadrant) {
                stack.push((child, depth + 1));
            }
        }
    }

    let body = bincode_options()
        .serialize(&flat)
        .map_err(|e| GeocacheError::InvalidInput(format!("Tree cannot be encoded: {}", e)))?;

    let mut out = Vec::with_capacity(TREE_MAGIC.len() + 1 + body.len());
    out.extend_from_slice(TREE_MAGIC);
    out.push(TREE_FORMAT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode framed bytes produced by [`encode_root`].
pub fn decode_root(bytes: &[u8]) -> Result<Option<Node>> {
    let Some(rest) = bytes.strip_prefix(TREE_MAGIC) else {
        return Err(GeocacheError::DecodeFailure("missing tree header".into()));
    };

    let Some((&version, body)) = rest.split_first() else {
        return Err(GeocacheError::DecodeFailure("truncated tree header".into()));
    };

    if version != TREE_FORMAT_VERSION {
        return Err(GeocacheError::DecodeFailure(format!(
            "unsupported tree format version {}",
            version
        )));
    }

    let flat: Vec<FlatNode> = bincode_options()
        .deserialize(body)
        .map_err(|e| GeocacheError::DecodeFailure(format!("tree body: {}", e)))?;

    let root = rebuild(flat)?;

    if let Some(node) = &root {
        node.check_invariants()
            .map_err(GeocacheError::DecodeFailure)?;
    }

    Ok(root)
}

fn rebuild(flat: Vec<FlatNode>) -> Result<Option<Node>> {
    let mut root = None;
    let mut stack: Vec<Frame> = Vec::new();

    for item in flat {
        if root.is_some() {
            return Err(GeocacheError::DecodeFailure(
                "nodes after the end of the tree".into(),
            ));
        }
        if item.children & !ALL_CHILDREN != 0 {
            return Err(GeocacheError::DecodeFailure(format!(
                "invalid child mask {:#06b} on '{}'",
                item.children, item.hash
            )));
        }
        if stack.len() >= MAX_TREE_HEIGHT {
            return Err(GeocacheError::DecodeFailure(format!(
                "tree deeper than {} levels",
                MAX_TREE_HEIGHT
            )));
        }

        let pending = Quadrant::VISIT_ORDER
            .iter()
            .enumerate()
            .rev()
            .filter(|(bit, _)| item.children & (1 << bit) != 0)
            .map(|(_, q)| *q)
            .collect();

        stack.push(Frame {
            node: Node {
                latitude: item.latitude,
                longitude: item.longitude,
                hash: item.hash,
                branch: item.branch,
                ne: None,
                nw: None,
                se: None,
                sw: None,
            },
            pending,
        });

        // Attach every subtree that is now complete to its parent.
        while let Some(done) = stack.pop_if(|frame| frame.pending.is_empty()) {
            match stack.last_mut() {
                Some(parent) => {
                    let Some(quadrant) = parent.pending.pop() else {
                        return Err(GeocacheError::DecodeFailure("dangling child".into()));
                    };
                    *parent.node.child_slot(quadrant) = Some(Box::new(done.node));
                }
                None => root = Some(done.node),
            }
        }
    }

    if !stack.is_empty() {
        return Err(GeocacheError::DecodeFailure(
            "tree ends before all children are present".into(),
        ));
    }

    Ok(root)
}
