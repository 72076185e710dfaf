//! Dynamic bounding volume hierarchy over axis-aligned boxes.
//!
//! The tree is built incrementally: each insertion descends toward the
//! child whose subtree box would grow the least and splits the reached
//! leaf, so the structure is an insertion-ordered BVH with no global
//! rebalancing. Leaves carry user payloads; internal nodes carry only the
//! union of their children's boxes.
//!
//! # Example
//!
//! ```ignore
//! use aabb_tree::{Aabb, AabbTree};
//! use nalgebra::Point3;
//!
//! let mut tree = AabbTree::new();
//! tree.insert(bounds_of(&object), object_id);
//!
//! // Visit everything overlapping a probe region.
//! tree.query(&probe, |bounds, id| hits.push(*id));
//!
//! // Payloads are found by equality, boxes by exact match.
//! tree.remove(&object_id);
//! ```
//!
//! # Architecture
//!
//! - [`AabbTree`]: the container holding the node arena and root index
//! - `Node`: arena slot storing bounds, parent/child indices, and the
//!   leaf payload

mod node;
mod tree;

pub use tree::AabbTree;
