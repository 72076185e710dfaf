//! KD-style binary space partition over bounded planes.
//!
//! Every node splits space by its patch's infinite plane: patches whose
//! corners all fall behind it go into the `behind` subtree, patches in
//! front or coincident into the `in_front` subtree, and a patch spanning
//! the plane is inserted into both sides as two physical nodes. The
//! duplication keeps each subtree self-contained, which is what makes the
//! pruned nearest-patch search exact.
//!
//! # Example
//!
//! ```ignore
//! use plane_kd_tree::{BoundedPlane, BoundedPlaneKdTree};
//! use nalgebra::Point3;
//!
//! let mut tree = BoundedPlaneKdTree::new();
//! tree.add(surface_patch, surface_id);
//!
//! if let Some((patch, id)) = tree.find_closest_bounded_plane(cursor) {
//!     // patch is the nearest finite patch, not the nearest infinite plane
//! }
//!
//! tree.remove(&surface_id);
//! ```
//!
//! # Architecture
//!
//! - [`BoundedPlaneKdTree`]: the container holding the node arena and
//!   root index
//! - `Node`: arena slot storing the patch, its payload, and the named
//!   `behind`/`in_front` child slots

mod node;
mod tree;

pub use tree::BoundedPlaneKdTree;
