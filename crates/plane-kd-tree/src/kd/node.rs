//! Arena node storage for the bounded-plane tree.

use crate::{BoundedPlane, HalfSpace};

/// Index of a node in the tree's arena.
pub(crate) type NodeId = usize;

/// A node in the bounded-plane tree.
///
/// Every node carries a patch and its payload. The `behind` subtree holds
/// patches strictly in the negative half-space of this node's infinite
/// plane, `in_front` those in the positive half-space or coincident with
/// it. All links are plain arena indices; the parent link never owns the
/// node it refers to.
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub plane: BoundedPlane,
    pub data: T,
    pub parent: Option<NodeId>,
    pub behind: Option<NodeId>,
    pub in_front: Option<NodeId>,
}

impl<T> Node<T> {
    /// Creates an unlinked node.
    pub fn new(plane: BoundedPlane, data: T) -> Self {
        Self {
            plane,
            data,
            parent: None,
            behind: None,
            in_front: None,
        }
    }

    /// Child slot for one side of this node's splitting plane.
    #[inline]
    pub fn child(&self, side: HalfSpace) -> Option<NodeId> {
        match side {
            HalfSpace::Behind => self.behind,
            HalfSpace::InFrontOrEqual => self.in_front,
        }
    }

    /// Mutable child slot for one side of this node's splitting plane.
    #[inline]
    pub fn child_mut(&mut self, side: HalfSpace) -> &mut Option<NodeId> {
        match side {
            HalfSpace::Behind => &mut self.behind,
            HalfSpace::InFrontOrEqual => &mut self.in_front,
        }
    }
}
