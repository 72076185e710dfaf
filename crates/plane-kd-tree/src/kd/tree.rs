//! Bounded-plane tree container, mutation, and nearest-patch queries.

use std::collections::VecDeque;

use nalgebra::Point3;

use crate::{BoundedPlane, HalfSpace};

use super::node::{Node, NodeId};

/// A binary space partition over finite rectangular planes.
///
/// Each node splits space by its patch's infinite plane. Patches entirely
/// behind that plane live in the `behind` subtree, patches in front of or
/// coincident with it in the `in_front` subtree, and a patch whose
/// corners fall on both sides is inserted into both — one logical patch
/// may therefore occupy several physical nodes. Exact duplicates (same
/// patch geometry, equal payload) are rejected on insert.
///
/// Nodes live in an arena owned by the tree and linked by indices, so
/// parent back-references carry no ownership and dropping the tree
/// reclaims every node.
///
/// # Example
///
/// ```ignore
/// let mut tree = BoundedPlaneKdTree::new();
/// tree.add(patch, surface_id);
/// let hit = tree.find_closest_bounded_plane(cursor);
/// tree.remove(&surface_id);
/// ```
#[derive(Debug)]
pub struct BoundedPlaneKdTree<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl<T> Default for BoundedPlaneKdTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedPlaneKdTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    /// Returns `true` if the tree contains no patches.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of physical nodes in the tree.
    ///
    /// A patch that straddled a splitting plane on insert is counted once
    /// per duplicate.
    pub fn node_count(&self) -> usize {
        self.root.map_or(0, |id| self.count_subtree(id))
    }

    /// Returns the maximum depth of the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |id| self.subtree_depth(id))
    }

    /// Collects every (patch, payload) pair in breadth-first order.
    ///
    /// Duplicated nodes appear once per physical copy; the order reflects
    /// the tree's internal layout, not a spatial ordering.
    pub fn planes(&self) -> Vec<(&BoundedPlane, &T)> {
        let mut result = Vec::new();
        let Some(root) = self.root else { return result };
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let node = self.node(id);
            result.push((&node.plane, &node.data));
            queue.extend(node.behind);
            queue.extend(node.in_front);
        }
        result
    }

    /// Adds a patch with its payload to the tree.
    ///
    /// An exact duplicate of an existing node (identical center, extents,
    /// and rotation, equal payload) is a no-op. A patch whose corners fall
    /// on both sides of an existing node's splitting plane is inserted
    /// into both of that node's subtrees.
    pub fn add(&mut self, plane: BoundedPlane, data: T)
    where
        T: Clone + PartialEq,
    {
        let node = self.alloc(Node::new(plane, data));
        match self.root {
            None => self.root = Some(node),
            Some(root) => self.insert_node(root, node),
        }
    }

    /// Removes every node whose payload equals `data`.
    ///
    /// A patch duplicated across splitting planes loses all of its
    /// physical copies. Does nothing if no payload matches.
    pub fn remove(&mut self, data: &T)
    where
        T: Clone + PartialEq,
    {
        self.remove_matching(|node| node.data == *data);
    }

    /// Removes every node whose patch geometry is identical to `plane`.
    ///
    /// Matching is by exact center/extents/rotation equality and ignores
    /// payloads, so distinct payloads sharing identical geometry are all
    /// removed. Does nothing if no patch matches.
    pub fn remove_plane(&mut self, plane: &BoundedPlane)
    where
        T: Clone + PartialEq,
    {
        self.remove_matching(|node| node.plane == *plane);
    }

    /// Finds the patch closest to a world-space point.
    ///
    /// Returns `None` on an empty tree. Distance is measured to the finite
    /// patch (its closest surface point), not to the infinite plane it
    /// lies on. Ties resolve to the first node found by the search order.
    pub fn find_closest_bounded_plane(&self, point: Point3<f32>) -> Option<(&BoundedPlane, &T)> {
        let root = self.root?;
        let (best, _) = self.closest_in_subtree(root, point);
        let node = self.node(best);
        Some((&node.plane, &node.data))
    }

    /// Inserts an allocated node into the subtree at `current`, freeing it
    /// again if an identical node is already present.
    fn insert_node(&mut self, current: NodeId, node: NodeId)
    where
        T: Clone + PartialEq,
    {
        if self.is_same_node(current, node) {
            self.free_node(node);
            return;
        }

        let corners = self.node(node).plane.corners();
        let splitter = self.node(current).plane.plane().clone();
        let mut in_front = 0;
        let mut behind = 0;
        for corner in corners {
            match splitter.half_space(corner) {
                HalfSpace::InFrontOrEqual => in_front += 1,
                HalfSpace::Behind => behind += 1,
            }
        }

        if in_front > 0 && behind > 0 {
            // The patch spans the splitting plane: one physical copy per side.
            let duplicate = {
                let original = self.node(node);
                Node::new(original.plane.clone(), original.data.clone())
            };
            let duplicate = self.alloc(duplicate);
            self.attach(current, HalfSpace::InFrontOrEqual, node);
            self.attach(current, HalfSpace::Behind, duplicate);
        } else if behind > 0 {
            self.attach(current, HalfSpace::Behind, node);
        } else {
            self.attach(current, HalfSpace::InFrontOrEqual, node);
        }
    }

    /// Links `node` into the child slot on `side`, recursing if occupied.
    fn attach(&mut self, parent: NodeId, side: HalfSpace, node: NodeId)
    where
        T: Clone + PartialEq,
    {
        match self.node(parent).child(side) {
            Some(child) => self.insert_node(child, node),
            None => {
                *self.node_mut(parent).child_mut(side) = Some(node);
                self.node_mut(node).parent = Some(parent);
            }
        }
    }

    /// Two nodes are the same entry when their patches are identical and
    /// their payloads compare equal.
    fn is_same_node(&self, a: NodeId, b: NodeId) -> bool
    where
        T: PartialEq,
    {
        let (a, b) = (self.node(a), self.node(b));
        a.plane == b.plane && a.data == b.data
    }

    fn remove_matching<F>(&mut self, matches: F)
    where
        T: Clone + PartialEq,
        F: Fn(&Node<T>) -> bool,
    {
        let matched = self.collect_matching(&matches);
        for id in matched {
            // Re-inserting orphans can collapse a duplicate into its twin,
            // discarding a node this collection still references; only
            // excise slots that are live and still match.
            if self.nodes[id].as_ref().is_some_and(|node| matches(node)) {
                self.remove_node(id);
            }
        }
    }

    /// Collects the ids of all nodes satisfying `matches`, breadth-first.
    fn collect_matching<F>(&self, matches: &F) -> Vec<NodeId>
    where
        F: Fn(&Node<T>) -> bool,
    {
        let mut found = Vec::new();
        let Some(root) = self.root else { return found };
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let node = self.node(id);
            if matches(node) {
                found.push(id);
            }
            queue.extend(node.behind);
            queue.extend(node.in_front);
        }
        found
    }

    /// Excises a single node while keeping the half-space partition intact.
    ///
    /// With two children the `behind` subtree survives in the excised
    /// node's place and every other descendant is detached and re-inserted
    /// below it, so each one lands on the correct side of the surviving
    /// splitting planes. With one child, that child is spliced in
    /// directly; with none, the parent's slot is cleared.
    fn remove_node(&mut self, id: NodeId)
    where
        T: Clone + PartialEq,
    {
        let parent = self.node(id).parent;
        let behind = self.node(id).behind;
        let in_front = self.node(id).in_front;

        let (replacement, orphans) = match (behind, in_front) {
            (Some(survivor), Some(_)) => {
                let mut orphans = Vec::new();
                let mut queue = VecDeque::from([id]);
                while let Some(current) = queue.pop_front() {
                    let node = self.node(current);
                    queue.extend(node.behind);
                    queue.extend(node.in_front);
                    if current != id && current != survivor {
                        orphans.push(current);
                    }
                }
                for &orphan in &orphans {
                    let node = self.node_mut(orphan);
                    node.parent = None;
                    node.behind = None;
                    node.in_front = None;
                }
                let node = self.node_mut(survivor);
                node.behind = None;
                node.in_front = None;
                (Some(survivor), orphans)
            }
            (Some(child), None) | (None, Some(child)) => (Some(child), Vec::new()),
            (None, None) => (None, Vec::new()),
        };

        match parent {
            Some(parent_id) => {
                let parent_node = self.node_mut(parent_id);
                if parent_node.behind == Some(id) {
                    parent_node.behind = replacement;
                } else {
                    parent_node.in_front = replacement;
                }
            }
            None => self.root = replacement,
        }
        if let Some(replacement) = replacement {
            self.node_mut(replacement).parent = parent;
        }
        self.free_node(id);

        if !orphans.is_empty() {
            let survivor = replacement.expect("two-child excision keeps its behind subtree");
            for orphan in orphans {
                self.insert_node(survivor, orphan);
            }
        }
    }

    /// Follows the half-space tests from `subtree` down to the node where
    /// the matching child slot is empty.
    fn find_leaf(&self, subtree: NodeId, point: Point3<f32>) -> NodeId {
        let mut current = subtree;
        loop {
            let node = self.node(current);
            let side = node.plane.plane().half_space(point);
            match node.child(side) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Branch-and-bound nearest-patch search within one subtree.
    ///
    /// Descends to the locally correct partition, then walks back up to
    /// the subtree root scoring each visited node's patch. A child subtree
    /// the walk did not come through is searched only when the query point
    /// is close enough to the node's splitting plane for that side to hold
    /// a better candidate.
    fn closest_in_subtree(&self, subtree: NodeId, point: Point3<f32>) -> (NodeId, f32) {
        let mut current = self.find_leaf(subtree, point);
        let mut previous: Option<NodeId> = None;
        let mut best = (current, f32::INFINITY);

        loop {
            let node = self.node(current);
            let distance = node.plane.distance_squared(point);
            if distance < best.1 {
                best = (current, distance);
            }

            let plane_distance = node.plane.plane().signed_distance(point);
            if plane_distance * plane_distance <= best.1 {
                for child in [node.behind, node.in_front] {
                    if let Some(child) = child {
                        if previous == Some(child) {
                            continue;
                        }
                        let candidate = self.closest_in_subtree(child, point);
                        if candidate.1 < best.1 {
                            best = candidate;
                        }
                    }
                }
            }

            if current == subtree {
                return best;
            }
            previous = Some(current);
            current = self
                .node(current)
                .parent
                .expect("walk stays within the subtree");
        }
    }

    fn count_subtree(&self, id: NodeId) -> usize {
        let node = self.node(id);
        let behind = node.behind.map_or(0, |child| self.count_subtree(child));
        let in_front = node.in_front.map_or(0, |child| self.count_subtree(child));
        1 + behind + in_front
    }

    fn subtree_depth(&self, id: NodeId) -> usize {
        let node = self.node(id);
        let behind = node.behind.map_or(0, |child| self.subtree_depth(child));
        let in_front = node.in_front.map_or(0, |child| self.subtree_depth(child));
        1 + behind.max(in_front)
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.nodes[id].take().expect("freed node id is live");
        self.free.push(id);
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id].as_ref().expect("node id is live")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id].as_mut().expect("node id is live")
    }
}
