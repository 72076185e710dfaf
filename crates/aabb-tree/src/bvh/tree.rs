//! AABB tree container and mutation/query operations.

use std::collections::VecDeque;

use crate::Aabb;

use super::node::{Node, NodeId};

/// A dynamic bounding volume hierarchy over axis-aligned boxes.
///
/// Every leaf holds one payload and its box; every internal node holds the
/// union of its children's boxes and nothing else. Nodes live in an arena
/// owned by the tree, linked by indices, so parent back-references carry
/// no ownership and dropping (or clearing) the tree reclaims every node.
///
/// Insertion picks the child whose subtree box grows the least, splitting
/// the reached leaf in place. There is no rebalancing beyond that local
/// choice: the tree shape is determined by insertion order.
///
/// # Example
///
/// ```ignore
/// let mut tree = AabbTree::new();
/// tree.insert(bounds, entity);
/// tree.query(&probe, |_, entity| hits.push(*entity));
/// tree.remove(&entity);
/// ```
#[derive(Debug)]
pub struct AabbTree<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<T> Default for AabbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AabbTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns the number of leaves (stored payloads) in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no payloads.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the box enclosing everything in the tree, if any.
    pub fn root_bounds(&self) -> Option<Aabb> {
        self.root.map(|id| self.node(id).bounds)
    }

    /// Returns the maximum depth of the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |id| self.subtree_depth(id))
    }

    /// Removes every node from the tree.
    ///
    /// The tree owns its arena outright, so this reclaims all nodes at
    /// once. Clearing an empty tree is a no-op.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Inserts a payload with its bounding box.
    ///
    /// The new leaf descends from the root toward the child whose subtree
    /// box would have the smaller volume after absorbing `bounds` (ties go
    /// to the first child), then splits the leaf it lands on. Ancestor
    /// boxes are rebuilt on the way back up.
    pub fn insert(&mut self, bounds: Aabb, data: T) {
        let leaf = self.alloc(Node::leaf(bounds, data));
        self.len += 1;

        let Some(root) = self.root else {
            self.root = Some(leaf);
            return;
        };

        // Descend toward the leaf whose subtree grows the least when the
        // new box is folded in.
        let mut current = root;
        while let (Some(left), Some(right)) = (self.node(current).left, self.node(current).right) {
            let left_volume = self.node(left).bounds.union(&bounds).volume();
            let right_volume = self.node(right).bounds.union(&bounds).volume();
            current = if left_volume <= right_volume { left } else { right };
        }

        // Replace the reached leaf with an internal node adopting both it
        // and the new leaf.
        let old_parent = self.node(current).parent;
        let merged = self.node(current).bounds.union(&bounds);
        let parent = self.alloc(Node::internal(merged, old_parent, current, leaf));
        self.node_mut(current).parent = Some(parent);
        self.node_mut(leaf).parent = Some(parent);

        match old_parent {
            Some(grandparent) => {
                self.replace_child(grandparent, current, parent);
                self.refresh_upward(Some(grandparent));
            }
            None => self.root = Some(parent),
        }
    }

    /// Removes the first leaf (in breadth-first order) whose payload
    /// equals `data`.
    ///
    /// Does nothing if no payload matches.
    pub fn remove(&mut self, data: &T)
    where
        T: PartialEq,
    {
        let Some(root) = self.root else { return };
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let node = self.node(id);
            let found = match &node.data {
                Some(stored) => stored == data,
                None => {
                    queue.extend(node.left);
                    queue.extend(node.right);
                    false
                }
            };
            if found {
                self.remove_leaf(id);
                return;
            }
        }
    }

    /// Removes the leaf whose box is exactly `bounds`.
    ///
    /// The search descends into the child whose box contains `bounds`
    /// (first child preferred); if neither contains it, or the reached
    /// leaf's box is not identical to `bounds`, nothing is removed. With
    /// duplicate geometry the leaf reached by this descent is the one that
    /// goes.
    pub fn remove_bounds(&mut self, bounds: &Aabb) {
        let Some(mut current) = self.root else { return };
        loop {
            let node = self.node(current);
            match (node.left, node.right) {
                (Some(left), Some(right)) => {
                    if self.node(left).bounds.contains(bounds) {
                        current = left;
                    } else if self.node(right).bounds.contains(bounds) {
                        current = right;
                    } else {
                        return;
                    }
                }
                _ => {
                    let found = node.bounds == *bounds;
                    if found {
                        self.remove_leaf(current);
                    }
                    return;
                }
            }
        }
    }

    /// Visits every leaf whose box intersects `bounds`.
    ///
    /// Subtrees whose enclosing box misses `bounds` are skipped entirely.
    pub fn query<F>(&self, bounds: &Aabb, mut visit: F)
    where
        F: FnMut(&Aabb, &T),
    {
        if let Some(root) = self.root {
            self.query_subtree(root, bounds, &mut visit);
        }
    }

    fn query_subtree<F>(&self, id: NodeId, bounds: &Aabb, visit: &mut F)
    where
        F: FnMut(&Aabb, &T),
    {
        let node = self.node(id);
        if !node.bounds.intersects(bounds) {
            return;
        }
        if let Some(data) = &node.data {
            visit(&node.bounds, data);
        } else {
            let left = node.left.expect("internal node has two children");
            let right = node.right.expect("internal node has two children");
            self.query_subtree(left, bounds, visit);
            self.query_subtree(right, bounds, visit);
        }
    }

    /// Detaches a leaf, promoting its sibling into the parent's slot.
    fn remove_leaf(&mut self, leaf: NodeId) {
        self.len -= 1;
        let parent = self.free_node(leaf).parent;

        let Some(parent) = parent else {
            // The leaf was the root; the tree is now empty.
            self.root = None;
            return;
        };

        let removed = self.free_node(parent);
        let sibling = if removed.left == Some(leaf) {
            removed.right
        } else {
            removed.left
        }
        .expect("internal node has two children");

        self.node_mut(sibling).parent = removed.parent;
        match removed.parent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.refresh_upward(Some(grandparent));
            }
            None => self.root = Some(sibling),
        }
    }

    /// Recomputes enclosing boxes from `start` up to the root.
    fn refresh_upward(&mut self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            let node = self.node(id);
            let left = node.left.expect("internal node has two children");
            let right = node.right.expect("internal node has two children");
            let parent = node.parent;
            let merged = self.node(left).bounds.union(&self.node(right).bounds);
            self.node_mut(id).bounds = merged;
            current = parent;
        }
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let node = self.node_mut(parent);
        if node.left == Some(old) {
            node.left = Some(new);
        } else {
            node.right = Some(new);
        }
    }

    fn subtree_depth(&self, id: NodeId) -> usize {
        let node = self.node(id);
        let left = node.left.map_or(0, |child| self.subtree_depth(child));
        let right = node.right.map_or(0, |child| self.subtree_depth(child));
        1 + left.max(right)
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

    fn free_node(&mut self, id: NodeId) -> Node<T> {
        let node = self.nodes[id].take().expect("freed node id is live");
        self.free.push(id);
        node
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id].as_ref().expect("node id is live")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id].as_mut().expect("node id is live")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn boxed(min: [f32; 3], max: [f32; 3]) -> Aabb {
        Aabb::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )
    }

    /// Recursively checks that every internal box is exactly the union of
    /// its children's boxes and that parent links are consistent.
    fn check_subtree<T>(tree: &AabbTree<T>, id: NodeId) -> Aabb {
        let node = tree.node(id);
        match (node.left, node.right) {
            (Some(left), Some(right)) => {
                assert!(node.data.is_none(), "internal node carries no payload");
                assert_eq!(tree.node(left).parent, Some(id), "left child back link");
                assert_eq!(tree.node(right).parent, Some(id), "right child back link");
                let merged = check_subtree(tree, left).union(&check_subtree(tree, right));
                assert_eq!(node.bounds, merged, "internal box is union of children");
                merged
            }
            (None, None) => {
                assert!(node.data.is_some(), "leaf carries a payload");
                node.bounds
            }
            _ => panic!("node has exactly zero or two children"),
        }
    }

    fn assert_tight(tree: &AabbTree<i32>) {
        if let Some(root) = tree.root {
            assert_eq!(tree.node(root).parent, None, "root has no parent");
            let _ = check_subtree(tree, root);
        } else {
            assert_eq!(tree.len(), 0);
        }
    }

    fn leaf_data(tree: &AabbTree<i32>, id: NodeId, out: &mut Vec<i32>) {
        let node = tree.node(id);
        if let Some(data) = &node.data {
            out.push(*data);
        }
        if let Some(left) = node.left {
            leaf_data(tree, left, out);
        }
        if let Some(right) = node.right {
            leaf_data(tree, right, out);
        }
    }

    #[test]
    fn empty_tree() {
        let tree: AabbTree<i32> = AabbTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.root_bounds(), None);
    }

    #[test]
    fn root_box_is_union_of_leaves() {
        let mut tree = AabbTree::new();
        tree.insert(boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), "a");
        tree.insert(boxed([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]), "b");

        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.root_bounds(),
            Some(boxed([0.0, 0.0, 0.0], [6.0, 6.0, 6.0]))
        );

        tree.remove(&"a");
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.root_bounds(),
            Some(boxed([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]))
        );
    }

    #[test]
    fn remove_missing_payload_is_noop() {
        let mut tree = AabbTree::new();
        tree.insert(boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 1);
        tree.insert(boxed([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]), 2);
        let before = tree.root_bounds();

        tree.remove(&99);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root_bounds(), before);
        assert_tight(&tree);
    }

    #[test]
    fn remove_all_leaves_in_scrambled_order() {
        let mut tree = AabbTree::new();
        for i in 0..6 {
            let offset = i as f32 * 2.0;
            tree.insert(boxed([offset, 0.0, 0.0], [offset + 1.0, 1.0, 1.0]), i);
        }

        for i in [3, 0, 5, 1, 4, 2] {
            tree.remove(&i);
            assert_tight(&tree);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn remove_bounds_requires_exact_match() {
        let mut tree = AabbTree::new();
        let a = boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = boxed([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        tree.insert(a, 1);
        tree.insert(b, 2);

        // Contained but not identical: nothing happens.
        tree.remove_bounds(&boxed([0.1, 0.1, 0.1], [0.9, 0.9, 0.9]));
        assert_eq!(tree.len(), 2);

        tree.remove_bounds(&a);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_bounds(), Some(b));
        assert_tight(&tree);
    }

    #[test]
    fn remove_bounds_outside_tree_is_noop() {
        let mut tree: AabbTree<i32> = AabbTree::new();
        tree.remove_bounds(&boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]));
        assert!(tree.is_empty());

        tree.insert(boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 1);
        tree.insert(boxed([4.0, 0.0, 0.0], [5.0, 1.0, 1.0]), 2);
        tree.remove_bounds(&boxed([10.0, 10.0, 10.0], [11.0, 11.0, 11.0]));
        assert_eq!(tree.len(), 2);
        assert_tight(&tree);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut tree: AabbTree<i32> = AabbTree::new();
        tree.clear();
        assert!(tree.is_empty());

        for i in 0..8 {
            let offset = i as f32;
            tree.insert(boxed([offset, 0.0, 0.0], [offset + 0.5, 1.0, 1.0]), i);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.root_bounds(), None);

        tree.clear();
        assert!(tree.is_empty());
    }

    #[test]
    fn tie_breaks_toward_first_child() {
        let mut tree = AabbTree::new();
        tree.insert(boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 1);
        tree.insert(boxed([4.0, 0.0, 0.0], [5.0, 1.0, 1.0]), 2);

        // Equidistant between both leaves: either union has volume 3.
        tree.insert(boxed([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]), 3);
        assert_tight(&tree);

        let root = tree.root.unwrap();
        let left = tree.node(root).left.unwrap();
        let mut grouped = Vec::new();
        leaf_data(&tree, left, &mut grouped);
        grouped.sort_unstable();
        assert_eq!(grouped, vec![1, 3], "tie joins the first child's subtree");
    }

    #[test]
    fn query_reports_overlapping_leaves() {
        let mut tree = AabbTree::new();
        for i in 0..5 {
            let offset = i as f32 * 2.0;
            tree.insert(boxed([offset, 0.0, 0.0], [offset + 1.0, 1.0, 1.0]), i);
        }

        let probe = boxed([1.5, 0.0, 0.0], [4.5, 1.0, 1.0]);
        let mut hits = Vec::new();
        tree.query(&probe, |_, data| hits.push(*data));
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);

        let mut far_hits: Vec<i32> = Vec::new();
        tree.query(&boxed([50.0, 0.0, 0.0], [51.0, 1.0, 1.0]), |_, data| {
            far_hits.push(*data)
        });
        assert!(far_hits.is_empty());
    }

    #[test]
    fn random_mutations_keep_bounds_tight() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = AabbTree::new();

        for i in 0..48 {
            let min = [
                rng.random_range(-10.0..10.0f32),
                rng.random_range(-10.0..10.0f32),
                rng.random_range(-10.0..10.0f32),
            ];
            let size = [
                rng.random_range(0.1..3.0f32),
                rng.random_range(0.1..3.0f32),
                rng.random_range(0.1..3.0f32),
            ];
            tree.insert(
                boxed(min, [min[0] + size[0], min[1] + size[1], min[2] + size[2]]),
                i,
            );
            assert_tight(&tree);
        }
        assert_eq!(tree.len(), 48);

        let mut order: Vec<i32> = (0..48).collect();
        order.shuffle(&mut rng);
        for (removed, i) in order.into_iter().enumerate() {
            tree.remove(&i);
            assert_eq!(tree.len(), 47 - removed);
            assert_tight(&tree);
        }
        assert!(tree.is_empty());
    }
}
