//! # rbtree-rs
//!
//! An ordered set backed by a red-black tree whose nodes live in an arena.
//!
//! Links between nodes are arena indices, so the parent back-reference never
//! owns anything and no `unsafe` or reference counting is needed.
//!
//! ## Example
//!
//! ```rust
//! use rbtree_rs::{Color, Error, RbTree};
//!
//! let mut tree = RbTree::new();
//! tree.insert(1).unwrap();
//! tree.insert(2).unwrap();
//! tree.insert(3).unwrap();
//!
//! let root = tree.root().unwrap();
//! assert_eq!(*root.key(), 2);
//! assert_eq!(root.color(), Color::Black);
//! assert_eq!(tree.insert(2), Err(Error::DuplicateKey));
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

#![forbid(unsafe_code)]

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use log::{debug, trace};

pub mod dot;
mod error;

pub use error::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Maximum number of nodes a tree can hold. `u32::MAX` itself is reserved
/// for the NIL link.
pub const MAX_NODES: usize = u32::MAX as usize;

// =============================================================================
// Node links
// =============================================================================

/// Arena index of a node.
///
/// `NIL` stands for every absent child and for the root's parent. It is
/// never dereferenced; color lookups treat it as black.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(u32);

impl NodeId {
    const NIL: NodeId = NodeId(u32::MAX);

    #[inline]
    fn new(index: usize) -> Self {
        debug_assert!(index < MAX_NODES);
        Self(index as u32)
    }

    #[inline]
    fn is_nil(self) -> bool {
        self == Self::NIL
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_nil());
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            f.write_str("NIL")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Node color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

/// Which child slot of a node. Every structural operation is written once in
/// terms of `Side` and its mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

#[derive(Clone, Debug)]
struct Node<K> {
    key: K,
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
}

impl<K> Node<K> {
    fn new_red(key: K, parent: NodeId) -> Self {
        Self {
            key,
            color: Color::Red,
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
        }
    }

    #[inline]
    fn child(&self, side: Side) -> NodeId {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn child_mut(&mut self, side: Side) -> &mut NodeId {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

// =============================================================================
// RbTree
// =============================================================================

/// An ordered set of unique keys kept balanced as a red-black tree.
///
/// After every successful [`insert`](RbTree::insert):
/// - the root is black,
/// - no red node has a red parent,
/// - every root-to-NIL path crosses the same number of black nodes,
/// - the in-order key sequence is strictly increasing.
///
/// There is no removal, so the arena only grows and a node's index is stable
/// for the lifetime of the tree (or until [`clear`](RbTree::clear)).
#[derive(Clone)]
pub struct RbTree<K> {
    nodes: Vec<Node<K>>,
    root: NodeId,
}

impl<K> RbTree<K> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId::NIL,
        }
    }

    /// Create an empty tree with room for `capacity` nodes before the arena
    /// reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.min(MAX_NODES)),
            root: NodeId::NIL,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NodeId::NIL;
    }

    /// Read-only handle on the root node, for walking the tree shape.
    pub fn root(&self) -> Option<NodeRef<'_, K>> {
        NodeRef::new(self, self.root)
    }

    // === Arena access ===

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    fn parent_of(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    /// NIL reads as black.
    #[inline]
    fn color_of(&self, id: NodeId) -> Color {
        if id.is_nil() {
            Color::Black
        } else {
            self.node(id).color
        }
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    /// Which slot of `parent` holds `child`, if either does.
    fn side_of(&self, parent: NodeId, child: NodeId) -> Option<Side> {
        let node = self.node(parent);
        if node.left == child {
            Some(Side::Left)
        } else if node.right == child {
            Some(Side::Right)
        } else {
            None
        }
    }
}

// =============================================================================
// Insertion
// =============================================================================

impl<K: Ord> RbTree<K> {
    /// Insert `key`, rebalancing as needed.
    ///
    /// Fails with [`Error::DuplicateKey`] if an equal key is already stored;
    /// the tree is not modified in that case.
    pub fn insert(&mut self, key: K) -> Result<()> {
        let mut parent = NodeId::NIL;
        let mut side = Side::Left;
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = self.node(cur);
            side = match key.cmp(&node.key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => {
                    debug!("insert: rejecting duplicate key (matches node {cur:?})");
                    return Err(Error::DuplicateKey);
                }
            };
            parent = cur;
            cur = node.child(side);
        }

        if self.nodes.len() >= MAX_NODES {
            return Err(Error::CapacityExceeded { limit: MAX_NODES });
        }

        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new_red(key, parent));
        if parent.is_nil() {
            self.root = id;
        } else {
            *self.node_mut(parent).child_mut(side) = id;
        }
        trace!("insert: attached {id:?} under {parent:?} ({side:?})");

        self.fix_after_insert(id)
    }

    /// Build a tree by inserting keys in iteration order, stopping at the
    /// first rejected key.
    pub fn try_from_iter<I: IntoIterator<Item = K>>(iter: I) -> Result<Self> {
        // Grow with the input; the size hint can be far past what gets stored.
        let mut tree = Self::new();
        for key in iter {
            tree.insert(key)?;
        }
        Ok(tree)
    }
}

// =============================================================================
// Rebalancing
// =============================================================================

impl<K> RbTree<K> {
    /// Restore the red-black invariants after `node` was attached as a red
    /// leaf. Walks upward while the red-uncle case keeps pushing the red
    /// violation towards the root.
    fn fix_after_insert(&mut self, mut node: NodeId) -> Result<()> {
        loop {
            let mut parent = self.parent_of(node);

            if parent.is_nil() {
                trace!("fixup: {node:?} is the root, coloring black");
                self.set_color(node, Color::Black);
                return Ok(());
            }

            if self.color_of(parent) == Color::Black {
                return Ok(());
            }

            // Parent is red, so it is not the root and a grandparent exists.
            let grandparent = self.parent_of(parent);
            let uncle = self.uncle(parent)?;

            if self.color_of(uncle) == Color::Red {
                trace!("fixup: red uncle {uncle:?}, recoloring and moving up to {grandparent:?}");
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            let parent_side = self
                .side_of(grandparent, parent)
                .ok_or(Error::InvariantViolation("parent is not a child of its grandparent"))?;
            let node_side = self
                .side_of(parent, node)
                .ok_or(Error::InvariantViolation("node is not a child of its parent"))?;

            if node_side != parent_side {
                trace!("fixup: inner child {node:?}, rotating parent {parent:?} {parent_side:?}");
                self.rotate(parent, parent_side)?;
                parent = node;
            }

            trace!(
                "fixup: outer child, rotating grandparent {grandparent:?} {:?}",
                parent_side.opposite()
            );
            self.rotate(grandparent, parent_side.opposite())?;
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            return Ok(());
        }
    }

    /// Sibling of `parent` under its own parent. NIL when absent.
    fn uncle(&self, parent: NodeId) -> Result<NodeId> {
        let grandparent = self.parent_of(parent);
        if grandparent.is_nil() {
            return Err(Error::InvariantViolation("red parent has no grandparent"));
        }
        let side = self
            .side_of(grandparent, parent)
            .ok_or(Error::InvariantViolation("parent is not a child of its grandparent"))?;
        Ok(self.node(grandparent).child(side.opposite()))
    }

    /// Rotate `node` down towards `dir`: the child on the other side (the
    /// pivot) takes its place and `node` becomes the pivot's `dir` child.
    ///
    /// `Side::Left` is a left rotation, `Side::Right` a right rotation.
    /// In-order key sequence is unchanged.
    fn rotate(&mut self, node: NodeId, dir: Side) -> Result<()> {
        let pivot_side = dir.opposite();
        let parent = self.parent_of(node);
        let pivot = self.node(node).child(pivot_side);
        if pivot.is_nil() {
            return Err(Error::InvariantViolation("rotation pivot is NIL"));
        }

        // The pivot's inner subtree moves across to `node`.
        let inner = self.node(pivot).child(dir);
        *self.node_mut(node).child_mut(pivot_side) = inner;
        if !inner.is_nil() {
            self.node_mut(inner).parent = node;
        }

        *self.node_mut(pivot).child_mut(dir) = node;
        self.node_mut(node).parent = pivot;

        self.replace_parents_child(parent, node, pivot)
    }

    /// Point whichever slot of `parent` held `old_child` at `new_child`.
    /// A NIL `parent` means `old_child` was the root.
    fn replace_parents_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<()> {
        if parent.is_nil() {
            self.root = new_child;
        } else {
            let side = self
                .side_of(parent, old_child)
                .ok_or(Error::InvariantViolation("node is not a child of its parent"))?;
            *self.node_mut(parent).child_mut(side) = new_child;
        }

        if !new_child.is_nil() {
            self.node_mut(new_child).parent = parent;
        }
        Ok(())
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<K> RbTree<K> {
    fn find<Q>(&self, key: &Q) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = self.node(cur);
            cur = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return cur,
            };
        }
        NodeId::NIL
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(key).is_nil()
    }

    /// The stored key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key);
        (!id.is_nil()).then(|| &self.node(id).key)
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        self.extreme(Side::Left)
    }

    /// Largest key.
    pub fn last(&self) -> Option<&K> {
        self.extreme(Side::Right)
    }

    fn extreme(&self, side: Side) -> Option<&K> {
        if self.root.is_nil() {
            return None;
        }
        let mut cur = self.root;
        loop {
            let next = self.node(cur).child(side);
            if next.is_nil() {
                return Some(&self.node(cur).key);
            }
            cur = next;
        }
    }

    /// Smallest stored key that is greater than or equal to `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut best = NodeId::NIL;
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = self.node(cur);
            match key.cmp(node.key.borrow()) {
                Ordering::Less => {
                    best = cur;
                    cur = node.left;
                }
                Ordering::Greater => cur = node.right,
                Ordering::Equal => return Some(&node.key),
            }
        }
        (!best.is_nil()).then(|| &self.node(best).key)
    }

    /// Number of nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, 1));
        }
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            let node = self.node(id);
            for child in [node.left, node.right] {
                if !child.is_nil() {
                    stack.push((child, depth + 1));
                }
            }
        }
        max
    }

    /// Black nodes between the root and a NIL position, not counting the root
    /// itself or the NIL. Every path agrees on this value (see
    /// [`validate`](RbTree::validate)), so the leftmost path is used.
    pub fn black_height(&self) -> usize {
        if self.root.is_nil() {
            return 0;
        }
        let mut count = 0;
        let mut cur = self.node(self.root).left;
        while !cur.is_nil() {
            if self.color_of(cur) == Color::Black {
                count += 1;
            }
            cur = self.node(cur).left;
        }
        count
    }

    /// In-order iterator over the keys.
    pub fn iter(&self) -> Iter<'_, K> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.nodes.len(),
        };
        iter.push_left_spine(self.root);
        iter
    }
}

// =============================================================================
// Validation
// =============================================================================

impl<K: Ord> RbTree<K> {
    /// Check every red-black invariant and the consistency of the node links.
    ///
    /// Returns [`Error::InvariantViolation`] describing the first problem
    /// found. A tree built only through [`insert`](RbTree::insert) always
    /// passes.
    pub fn validate(&self) -> Result<()> {
        if self.root.is_nil() {
            return if self.nodes.is_empty() {
                Ok(())
            } else {
                Err(Error::InvariantViolation("non-empty arena has no root"))
            };
        }
        if self.root.index() >= self.nodes.len() {
            return Err(Error::InvariantViolation("dangling node link"));
        }
        if !self.parent_of(self.root).is_nil() {
            return Err(Error::InvariantViolation("root has a parent"));
        }
        if self.color_of(self.root) != Color::Black {
            return Err(Error::InvariantViolation("root is red"));
        }

        let mut reached = 0;
        self.validate_subtree(self.root, None, None, &mut reached)?;
        if reached != self.nodes.len() {
            return Err(Error::InvariantViolation("arena holds unreachable nodes"));
        }
        Ok(())
    }

    /// Returns the black count of the subtree rooted at `id`, including `id`.
    fn validate_subtree(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        reached: &mut usize,
    ) -> Result<usize> {
        if id.is_nil() {
            return Ok(0);
        }
        let node = self
            .nodes
            .get(id.index())
            .ok_or(Error::InvariantViolation("dangling node link"))?;

        // Every child visited below points back at its parent and the root
        // has none, so the walk cannot loop.
        *reached += 1;

        if lower.is_some_and(|lo| node.key <= *lo) || upper.is_some_and(|hi| node.key >= *hi) {
            return Err(Error::InvariantViolation("keys are out of order"));
        }

        for child in [node.left, node.right] {
            if child.is_nil() {
                continue;
            }
            let child_node = self
                .nodes
                .get(child.index())
                .ok_or(Error::InvariantViolation("dangling node link"))?;
            if child_node.parent != id {
                return Err(Error::InvariantViolation("child does not point back at its parent"));
            }
            if node.color == Color::Red && child_node.color == Color::Red {
                return Err(Error::InvariantViolation("red node has a red child"));
            }
        }

        let left = self.validate_subtree(node.left, lower, Some(&node.key), reached)?;
        let right = self.validate_subtree(node.right, Some(&node.key), upper, reached)?;
        if left != right {
            return Err(Error::InvariantViolation("black heights differ between subtrees"));
        }
        Ok(left + usize::from(node.color == Color::Black))
    }
}

// =============================================================================
// Read-only node handle
// =============================================================================

/// Borrowed view of one node: its key, color and children.
pub struct NodeRef<'a, K> {
    tree: &'a RbTree<K>,
    id: NodeId,
}

impl<'a, K> NodeRef<'a, K> {
    fn new(tree: &'a RbTree<K>, id: NodeId) -> Option<Self> {
        (!id.is_nil()).then_some(Self { tree, id })
    }

    #[inline]
    fn node(&self) -> &'a Node<K> {
        self.tree.node(self.id)
    }

    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    pub fn color(&self) -> Color {
        self.node().color
    }

    pub fn is_red(&self) -> bool {
        self.color() == Color::Red
    }

    pub fn is_black(&self) -> bool {
        self.color() == Color::Black
    }

    pub fn left(&self) -> Option<NodeRef<'a, K>> {
        NodeRef::new(self.tree, self.node().left)
    }

    pub fn right(&self) -> Option<NodeRef<'a, K>> {
        NodeRef::new(self.tree, self.node().right)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K>> {
        NodeRef::new(self.tree, self.node().parent)
    }
}

impl<K> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<'_, K> {}

impl<K> PartialEq for NodeRef<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<K> Eq for NodeRef<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for NodeRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K> Default for RbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for RbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K> IntoIterator for &'a RbTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// In-order iterator over the keys of an [`RbTree`].
pub struct Iter<'a, K> {
    tree: &'a RbTree<K>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<K> Iter<'_, K> {
    fn push_left_spine(&mut self, mut id: NodeId) {
        while !id.is_nil() {
            self.stack.push(id);
            id = self.tree.node(id).left;
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> std::iter::FusedIterator for Iter<'_, K> {}

// =============================================================================
// Tests
// =============================================================================



#[cfg(test)]
mod proptests;
