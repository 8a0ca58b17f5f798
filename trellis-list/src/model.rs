use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a single row.
///
/// Every item reachable from the root must be unique; the adapter uses it to
/// find wrappers again after the source changes.
pub trait Item: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Item for T {}

/// Trait implemented by tree node types consumable by this crate.
pub trait TreeNode {
    /// Identity reported by [`TreeNode::item`].
    type Item: Item;

    /// Stable identity of this node.
    fn item(&self) -> Self::Item;

    /// Number of immediate children.
    fn count(&self) -> usize;

    /// Child at `index`. Called only with `index < self.count()`.
    fn node_at(&self, index: usize) -> &Self;

    /// Index of the child whose subtree contains `item`, if any.
    ///
    /// The default walks the whole subtree. Sources with a faster lookup
    /// (parent pointers, path encoded in the identity) should override it.
    fn item_index(&self, item: &Self::Item) -> Option<usize> {
        (0..self.count()).find(|&index| {
            let child = self.node_at(index);
            child.item() == *item || child.item_index(item).is_some()
        })
    }

    /// Whether this node can never be expanded.
    fn is_leaf(&self) -> bool {
        self.count() == 0
    }
}

/// The top level of a tree: a sequence of root nodes without an identity of
/// its own.
pub trait TreeNodeContainer {
    type Node: TreeNode;

    /// Number of top-level nodes.
    fn count(&self) -> usize;

    /// Top-level node at `index`. Called only with `index < self.count()`.
    fn node_at(&self, index: usize) -> &Self::Node;

    /// Index of the top-level node whose subtree contains `item`, if any.
    fn item_index(
        &self,
        item: &<Self::Node as TreeNode>::Item,
    ) -> Option<usize> {
        (0..self.count()).find(|&index| {
            let child = self.node_at(index);
            child.item() == *item || child.item_index(item).is_some()
        })
    }
}

impl<T: TreeNode> TreeNodeContainer for [T] {
    type Node = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn node_at(&self, index: usize) -> &T {
        &self[index]
    }
}

impl<T: TreeNode> TreeNodeContainer for Vec<T> {
    type Node = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn node_at(&self, index: usize) -> &T {
        &self[index]
    }
}

/// The index-addressable contract consumed by list views.
pub trait ListAdapter {
    type Item: Item;

    /// Number of rows.
    fn count(&self) -> usize;

    /// Item at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.count()`.
    fn item_at(&self, index: usize) -> Self::Item;

    /// Row of `item`, or `None` when it is not part of the list.
    fn item_index(&self, item: &Self::Item) -> Option<usize>;

    /// Whether `item` is one of the rows.
    fn contains_item(&self, item: &Self::Item) -> bool {
        self.item_index(item).is_some()
    }
}

impl<T: Item> ListAdapter for [T] {
    type Item = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> T {
        self[index].clone()
    }

    fn item_index(&self, item: &T) -> Option<usize> {
        self.iter().position(|candidate| candidate == item)
    }
}

impl<T: Item> ListAdapter for Vec<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> T {
        self[index].clone()
    }

    fn item_index(&self, item: &T) -> Option<usize> {
        ListAdapter::item_index(self.as_slice(), item)
    }
}
