//! Arena of expandable wrapper nodes.
//!
//! Each wrapper mirrors one source node. The source node itself is never
//! stored: a wrapper records its child index within the parent, so the path
//! from the synthetic root resolves it against the source on demand. Parent
//! links are arena indices, so dropping the arena tears everything down.

use crate::error::{ListError, Result};
use crate::model::{TreeNode, TreeNodeContainer};

/// Handle of a wrapper inside a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root wrapping the [`TreeNodeContainer`].
    pub(crate) const ROOT: NodeId = NodeId(0);
}

#[derive(Debug)]
pub(crate) struct ExpandableNode<I> {
    /// `None` only for the synthetic root.
    pub(crate) item: Option<I>,
    pub(crate) parent: Option<NodeId>,
    /// Index of this node within its parent's children.
    pub(crate) index: usize,
    /// `None` until the node is expanded for the first time.
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) expanded: bool,
    pub(crate) leaf: bool,
    /// Distance from the synthetic root minus one; top-level rows are `0`.
    pub(crate) depth: usize,
    /// Rows this node shows below itself, assuming it is visible.
    pub(crate) shown: usize,
}

#[derive(Debug)]
pub(crate) struct NodeArena<I> {
    nodes: Vec<ExpandableNode<I>>,
}

impl<I> NodeArena<I> {
    /// Create an arena holding only the synthetic root. The root is always
    /// expanded; its children are materialized by the adapter.
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![ExpandableNode {
                item: None,
                parent: None,
                index: 0,
                children: None,
                expanded: true,
                leaf: false,
                depth: 0,
                shown: 0,
            }],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &ExpandableNode<I> {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut ExpandableNode<I> {
        &mut self.nodes[id.0]
    }

    /// Append a child wrapper of `parent` and return its handle. The caller
    /// is responsible for storing it in the parent's children.
    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        index: usize,
        item: I,
        leaf: bool,
    ) -> NodeId {
        let depth = if parent == NodeId::ROOT {
            0
        } else {
            self.get(parent).depth + 1
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(ExpandableNode {
            item: Some(item),
            parent: Some(parent),
            index,
            children: None,
            expanded: false,
            leaf,
            depth,
            shown: 0,
        });
        id
    }

    /// Collapse every node except the synthetic root. Cached row counts
    /// are left stale.
    pub(crate) fn collapse_all(&mut self) {
        for node in self.nodes.iter_mut().skip(1) {
            node.expanded = false;
        }
    }

    /// Whether every ancestor of `id` is expanded.
    pub(crate) fn is_visible(&self, id: NodeId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            let node = self.get(parent);
            if !node.expanded {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Row of a visible node, computed from the cached `shown` counts of the
    /// preceding siblings of each ancestor.
    pub(crate) fn row_of(&self, id: NodeId) -> usize {
        let mut row = 0;
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            let index = self.get(current).index;
            if let Some(siblings) = &self.get(parent).children {
                row += siblings[..index]
                    .iter()
                    .map(|&sibling| 1 + self.get(sibling).shown)
                    .sum::<usize>();
            }
            if parent != NodeId::ROOT {
                row += 1;
            }
            current = parent;
        }
        row
    }

    /// Add `delta` rows to `id` and every ancestor that currently shows its
    /// children, stopping at the first collapsed one.
    pub(crate) fn grow(&mut self, id: NodeId, delta: usize) {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            let node = self.get_mut(parent);
            if !node.expanded {
                break;
            }
            node.shown += delta;
            current = node.parent;
        }
    }

    /// Counterpart of [`NodeArena::grow`].
    pub(crate) fn shrink(&mut self, id: NodeId, delta: usize) {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            let node = self.get_mut(parent);
            if !node.expanded {
                break;
            }
            node.shown -= delta;
            current = node.parent;
        }
    }

    /// Append the rows under `id` in pre-order, following only expanded
    /// nodes. `id` itself is not included.
    pub(crate) fn collect_rows(&self, id: NodeId, rows: &mut Vec<NodeId>) {
        let node = self.get(id);
        if !node.expanded {
            return;
        }
        if let Some(children) = &node.children {
            for &child in children {
                rows.push(child);
                self.collect_rows(child, rows);
            }
        }
    }

    /// Child indices from the synthetic root down to `id`.
    pub(crate) fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::with_capacity(self.get(id).depth + 1);
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            path.push(self.get(current).index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Ancestors of `id`, nearest first, excluding the synthetic root.
    pub(crate) fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if parent == NodeId::ROOT {
                break;
            }
            ancestors.push(parent);
            current = self.get(parent).parent;
        }
        ancestors
    }
}

/// Resolve the source node at `path`.
///
/// Fails with [`ListError::OutOfSync`] when the source no longer has a node
/// at one of the recorded indices. An empty path has no source node.
pub(crate) fn resolve<'s, S>(
    source: &'s S,
    path: &[usize],
) -> Result<Option<&'s S::Node>>
where
    S: TreeNodeContainer + ?Sized,
{
    let Some((&first, rest)) = path.split_first() else {
        return Ok(None);
    };
    if first >= source.count() {
        return Err(ListError::OutOfSync {
            depth: 0,
            index: first,
        });
    }
    let mut node = source.node_at(first);
    for (depth, &index) in rest.iter().enumerate() {
        if index >= node.count() {
            return Err(ListError::OutOfSync {
                depth: depth + 1,
                index,
            });
        }
        node = node.node_at(index);
    }
    Ok(Some(node))
}
