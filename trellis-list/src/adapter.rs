//! Projection of a lazily expanded tree onto a flat list of rows.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use log::{debug, trace, warn};

use crate::error::{ListError, Result};
use crate::event::{Event, ListEvent};
use crate::model::{Item, ListAdapter, TreeNode, TreeNodeContainer};
use crate::node::{NodeArena, NodeId, resolve};
use crate::options::{AdapterOptions, DuplicateItems};

/// Flattened wrapper tree plus the reverse index into it.
struct Projection<I> {
    options: AdapterOptions,
    arena: NodeArena<I>,
    /// Visible wrappers in pre-order.
    rows: Vec<NodeId>,
    /// Every materialized wrapper, visible or not.
    lookup: HashMap<I, NodeId>,
    /// Items that expand as soon as their wrapper is materialized.
    pending: HashSet<I>,
}

impl<I: Item> Projection<I> {
    fn new(options: AdapterOptions) -> Self {
        Self {
            options,
            arena: NodeArena::new(),
            rows: Vec::new(),
            lookup: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    /// Build a projection of `source` where the nodes listed in `expanded`
    /// are expanded. Nodes below a collapsed ancestor are restored when the
    /// ancestor materializes its children.
    fn build<S>(
        source: &S,
        options: AdapterOptions,
        expanded: HashSet<I>,
    ) -> Result<Self>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let mut projection = Self::new(options);
        projection.pending = expanded;
        projection.attach(NodeId::ROOT, container_entries(source))?;
        let children = projection.children(NodeId::ROOT);
        for (index, id) in children.into_iter().enumerate() {
            projection.restore(id, source.node_at(index))?;
        }
        projection.drop_stale_pending(source);
        projection.refresh_rows();
        Ok(projection)
    }

    /// Forget pending items that `source` no longer contains.
    fn drop_stale_pending<S>(&mut self, source: &S)
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        if self.pending.is_empty() {
            return;
        }
        let mut live = HashSet::with_capacity(self.pending.len());
        for index in 0..source.count() {
            self.collect_live(source.node_at(index), &mut live);
        }
        let dropped = self.pending.len() - live.len();
        if dropped > 0 {
            debug!("dropped {dropped} expanded items missing from the source");
        }
        self.pending = live;
    }

    fn collect_live<N>(&self, node: &N, live: &mut HashSet<I>)
    where
        N: TreeNode<Item = I>,
    {
        if live.len() == self.pending.len() {
            return;
        }
        let item = node.item();
        if self.pending.contains(&item) {
            live.insert(item);
        }
        for index in 0..node.count() {
            self.collect_live(node.node_at(index), live);
        }
    }

    /// Expand `id` and its descendants if they are pending. Leaves the
    /// cached row counts stale.
    fn restore<N>(&mut self, id: NodeId, node: &N) -> Result<()>
    where
        N: TreeNode<Item = I>,
    {
        let wrapper = self.arena.get(id);
        let Some(item) = wrapper.item.as_ref() else {
            return Ok(());
        };
        if !self.pending.remove(item) || wrapper.leaf {
            return Ok(());
        }
        if wrapper.children.is_none() {
            self.attach(id, node_entries(node))?;
        }
        self.arena.get_mut(id).expanded = true;
        for (index, child) in self.children(id).into_iter().enumerate() {
            self.restore(child, node.node_at(index))?;
        }
        Ok(())
    }

    /// Materialize the children of `parent` from `entries`.
    fn attach(&mut self, parent: NodeId, entries: Vec<(I, bool)>) -> Result<()> {
        if self.options.duplicate_items == DuplicateItems::Reject {
            let mut seen = HashSet::with_capacity(entries.len());
            for (item, _) in &entries {
                if self.lookup.contains_key(item) || !seen.insert(item) {
                    return Err(ListError::duplicate(item));
                }
            }
        }

        let mut children = Vec::with_capacity(entries.len());
        for (index, (item, leaf)) in entries.into_iter().enumerate() {
            let id = self.arena.push_child(parent, index, item.clone(), leaf);
            match self.lookup.entry(item) {
                Entry::Occupied(entry) => warn!(
                    "item {:?} is reported by more than one node; \
                     lookups resolve to the first one",
                    entry.key()
                ),
                Entry::Vacant(entry) => {
                    entry.insert(id);
                },
            }
            children.push(id);
        }
        self.arena.get_mut(parent).children = Some(children);
        Ok(())
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena.get(id).children.clone().unwrap_or_default()
    }

    /// Materialize the children of `id` from the source if needed.
    fn ensure_children<N>(&mut self, id: NodeId, node: &N) -> Result<()>
    where
        N: TreeNode<Item = I>,
    {
        if self.arena.get(id).children.is_some() {
            return Ok(());
        }
        self.attach(id, node_entries(node))?;
        if self.pending.is_empty() {
            return Ok(());
        }
        for (index, child) in self.children(id).into_iter().enumerate() {
            self.restore(child, node.node_at(index))?;
            self.compute_shown(child);
        }
        Ok(())
    }

    /// Find the wrapper of `item`, materializing the wrappers on its path
    /// without changing their expansion state.
    fn locate<S>(&mut self, source: &S, item: &I) -> Result<NodeId>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        if let Some(&id) = self.lookup.get(item) {
            return Ok(id);
        }

        let index = source
            .item_index(item)
            .ok_or_else(|| ListError::not_found(item))?;
        let mut id = self.child_at(NodeId::ROOT, index)?;
        let mut node = source.node_at(index);
        loop {
            if node.item() == *item {
                return Ok(id);
            }
            let index = node
                .item_index(item)
                .ok_or_else(|| ListError::not_found(item))?;
            self.ensure_children(id, node)?;
            id = self.child_at(id, index)?;
            node = node.node_at(index);
        }
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Result<NodeId> {
        self.arena
            .get(parent)
            .children
            .as_ref()
            .and_then(|children| children.get(index).copied())
            .ok_or(ListError::OutOfSync {
                depth: self.depth_below(parent),
                index,
            })
    }

    fn depth_below(&self, parent: NodeId) -> usize {
        if parent == NodeId::ROOT {
            0
        } else {
            self.arena.get(parent).depth + 1
        }
    }

    /// Expand `id`, splicing its descendants in when it is visible. Returns
    /// the row and number of inserted rows when the list changed.
    fn expand<S>(
        &mut self,
        source: &S,
        id: NodeId,
    ) -> Result<Option<(Option<usize>, usize)>>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let wrapper = self.arena.get(id);
        if wrapper.leaf || wrapper.expanded {
            return Ok(None);
        }
        if wrapper.children.is_none() {
            let path = self.arena.path(id);
            let Some(node) = resolve(source, &path)? else {
                return Ok(None);
            };
            self.ensure_children(id, node)?;
        }

        self.arena.get_mut(id).expanded = true;
        let mut inserted = Vec::new();
        self.arena.collect_rows(id, &mut inserted);
        let delta = inserted.len();
        self.arena.get_mut(id).shown = delta;
        self.arena.grow(id, delta);

        if !self.arena.is_visible(id) {
            return Ok(Some((None, delta)));
        }
        let row = self.arena.row_of(id);
        self.rows.splice(row + 1..row + 1, inserted);
        trace!("expanded row {row}: {delta} rows inserted");
        Ok(Some((Some(row), delta)))
    }

    /// Collapse `id`, removing its descendants when it is visible.
    fn collapse(&mut self, id: NodeId) -> Option<(Option<usize>, usize)> {
        let wrapper = self.arena.get(id);
        if id == NodeId::ROOT || !wrapper.expanded {
            return None;
        }
        let delta = wrapper.shown;
        self.arena.shrink(id, delta);
        let wrapper = self.arena.get_mut(id);
        wrapper.expanded = false;
        wrapper.shown = 0;

        if !self.arena.is_visible(id) {
            return Some((None, delta));
        }
        let row = self.arena.row_of(id);
        self.rows.drain(row + 1..row + 1 + delta);
        trace!("collapsed row {row}: {delta} rows removed");
        Some((Some(row), delta))
    }

    fn expand_subtree<N>(&mut self, id: NodeId, node: &N) -> Result<()>
    where
        N: TreeNode<Item = I>,
    {
        if self.arena.get(id).leaf {
            return Ok(());
        }
        self.ensure_children(id, node)?;
        self.arena.get_mut(id).expanded = true;
        let children = self.children(id);
        if children.len() != node.count() {
            return Err(ListError::OutOfSync {
                depth: self.depth_below(id),
                index: children.len().min(node.count()),
            });
        }
        for (index, child) in children.into_iter().enumerate() {
            self.expand_subtree(child, node.node_at(index))?;
        }
        Ok(())
    }

    /// Recompute every cached row count and the row list.
    fn refresh_rows(&mut self) {
        self.compute_shown(NodeId::ROOT);
        self.rows.clear();
        self.arena.collect_rows(NodeId::ROOT, &mut self.rows);
    }

    fn compute_shown(&mut self, id: NodeId) -> usize {
        let mut shown = 0;
        if self.arena.get(id).expanded {
            for child in self.children(id) {
                shown += 1 + self.compute_shown(child);
            }
        } else {
            for child in self.children(id) {
                self.compute_shown(child);
            }
        }
        self.arena.get_mut(id).shown = shown;
        shown
    }

    fn expanded_items(&self, visible_only: bool) -> HashSet<I> {
        let expanded = |id: &NodeId| {
            let wrapper = self.arena.get(*id);
            wrapper.expanded.then(|| wrapper.item.clone()).flatten()
        };
        if visible_only {
            self.rows.iter().filter_map(expanded).collect()
        } else {
            self.lookup
                .values()
                .filter_map(expanded)
                .chain(self.pending.iter().cloned())
                .collect()
        }
    }
}

fn container_entries<S>(source: &S) -> Vec<(<S::Node as TreeNode>::Item, bool)>
where
    S: TreeNodeContainer + ?Sized,
{
    (0..source.count())
        .map(|index| {
            let node = source.node_at(index);
            (node.item(), node.is_leaf())
        })
        .collect()
}

fn node_entries<N: TreeNode>(node: &N) -> Vec<(N::Item, bool)> {
    (0..node.count())
        .map(|index| {
            let child = node.node_at(index);
            (child.item(), child.is_leaf())
        })
        .collect()
}

/// Presents a hierarchical [`TreeNodeContainer`] as a flat [`ListAdapter`].
///
/// Rows are the pre-order traversal of every node reachable through expanded
/// nodes. Children are materialized the first time their parent expands;
/// expanding or collapsing a node only splices that node's descendant range.
///
/// The adapter does not own the tree. Operations that read it take the source
/// by reference, and the application reports out-of-band mutations through
/// [`TreeToListAdapter::data_changed`] or [`TreeToListAdapter::data_replaced`].
pub struct TreeToListAdapter<I> {
    projection: Projection<I>,
    on_change: Event<ListEvent>,
}

impl<I: Item> TreeToListAdapter<I> {
    /// Create an adapter with every node collapsed.
    pub fn new<S>(source: &S) -> Self
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let options = AdapterOptions::default();
        let projection =
            Projection::build(source, options.clone(), HashSet::new())
                .unwrap_or_else(|error| {
                    // Only rejected duplicates fail a build, and the default
                    // options keep them.
                    warn!("building tree projection failed: {error}");
                    Projection::new(options)
                });
        Self {
            projection,
            on_change: Event::new(),
        }
    }

    /// Create an adapter with custom options.
    pub fn with_options<S>(source: &S, options: AdapterOptions) -> Result<Self>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        Ok(Self {
            projection: Projection::build(source, options, HashSet::new())?,
            on_change: Event::new(),
        })
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.projection.options
    }

    /// Change notifications for list views.
    pub fn on_change(&self) -> &Event<ListEvent> {
        &self.on_change
    }

    /// Number of visible rows.
    pub fn count(&self) -> usize {
        self.projection.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projection.rows.is_empty()
    }

    /// Item at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.count()`.
    pub fn item_at(&self, index: usize) -> I {
        let count = self.count();
        assert!(index < count, "row {index} out of range ({count} rows)");
        self.node_ref(self.projection.rows[index]).item().clone()
    }

    /// Row of `item`, or `None` when it is hidden behind a collapsed node or
    /// not part of the tree.
    pub fn item_index(&self, item: &I) -> Option<usize> {
        let &id = self.projection.lookup.get(item)?;
        self.projection
            .arena
            .is_visible(id)
            .then(|| self.projection.arena.row_of(id))
    }

    /// Wrapper of `item`, if it was materialized.
    pub fn node(&self, item: &I) -> Option<NodeRef<'_, I>> {
        self.projection.lookup.get(item).map(|&id| self.node_ref(id))
    }

    /// Wrapper at `row`.
    pub fn node_at(&self, row: usize) -> Option<NodeRef<'_, I>> {
        self.projection.rows.get(row).map(|&id| self.node_ref(id))
    }

    /// Visible wrappers with their rows.
    pub fn visible_nodes(
        &self,
    ) -> impl ExactSizeIterator<Item = (usize, NodeRef<'_, I>)> + '_ {
        self.projection
            .rows
            .iter()
            .enumerate()
            .map(|(row, &id)| (row, self.node_ref(id)))
    }

    /// Expand `item`. Returns `Ok(false)` for leaves and already expanded
    /// nodes. A node hidden behind a collapsed ancestor is expanded without
    /// changing the rows.
    pub fn expand<S>(&mut self, source: &S, item: &I) -> Result<bool>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let id = self.projection.locate(source, item)?;
        let changed = self.projection.expand(source, id)?;
        if let Some((Some(row), inserted)) = changed {
            self.on_change.emit(&ListEvent::Expanded { row, inserted });
        }
        Ok(changed.is_some())
    }

    /// Collapse `item`. Returns `Ok(false)` when it was not expanded.
    ///
    /// An item restored as expanded below a collapsed ancestor is collapsed
    /// without materializing it. Other items whose wrapper was never
    /// materialized are collapsed by definition, but without the source the
    /// adapter cannot tell them apart from unknown items, so both report
    /// [`ListError::ItemNotFound`].
    pub fn collapse(&mut self, item: &I) -> Result<bool> {
        let Some(&id) = self.projection.lookup.get(item) else {
            if self.projection.pending.remove(item) {
                return Ok(true);
            }
            return Err(ListError::not_found(item));
        };
        let changed = self.projection.collapse(id);
        if let Some((Some(row), removed)) = changed {
            self.on_change.emit(&ListEvent::Collapsed { row, removed });
        }
        Ok(changed.is_some())
    }

    /// Flip the expansion state of `item`.
    pub fn toggle_expanded<S>(&mut self, source: &S, item: &I) -> Result<bool>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let id = self.projection.locate(source, item)?;
        if self.projection.arena.get(id).expanded {
            self.collapse(item)
        } else {
            self.expand(source, item)
        }
    }

    /// Expand every ancestor of `item` and return its row.
    pub fn show<S>(&mut self, source: &S, item: &I) -> Result<usize>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let id = self.projection.locate(source, item)?;
        for ancestor in self.projection.arena.ancestors(id).into_iter().rev() {
            if let Some((Some(row), inserted)) =
                self.projection.expand(source, ancestor)?
            {
                self.on_change.emit(&ListEvent::Expanded { row, inserted });
            }
        }
        Ok(self.projection.arena.row_of(id))
    }

    /// Expand every node of the tree.
    pub fn expand_all<S>(&mut self, source: &S) -> Result<()>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let children = self.projection.children(NodeId::ROOT);
        let mut result = Ok(());
        if children.len() != source.count() {
            result = Err(ListError::OutOfSync {
                depth: 0,
                index: children.len().min(source.count()),
            });
        } else {
            for (index, id) in children.into_iter().enumerate() {
                result = self.projection.expand_subtree(id, source.node_at(index));
                if result.is_err() {
                    break;
                }
            }
        }
        self.projection.refresh_rows();
        debug!("expanded all nodes: {} rows", self.count());
        self.on_change.emit(&ListEvent::DataChanged {
            preserve_expansion: true,
        });
        result
    }

    /// Collapse every node of the tree.
    pub fn collapse_all(&mut self) {
        self.projection.arena.collapse_all();
        self.projection.pending.clear();
        self.projection.refresh_rows();
        debug!("collapsed all nodes: {} rows", self.count());
        self.on_change.emit(&ListEvent::DataChanged {
            preserve_expansion: true,
        });
    }

    /// Deepest visible wrapper on the path from the root to `item`.
    ///
    /// Returns the wrapper of `item` itself when it is visible, and `None`
    /// when the item is not part of the tree.
    pub fn deepest_node<S>(&self, source: &S, item: &I) -> Option<NodeRef<'_, I>>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let index = source.item_index(item)?;
        let mut id = self.projection.child_at(NodeId::ROOT, index).ok()?;
        let mut node = source.node_at(index);
        loop {
            let wrapper = self.projection.arena.get(id);
            if node.item() == *item || !wrapper.expanded {
                return Some(self.node_ref(id));
            }
            let index = node.item_index(item)?;
            id = self.projection.child_at(id, index).ok()?;
            node = node.node_at(index);
        }
    }

    /// Whether `item` is anywhere in the tree, visible or not.
    pub fn contains<S>(&self, source: &S, item: &I) -> bool
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        source.item_index(item).is_some()
    }

    /// Re-synchronize with a source that changed out-of-band.
    ///
    /// Nodes keep their expansion state by identity; identities that are
    /// gone are dropped. With `preserve_expansion` every remembered state
    /// survives, including expanded nodes hidden under collapsed ancestors.
    /// Without it only the expanded nodes currently on screen stay expanded.
    pub fn data_changed<S>(
        &mut self,
        source: &S,
        preserve_expansion: bool,
    ) -> Result<()>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let expanded = self.projection.expanded_items(!preserve_expansion);
        self.projection = Projection::build(
            source,
            self.projection.options.clone(),
            expanded,
        )?;
        debug!(
            "data changed (preserve_expansion: {preserve_expansion}): {} rows",
            self.count()
        );
        self.on_change
            .emit(&ListEvent::DataChanged { preserve_expansion });
        Ok(())
    }

    /// Discard all expansion state and rebuild from `source`.
    pub fn data_replaced<S>(&mut self, source: &S) -> Result<()>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        self.projection = Projection::build(
            source,
            self.projection.options.clone(),
            HashSet::new(),
        )?;
        debug!("data replaced: {} rows", self.count());
        self.on_change.emit(&ListEvent::DataReplaced);
        Ok(())
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_, I> {
        NodeRef {
            projection: &self.projection,
            id,
        }
    }
}

impl<I: Item> ListAdapter for TreeToListAdapter<I> {
    type Item = I;

    fn count(&self) -> usize {
        TreeToListAdapter::count(self)
    }

    fn item_at(&self, index: usize) -> I {
        TreeToListAdapter::item_at(self, index)
    }

    fn item_index(&self, item: &I) -> Option<usize> {
        TreeToListAdapter::item_index(self, item)
    }
}

impl<I: Item> fmt::Debug for TreeToListAdapter<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeToListAdapter")
            .field("rows", &self.count())
            .field("nodes", &(self.projection.arena.len() - 1))
            .field("on_change", &self.on_change)
            .finish()
    }
}

/// Read-only view of one wrapper node.
pub struct NodeRef<'a, I> {
    projection: &'a Projection<I>,
    id: NodeId,
}

impl<I> Clone for NodeRef<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for NodeRef<'_, I> {}

impl<'a, I: Item> NodeRef<'a, I> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn item(&self) -> &'a I {
        match &self.projection.arena.get(self.id).item {
            Some(item) => item,
            None => unreachable!("node references never point at the root"),
        }
    }

    /// Indentation level; top-level rows are at depth `0`.
    pub fn depth(&self) -> usize {
        self.projection.arena.get(self.id).depth
    }

    pub fn is_leaf(&self) -> bool {
        self.projection.arena.get(self.id).leaf
    }

    pub fn is_expanded(&self) -> bool {
        self.projection.arena.get(self.id).expanded
    }

    /// Parent wrapper, `None` for top-level rows.
    pub fn parent(&self) -> Option<NodeRef<'a, I>> {
        self.projection
            .arena
            .get(self.id)
            .parent
            .filter(|&parent| parent != NodeId::ROOT)
            .map(|id| NodeRef {
                projection: self.projection,
                id,
            })
    }

    /// Row of this node, `None` while hidden.
    pub fn row(&self) -> Option<usize> {
        let arena = &self.projection.arena;
        arena.is_visible(self.id).then(|| arena.row_of(self.id))
    }
}

impl<I: Item> fmt::Debug for NodeRef<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("item", self.item())
            .field("depth", &self.depth())
            .field("expanded", &self.is_expanded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::tests::{TestNode, deep_tree, leaf, n};

    fn rows(adapter: &TreeToListAdapter<u32>) -> Vec<u32> {
        (0..adapter.count()).map(|row| adapter.item_at(row)).collect()
    }

    /// Checks the rows and the `item_index` round trip.
    fn check(name: &str, adapter: &TreeToListAdapter<u32>, expected: &[u32]) {
        assert_eq!(rows(adapter), expected, "{name}: rows");
        for (row, item) in expected.iter().enumerate() {
            assert_eq!(adapter.item_index(item), Some(row), "{name}: {item}");
        }
    }

    #[test]
    fn flat_tree_lists_every_node() {
        let tree = vec![leaf(10), leaf(20), leaf(30)];
        let adapter = TreeToListAdapter::new(&tree);
        check("flat", &adapter, &[10, 20, 30]);
    }

    #[test]
    fn empty_tree_has_no_rows() {
        let tree: Vec<TestNode> = Vec::new();
        let adapter = TreeToListAdapter::new(&tree);
        assert!(adapter.is_empty());
        assert_eq!(adapter.item_index(&1), None);
    }

    #[test]
    fn deep_tree_follows_expansion() {
        let mut tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        check("unexpanded", &adapter, &[100]);

        assert_eq!(adapter.expand(&tree, &100), Ok(true));
        check("single expanded", &adapter, &[100, 110, 120, 130, 140]);

        adapter.expand_all(&tree).expect("expand all");
        check(
            "fully expanded",
            &adapter,
            &[100, 110, 120, 121, 122, 123, 130, 140, 141, 142],
        );

        let item = adapter.item_at(2);
        assert_eq!(adapter.collapse(&item), Ok(true));
        check("one collapsed", &adapter, &[100, 110, 120, 130, 140, 141, 142]);

        tree[0].children.push(leaf(150));
        check(
            "mutate, no data-changed",
            &adapter,
            &[100, 110, 120, 130, 140, 141, 142],
        );

        adapter.data_changed(&tree, false).expect("data changed");
        check(
            "data-changed",
            &adapter,
            &[100, 110, 120, 130, 140, 141, 142, 150],
        );
    }

    #[test]
    fn expanding_adds_exactly_the_revealed_rows() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand(&tree, &100).expect("expand root");

        let before = adapter.count();
        adapter.expand(&tree, &120).expect("expand 120");
        assert_eq!(adapter.count(), before + 3);
        assert_eq!(adapter.item_index(&130), Some(6));
        assert_eq!(adapter.item_index(&110), Some(1));

        adapter.collapse(&120).expect("collapse 120");
        assert_eq!(adapter.count(), before);
        assert_eq!(adapter.item_index(&121), None);
    }

    #[test]
    fn leaves_and_repeated_expansions_are_no_ops() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        assert_eq!(adapter.expand(&tree, &100), Ok(true));
        assert_eq!(adapter.expand(&tree, &100), Ok(false));
        assert_eq!(adapter.expand(&tree, &110), Ok(false));
        assert_eq!(adapter.collapse(&130), Ok(false));
        assert_eq!(rows(&adapter), vec![100, 110, 120, 130, 140]);
    }

    #[test]
    fn unknown_items_are_reported_as_not_found() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        assert_eq!(
            adapter.expand(&tree, &999),
            Err(ListError::ItemNotFound("999".into()))
        );
        assert!(adapter.collapse(&999).is_err());
        assert!(adapter.deepest_node(&tree, &999).is_none());
        assert!(!adapter.contains(&tree, &999));
        assert_eq!(adapter.item_index(&999), None);
    }

    #[test]
    fn hidden_nodes_expand_without_changing_rows() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        assert_eq!(adapter.expand(&tree, &140), Ok(true));
        assert_eq!(rows(&adapter), vec![100]);
        assert_eq!(adapter.item_index(&141), None);

        adapter.expand(&tree, &100).expect("expand root");
        assert_eq!(rows(&adapter), vec![100, 110, 120, 130, 140, 141, 142]);
    }

    #[test]
    fn toggle_flips_the_state() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        assert_eq!(adapter.toggle_expanded(&tree, &100), Ok(true));
        assert_eq!(adapter.count(), 5);
        assert_eq!(adapter.toggle_expanded(&tree, &100), Ok(true));
        assert_eq!(adapter.count(), 1);
    }

    #[test]
    fn expand_collapse_expand_all_is_reproducible() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        adapter.expand_all(&tree).expect("expand all");
        let first = rows(&adapter);
        adapter.collapse_all();
        assert_eq!(rows(&adapter), vec![100]);
        adapter.expand_all(&tree).expect("expand all again");
        assert_eq!(rows(&adapter), first);
    }

    #[test]
    fn deepest_node_stops_at_the_first_collapsed_ancestor() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        let deepest = adapter.deepest_node(&tree, &122).expect("in tree");
        assert_eq!(*deepest.item(), 100);

        adapter.expand(&tree, &100).expect("expand root");
        let deepest = adapter.deepest_node(&tree, &122).expect("in tree");
        assert_eq!(*deepest.item(), 120);
        assert_eq!(deepest.row(), Some(2));

        adapter.expand(&tree, &120).expect("expand 120");
        let deepest = adapter.deepest_node(&tree, &122).expect("in tree");
        assert_eq!(*deepest.item(), 122);
        assert_eq!(deepest.depth(), 2);
        assert_eq!(deepest.parent().map(|parent| *parent.item()), Some(120));
    }

    #[test]
    fn contains_searches_hidden_nodes() {
        let tree = deep_tree();
        let adapter = TreeToListAdapter::new(&tree);

        assert!(adapter.contains(&tree, &142));
        assert_eq!(adapter.item_index(&142), None);
    }

    #[test]
    fn show_expands_the_ancestors() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);

        assert_eq!(adapter.show(&tree, &142), Ok(6));
        assert_eq!(rows(&adapter), vec![100, 110, 120, 130, 140, 141, 142]);
        assert_eq!(adapter.show(&tree, &100), Ok(0));
    }

    #[test]
    fn data_changed_with_preserve_keeps_hidden_state() {
        let tree = vec![n(1, [n(2, [n(3, [leaf(4)])])])];
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");
        adapter.collapse(&1).expect("collapse 1");

        adapter.data_changed(&tree, true).expect("data changed");
        assert_eq!(rows(&adapter), vec![1]);
        adapter.expand(&tree, &1).expect("expand 1");
        assert_eq!(rows(&adapter), vec![1, 2, 3, 4]);

        adapter.collapse(&1).expect("collapse 1");
        adapter.data_changed(&tree, false).expect("data changed");
        adapter.expand(&tree, &1).expect("expand 1");
        assert_eq!(rows(&adapter), vec![1, 2]);
    }

    #[test]
    fn data_changed_drops_removed_nodes_and_inserts_new_ones() {
        let mut tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");

        tree[0].children.remove(1);
        tree[0].children.insert(0, leaf(105));
        adapter.data_changed(&tree, true).expect("data changed");

        assert_eq!(rows(&adapter), vec![100, 105, 110, 130, 140, 141, 142]);
        assert_eq!(adapter.item_index(&121), None);
        assert!(adapter.node(&120).is_none());
    }

    #[test]
    fn data_changed_forgets_the_expansion_of_removed_nodes() {
        let mut tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");

        let removed = tree[0].children.remove(1);
        adapter.data_changed(&tree, true).expect("data changed");
        assert_eq!(rows(&adapter), vec![100, 110, 130, 140, 141, 142]);
        assert!(adapter.projection.pending.is_empty());

        tree[0].children.insert(1, removed);
        adapter.data_changed(&tree, true).expect("data changed");
        assert_eq!(rows(&adapter), vec![100, 110, 120, 130, 140, 141, 142]);
    }

    #[test]
    fn repeated_removals_do_not_accumulate_hidden_state() {
        let mut tree = vec![n(1, [leaf(2)])];
        let mut adapter = TreeToListAdapter::new(&tree);
        for round in 0..50 {
            let item = 10 + round;
            tree.push(n(item, [leaf(1000 + round)]));
            adapter.data_changed(&tree, true).expect("data changed");
            adapter.expand(&tree, &item).expect("expand");
            tree.pop();
            adapter.data_changed(&tree, true).expect("data changed");
        }
        assert!(adapter.projection.pending.is_empty());
        assert_eq!(rows(&adapter), vec![1]);
    }

    #[test]
    fn leaves_never_stay_pending() {
        let mut tree = vec![n(1, [n(2, [leaf(3)])])];
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");
        adapter.collapse(&1).expect("collapse 1");

        tree[0].children[0].children.clear();
        adapter.data_changed(&tree, true).expect("data changed");
        assert_eq!(adapter.projection.pending.len(), 1);
        adapter.expand(&tree, &1).expect("expand 1");

        assert_eq!(rows(&adapter), vec![1, 2]);
        assert!(adapter.projection.pending.is_empty());
    }

    #[test]
    fn hidden_restored_nodes_can_be_collapsed() {
        let tree = vec![n(1, [n(2, [n(3, [leaf(4)])])])];
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");
        adapter.collapse(&1).expect("collapse 1");
        adapter.data_changed(&tree, true).expect("data changed");

        assert_eq!(adapter.collapse(&2), Ok(true));
        adapter.expand(&tree, &1).expect("expand 1");
        assert_eq!(rows(&adapter), vec![1, 2]);
        assert_eq!(adapter.collapse(&2), Ok(false));
        assert!(adapter.collapse(&99).is_err());
    }

    #[test]
    fn hidden_restored_nodes_toggle_like_they_collapse() {
        let tree = vec![n(1, [n(2, [n(3, [leaf(4)])])])];
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand_all(&tree).expect("expand all");
        adapter.collapse(&1).expect("collapse 1");
        adapter.data_changed(&tree, true).expect("data changed");

        assert_eq!(adapter.toggle_expanded(&tree, &2), Ok(true));
        adapter.expand(&tree, &1).expect("expand 1");
        assert_eq!(rows(&adapter), vec![1, 2]);
    }

    #[test]
    fn data_notifications_are_idempotent() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.show(&tree, &141).expect("show");
        let before = rows(&adapter);

        adapter.data_changed(&tree, true).expect("first");
        adapter.data_changed(&tree, true).expect("second");
        assert_eq!(rows(&adapter), before);
        adapter.data_changed(&tree, false).expect("third");
        assert_eq!(rows(&adapter), before);

        adapter.data_replaced(&tree).expect("replaced");
        adapter.data_replaced(&tree).expect("replaced again");
        assert_eq!(rows(&adapter), vec![100]);
    }

    #[test]
    fn stale_paths_report_out_of_sync() {
        let mut tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.expand(&tree, &100).expect("expand root");

        tree[0].children.truncate(1);
        assert_eq!(
            adapter.expand(&tree, &140),
            Err(ListError::OutOfSync { depth: 1, index: 3 })
        );
    }

    #[test]
    fn duplicates_are_kept_first_or_rejected() {
        let tree = vec![n(1, [leaf(7)]), leaf(7)];

        let mut adapter = TreeToListAdapter::new(&tree);
        assert_eq!(adapter.item_index(&7), Some(1));
        adapter.expand(&tree, &1).expect("expand");
        assert_eq!(rows(&adapter), vec![1, 7, 7]);
        assert_eq!(adapter.item_index(&7), Some(2));

        let options = AdapterOptions {
            duplicate_items: DuplicateItems::Reject,
        };
        let mut adapter =
            TreeToListAdapter::with_options(&tree, options).expect("top level");
        assert_eq!(
            adapter.expand(&tree, &1),
            Err(ListError::DuplicateItem("7".into()))
        );
        assert_eq!(rows(&adapter), vec![1, 7]);
    }

    #[test]
    fn visible_toggles_emit_splice_events() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = adapter
            .on_change()
            .listen(move |event| sink.borrow_mut().push(*event));

        adapter.expand(&tree, &140).expect("hidden expand");
        adapter.expand(&tree, &100).expect("expand root");
        adapter.collapse(&140).expect("collapse 140");
        adapter.data_changed(&tree, true).expect("data changed");
        adapter.data_replaced(&tree).expect("data replaced");
        subscription.cancel();
        adapter.expand(&tree, &100).expect("unobserved");

        assert_eq!(
            *events.borrow(),
            vec![
                ListEvent::Expanded {
                    row: 0,
                    inserted: 6
                },
                ListEvent::Collapsed { row: 4, removed: 2 },
                ListEvent::DataChanged {
                    preserve_expansion: true
                },
                ListEvent::DataReplaced,
            ]
        );
    }

    #[test]
    fn node_refs_describe_rows() {
        let tree = deep_tree();
        let mut adapter = TreeToListAdapter::new(&tree);
        adapter.show(&tree, &123).expect("show");

        let described: Vec<(usize, u32, usize, bool)> = adapter
            .visible_nodes()
            .map(|(row, node)| {
                (row, *node.item(), node.depth(), node.is_expanded())
            })
            .collect();
        assert_eq!(described[0], (0, 100, 0, true));
        assert_eq!(described[2], (2, 120, 1, true));
        assert_eq!(described[5], (5, 123, 2, false));
        assert!(adapter.node_at(5).is_some_and(|node| node.is_leaf()));
        assert!(adapter.node_at(99).is_none());
    }

    #[test]
    #[should_panic(expected = "row 1 out of range (1 rows)")]
    fn item_at_panics_out_of_range() {
        let tree = deep_tree();
        let adapter = TreeToListAdapter::new(&tree);
        adapter.item_at(1);
    }
}
