use log::debug;

use crate::adapter::TreeToListAdapter;
use crate::error::Result;
use crate::event::Event;
use crate::model::{Item, ListAdapter, TreeNode, TreeNodeContainer};
use crate::options::Orientation;
use crate::virtual_list::VirtualList;

/// Navigation keys understood by [`Selection::key_press`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
}

/// The selected item of a list or tree view.
pub struct Selection<I> {
    selected: Option<I>,
    on_selection_changed: Event<Option<I>>,
}

impl<I: Item + 'static> Selection<I> {
    pub fn new() -> Self {
        Self {
            selected: None,
            on_selection_changed: Event::new(),
        }
    }

    pub fn selected(&self) -> Option<&I> {
        self.selected.as_ref()
    }

    /// Fired with the new selection whenever it changes.
    pub fn on_selection_changed(&self) -> &Event<Option<I>> {
        &self.on_selection_changed
    }

    /// Select `item` if `list` contains it.
    pub fn select<L>(&mut self, list: &L, item: I) -> bool
    where
        L: ListAdapter<Item = I> + ?Sized,
    {
        if self.selected.as_ref() == Some(&item) {
            return true;
        }
        if !list.contains_item(&item) {
            return false;
        }
        self.set(Some(item));
        true
    }

    /// Select `item` if it is anywhere in the tree, even when hidden behind a
    /// collapsed node.
    pub fn select_tree_item<S>(
        &mut self,
        adapter: &TreeToListAdapter<I>,
        source: &S,
        item: I,
    ) -> bool
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        if self.selected.as_ref() == Some(&item) {
            return true;
        }
        if !adapter.contains(source, &item) {
            return false;
        }
        self.set(Some(item));
        true
    }

    pub fn clear(&mut self) {
        if self.selected.is_some() {
            self.set(None);
        }
    }

    /// Select the row before the selected one, wrapping around. Selects the
    /// first row when nothing visible is selected.
    pub fn select_previous<L>(&mut self, list: &L) -> bool
    where
        L: ListAdapter<Item = I> + ?Sized,
    {
        self.step(list, |row, count| (row + count - 1) % count)
    }

    /// Select the row after the selected one, wrapping around. Selects the
    /// first row when nothing visible is selected.
    pub fn select_next<L>(&mut self, list: &L) -> bool
    where
        L: ListAdapter<Item = I> + ?Sized,
    {
        self.step(list, |row, count| (row + 1) % count)
    }

    fn step<L>(&mut self, list: &L, next: impl Fn(usize, usize) -> usize) -> bool
    where
        L: ListAdapter<Item = I> + ?Sized,
    {
        let count = list.count();
        if count == 0 {
            return false;
        }
        let row = self
            .selected
            .as_ref()
            .and_then(|item| list.item_index(item))
            .map_or(0, |row| next(row, count));
        self.select(list, list.item_at(row))
    }

    /// The visible stand-in of a selected item hidden behind a collapsed
    /// node: its deepest visible ancestor. `None` when the selection is
    /// visible or empty.
    pub fn proxy<S>(&self, adapter: &TreeToListAdapter<I>, source: &S) -> Option<I>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let selected = self.selected.as_ref()?;
        let deepest = adapter.deepest_node(source, selected)?;
        (deepest.item() != selected).then(|| deepest.item().clone())
    }

    /// Collapse the deepest visible node of the selection, or move the
    /// selection to its parent when it is already collapsed.
    pub fn tree_key_left<S>(
        &mut self,
        adapter: &mut TreeToListAdapter<I>,
        source: &S,
    ) -> Result<bool>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let Some(selected) = self.selected.as_ref() else {
            return Ok(false);
        };
        let Some(deepest) = adapter.deepest_node(source, selected) else {
            return Ok(false);
        };
        let item = deepest.item().clone();
        let parent = deepest.parent().map(|parent| parent.item().clone());
        if adapter.collapse(&item)? {
            return Ok(true);
        }
        match parent {
            Some(parent) => Ok(self.select(&*adapter, parent)),
            None => Ok(false),
        }
    }

    /// Expand the deepest visible node of the selection.
    pub fn tree_key_right<S>(
        &mut self,
        adapter: &mut TreeToListAdapter<I>,
        source: &S,
    ) -> Result<bool>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let Some(selected) = self.selected.as_ref() else {
            return Ok(false);
        };
        let Some(deepest) = adapter.deepest_node(source, selected) else {
            return Ok(false);
        };
        let item = deepest.item().clone();
        adapter.expand(source, &item)
    }

    /// Handle a navigation key for a tree view. Returns whether the key was
    /// consumed.
    pub fn key_press<S, C>(
        &mut self,
        adapter: &mut TreeToListAdapter<I>,
        source: &S,
        view: &mut VirtualList<I, C>,
        key: Key,
    ) -> Result<bool>
    where
        S: TreeNodeContainer + ?Sized,
        S::Node: TreeNode<Item = I>,
    {
        let consumed = match key {
            Key::Left if self.tree_key_left(adapter, source)? => true,
            Key::Right if self.tree_key_right(adapter, source)? => true,
            _ if adapter.is_empty() => false,
            Key::PageUp => {
                view.page_up();
                return Ok(true);
            },
            Key::PageDown => {
                view.page_down();
                return Ok(true);
            },
            key => {
                let horizontal =
                    view.options().orientation == Orientation::Horizontal;
                match (key, horizontal) {
                    (Key::Up, false) | (Key::Left, true) => {
                        self.select_previous(&*adapter)
                    },
                    (Key::Down, false) | (Key::Right, true) => {
                        self.select_next(&*adapter)
                    },
                    _ => false,
                }
            },
        };
        if consumed {
            if let Some(selected) = self.selected.clone() {
                view.scroll_to(&*adapter, &selected);
            }
        }
        Ok(consumed)
    }

    fn set(&mut self, item: Option<I>) {
        debug!("selection changed to {item:?}");
        self.selected = item;
        self.on_selection_changed.emit(&self.selected);
    }
}

impl<I: Item + 'static> Default for Selection<I> {
    fn default() -> Self {
        Self::new()
    }
}
