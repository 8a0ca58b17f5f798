//! Windowed virtualization of a scrollable list.
//!
//! [`VirtualList`] only keeps per-item controls for the rows that intersect
//! the viewport. Each [`VirtualList::layout`] pass reuses the controls of
//! items that stayed in range, creates controls for items that entered it,
//! and hands back the controls of items that left it.

use std::collections::HashMap;
use std::ops::Range;

use log::trace;

use crate::event::ListEvent;
use crate::model::{Item, ListAdapter};
use crate::options::ListOptions;

struct Slot<C> {
    control: C,
    row: usize,
    mark: u64,
}

/// A control placed by the last layout pass.
#[derive(Debug)]
pub struct Placement<'a, K, C> {
    pub item: &'a K,
    pub row: usize,
    /// Position along the scroll axis, relative to the viewport start.
    pub offset: f32,
    pub control: &'a C,
}

/// Scroll state and per-item controls of a virtualized list.
pub struct VirtualList<K, C> {
    options: ListOptions,
    count: usize,
    scroll_offset: f32,
    mark: u64,
    slots: HashMap<K, Slot<C>>,
}

impl<K: Item, C> VirtualList<K, C> {
    pub fn new(options: ListOptions) -> Self {
        Self {
            options,
            count: 0,
            scroll_offset: 0.0,
            mark: 0,
            slots: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    /// Number of rows seen by the last refresh.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Total extent of all rows along the scroll axis.
    pub fn content_extent(&self) -> f32 {
        self.count as f32 * self.options.item_extent
    }

    pub fn max_scroll_offset(&self) -> f32 {
        (self.content_extent() - self.options.viewport_extent).max(0.0)
    }

    /// Resize the viewport, keeping the scroll offset valid.
    pub fn set_viewport_extent(&mut self, extent: f32) {
        self.options.viewport_extent = extent.max(0.0);
        self.set_scroll_offset(self.scroll_offset);
    }

    /// Change the row extent, keeping the scroll offset valid.
    pub fn set_item_extent(&mut self, extent: f32) {
        self.options.item_extent = extent.max(0.0);
        self.set_scroll_offset(self.scroll_offset);
    }

    /// Clamp and apply `offset`. Returns whether the offset changed.
    pub fn set_scroll_offset(&mut self, offset: f32) -> bool {
        let offset = offset.clamp(0.0, self.max_scroll_offset());
        if offset == self.scroll_offset {
            return false;
        }
        self.scroll_offset = offset;
        true
    }

    /// Scroll by `notches` wheel steps; positive values scroll back.
    pub fn scroll_by_wheel(&mut self, notches: f32) -> bool {
        if notches == 0.0 || self.options.wheel_divisor <= 0.0 {
            return false;
        }
        let delta =
            notches * self.options.item_extent / self.options.wheel_divisor;
        self.set_scroll_offset(self.scroll_offset - delta)
    }

    pub fn page_up(&mut self) -> bool {
        self.set_scroll_offset(self.scroll_offset - self.options.viewport_extent)
    }

    pub fn page_down(&mut self) -> bool {
        self.set_scroll_offset(self.scroll_offset + self.options.viewport_extent)
    }

    /// Rows intersecting the viewport.
    ///
    /// With `include_partial` rows cut by either viewport edge are included,
    /// otherwise only fully visible rows are.
    pub fn visible_range(&self, include_partial: bool) -> Range<usize> {
        let extent = self.options.item_extent;
        if self.count == 0 || extent <= 0.0 {
            return 0..0;
        }
        let start = self.scroll_offset / extent;
        let end = (self.scroll_offset + self.options.viewport_extent) / extent;
        let (start, end) = if include_partial {
            (start.floor(), end.ceil())
        } else {
            (start.ceil(), end.floor())
        };
        let end = (end.max(0.0) as usize).min(self.count);
        let start = (start.max(0.0) as usize).min(end);
        start..end
    }

    /// Whether some rows are outside the viewport.
    pub fn is_scrollable(&self) -> bool {
        self.visible_range(true) != (0..self.count)
    }

    /// Scroll the least amount that makes `item` fully visible. Returns
    /// `false` when the list does not contain it.
    pub fn scroll_to<L>(&mut self, list: &L, item: &K) -> bool
    where
        L: ListAdapter<Item = K> + ?Sized,
    {
        let Some(row) = list.item_index(item) else {
            return false;
        };
        self.count = list.count();
        let visible = self.visible_range(false);
        let extent = self.options.item_extent;
        if row < visible.start {
            self.set_scroll_offset(row as f32 * extent);
        } else if row >= visible.end {
            self.set_scroll_offset(
                (row + 1) as f32 * extent - self.options.viewport_extent,
            );
        }
        true
    }

    /// Place a control for every visible row.
    ///
    /// `create` is called once per item entering the viewport. Returns the
    /// controls of the items that left it.
    ///
    /// # Panics
    ///
    /// Panics when two visible rows report the same item.
    pub fn layout<L>(
        &mut self,
        list: &L,
        mut create: impl FnMut(&K, usize) -> C,
    ) -> Vec<C>
    where
        L: ListAdapter<Item = K> + ?Sized,
    {
        self.count = list.count();
        self.set_scroll_offset(self.scroll_offset);

        self.mark += 1;
        let mark = self.mark;
        for row in self.visible_range(true) {
            let item = list.item_at(row);
            match self.slots.get_mut(&item) {
                Some(slot) if slot.mark == mark => panic!(
                    "list returned duplicate item {item:?} for rows {} and {row}",
                    slot.row
                ),
                Some(slot) => {
                    slot.mark = mark;
                    slot.row = row;
                },
                None => {
                    let control = create(&item, row);
                    self.slots.insert(item, Slot { control, row, mark });
                },
            }
        }

        let stale: Vec<K> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.mark != mark)
            .map(|(item, _)| item.clone())
            .collect();
        trace!(
            "list layout: {} controls placed, {} reaped",
            self.slots.len() - stale.len(),
            stale.len()
        );
        stale
            .iter()
            .filter_map(|item| self.slots.remove(item))
            .map(|slot| slot.control)
            .collect()
    }

    /// Controls placed by the last layout pass, in row order.
    pub fn placements(&self) -> Vec<Placement<'_, K, C>> {
        let mut placements: Vec<Placement<'_, K, C>> = self
            .slots
            .iter()
            .map(|(item, slot)| Placement {
                item,
                row: slot.row,
                offset: slot.row as f32 * self.options.item_extent
                    - self.scroll_offset,
                control: &slot.control,
            })
            .collect();
        placements.sort_by_key(|placement| placement.row);
        placements
    }

    /// Control of `item`, if it is in the viewport.
    pub fn control(&self, item: &K) -> Option<&C> {
        self.slots.get(item).map(|slot| &slot.control)
    }

    pub fn is_item_visible(&self, item: &K) -> bool {
        self.slots.contains_key(item)
    }

    /// Drop every control and return them.
    pub fn remove_all(&mut self) -> Vec<C> {
        self.slots.drain().map(|(_, slot)| slot.control).collect()
    }

    /// Refresh the row count. With `recreate_controls` every control is
    /// released so the next layout pass creates them again.
    pub fn data_changed<L>(&mut self, list: &L, recreate_controls: bool) -> Vec<C>
    where
        L: ListAdapter<Item = K> + ?Sized,
    {
        let released = if recreate_controls {
            self.remove_all()
        } else {
            Vec::new()
        };
        self.count = list.count();
        self.set_scroll_offset(self.scroll_offset);
        released
    }

    /// The list was replaced: release every control.
    pub fn data_replaced<L>(&mut self, list: &L) -> Vec<C>
    where
        L: ListAdapter<Item = K> + ?Sized,
    {
        self.data_changed(list, true)
    }

    /// Apply a change notification from the list.
    pub fn handle_event<L>(&mut self, list: &L, event: &ListEvent) -> Vec<C>
    where
        L: ListAdapter<Item = K> + ?Sized,
    {
        match event {
            ListEvent::DataReplaced => self.data_replaced(list),
            ListEvent::DataChanged { .. }
            | ListEvent::Expanded { .. }
            | ListEvent::Collapsed { .. } => self.data_changed(list, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(count: u32) -> Vec<u32> {
        (0..count).collect()
    }

    fn view(viewport: f32) -> VirtualList<u32, String> {
        VirtualList::new(ListOptions {
            item_extent: 10.0,
            viewport_extent: viewport,
            ..ListOptions::default()
        })
    }

    #[test]
    fn visible_range_includes_partial_rows_on_request() {
        let items = list(100);
        let mut view = view(35.0);
        view.data_changed(&items, false);

        assert_eq!(view.visible_range(true), 0..4);
        assert_eq!(view.visible_range(false), 0..3);

        view.set_scroll_offset(15.0);
        assert_eq!(view.visible_range(true), 1..5);
        assert_eq!(view.visible_range(false), 2..5);
    }

    #[test]
    fn empty_or_degenerate_lists_have_no_visible_rows() {
        let mut view = view(50.0);
        view.data_changed(&list(0), false);
        assert_eq!(view.visible_range(true), 0..0);

        view.data_changed(&list(10), false);
        view.set_item_extent(0.0);
        assert_eq!(view.visible_range(true), 0..0);
    }

    #[test]
    fn scroll_offset_is_clamped() {
        let items = list(10);
        let mut view = view(30.0);
        view.data_changed(&items, false);

        assert!(view.set_scroll_offset(500.0));
        assert_eq!(view.scroll_offset(), 70.0);
        assert!(view.set_scroll_offset(-5.0));
        assert_eq!(view.scroll_offset(), 0.0);
        assert!(!view.set_scroll_offset(-1.0));
    }

    #[test]
    fn wheel_scrolls_an_eighth_of_a_row_per_notch() {
        let items = list(10);
        let mut view = view(30.0);
        view.data_changed(&items, false);
        view.set_scroll_offset(20.0);

        assert!(view.scroll_by_wheel(2.0));
        assert_eq!(view.scroll_offset(), 17.5);
        assert!(!view.scroll_by_wheel(0.0));
    }

    #[test]
    fn scroll_to_reveals_rows_with_minimal_movement() {
        let items = list(100);
        let mut view = view(30.0);
        view.data_changed(&items, false);

        assert!(view.scroll_to(&items, &9));
        assert_eq!(view.scroll_offset(), 70.0);
        assert_eq!(view.visible_range(false), 7..10);

        assert!(view.scroll_to(&items, &8));
        assert_eq!(view.scroll_offset(), 70.0);

        assert!(view.scroll_to(&items, &2));
        assert_eq!(view.scroll_offset(), 20.0);

        assert!(!view.scroll_to(&items, &500));
    }

    #[test]
    fn layout_creates_only_visible_controls_and_reaps_the_rest() {
        let items = list(100);
        let mut view = view(25.0);
        let mut created = Vec::new();

        let released = view.layout(&items, |item, _| {
            created.push(*item);
            format!("row {item}")
        });
        assert!(released.is_empty());
        assert_eq!(created, vec![0, 1, 2]);

        view.set_scroll_offset(20.0);
        created.clear();
        let mut released = view.layout(&items, |item, _| {
            created.push(*item);
            format!("row {item}")
        });
        released.sort();
        assert_eq!(created, vec![3, 4]);
        assert_eq!(released, vec!["row 0".to_owned(), "row 1".to_owned()]);

        let placements = view.placements();
        let rows: Vec<(usize, f32)> = placements
            .iter()
            .map(|placement| (placement.row, placement.offset))
            .collect();
        assert_eq!(rows, vec![(2, 0.0), (3, 10.0), (4, 20.0)]);
        assert_eq!(view.control(&3).map(String::as_str), Some("row 3"));
        assert!(!view.is_item_visible(&0));
    }

    #[test]
    fn recreating_controls_releases_them_all() {
        let items = list(5);
        let mut view = view(100.0);
        view.layout(&items, |item, _| item.to_string());

        assert_eq!(view.data_changed(&items, true).len(), 5);
        assert_eq!(view.data_replaced(&items).len(), 0);
        assert!(!view.is_scrollable());
    }

    #[test]
    fn change_events_refresh_the_count() {
        let mut items = list(3);
        let mut view = view(100.0);
        view.layout(&items, |item, _| item.to_string());

        items.push(3);
        let released = view.handle_event(
            &items,
            &ListEvent::Expanded {
                row: 2,
                inserted: 1,
            },
        );
        assert!(released.is_empty());
        assert_eq!(view.count(), 4);

        let released = view.handle_event(&items, &ListEvent::DataReplaced);
        assert_eq!(released.len(), 3);
    }

    #[test]
    #[should_panic(expected = "duplicate item 7")]
    fn duplicate_items_in_range_panic() {
        let items = vec![7, 7];
        let mut view = view(100.0);
        view.layout(&items, |item, _| item.to_string());
    }
}
