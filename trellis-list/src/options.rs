#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What the adapter does when two nodes report the same item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DuplicateItems {
    /// Keep the wrapper materialized first and log a warning.
    #[default]
    KeepFirst,
    /// Fail the operation that materialized the duplicate.
    Reject,
}

/// Configuration knobs for [`crate::TreeToListAdapter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdapterOptions {
    pub duplicate_items: DuplicateItems,
}

/// Scroll axis of a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Configuration knobs for [`crate::VirtualList`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ListOptions {
    /// Extent of one row along the scroll axis.
    pub item_extent: f32,
    /// Extent of the viewport along the scroll axis, padding excluded.
    pub viewport_extent: f32,
    pub orientation: Orientation,
    /// One wheel notch scrolls `item_extent / wheel_divisor`.
    pub wheel_divisor: f32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            item_extent: 18.0,
            viewport_extent: 0.0,
            orientation: Orientation::Vertical,
            wheel_divisor: 8.0,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let options: ListOptions =
            serde_json::from_str(r#"{ "item_extent": 24.0 }"#)
                .expect("list options");
        assert_eq!(options.item_extent, 24.0);
        assert_eq!(options.wheel_divisor, 8.0);

        let options: AdapterOptions =
            serde_json::from_str(r#"{ "duplicate_items": "Reject" }"#)
                .expect("adapter options");
        assert_eq!(options.duplicate_items, DuplicateItems::Reject);
    }
}
