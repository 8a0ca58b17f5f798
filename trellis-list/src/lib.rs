//! Tree-to-list projection and list virtualization.
//!
//! This crate turns a hierarchical data source into the flat, indexable row
//! sequence a list view consumes:
//! - [`TreeNode`] / [`TreeNodeContainer`] describe the application's tree;
//! - [`TreeToListAdapter`] presents it as a [`ListAdapter`] whose rows are the
//!   pre-order traversal of every node reachable through expanded nodes;
//! - [`VirtualList`] keeps per-item controls only for rows in the viewport;
//! - [`Selection`] implements keyboard navigation on top of both.
//!
//! The adapter never owns the tree. Mutate the source freely and report the
//! change with [`TreeToListAdapter::data_changed`] (identities survive, and
//! expansion state with them) or [`TreeToListAdapter::data_replaced`]
//! (everything starts collapsed).
//!
//! # Quick Example
//!
//! ```
//! use trellis_list::{TreeNode, TreeToListAdapter};
//!
//! struct Node {
//!     name: &'static str,
//!     children: Vec<Node>,
//! }
//!
//! impl TreeNode for Node {
//!     type Item = &'static str;
//!
//!     fn item(&self) -> &'static str {
//!         self.name
//!     }
//!
//!     fn count(&self) -> usize {
//!         self.children.len()
//!     }
//!
//!     fn node_at(&self, index: usize) -> &Self {
//!         &self.children[index]
//!     }
//! }
//!
//! let tree = vec![Node {
//!     name: "animals",
//!     children: vec![
//!         Node { name: "cats", children: Vec::new() },
//!         Node { name: "dogs", children: Vec::new() },
//!     ],
//! }];
//!
//! let mut adapter = TreeToListAdapter::new(&tree);
//! assert_eq!(adapter.count(), 1);
//!
//! adapter.expand(&tree, &"animals")?;
//! assert_eq!(adapter.item_at(2), "dogs");
//! assert_eq!(adapter.item_index(&"cats"), Some(1));
//! # Ok::<(), trellis_list::ListError>(())
//! ```

mod adapter;
mod error;
mod event;
mod model;
mod node;
mod options;
mod selection;
mod virtual_list;

pub use adapter::{NodeRef, TreeToListAdapter};
pub use error::{ListError, Result};
pub use event::{Event, ListEvent, Subscription};
pub use model::{Item, ListAdapter, TreeNode, TreeNodeContainer};
pub use node::NodeId;
pub use options::{AdapterOptions, DuplicateItems, ListOptions, Orientation};
pub use selection::{Key, Selection};
pub use virtual_list::{Placement, VirtualList};
