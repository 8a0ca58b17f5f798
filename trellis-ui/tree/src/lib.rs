//! A virtualized [`iced`] tree widget backed by [`trellis_list`].
//!
//! The tree state lives in a [`trellis_list::TreeToListAdapter`]; this crate
//! only renders it. [`TreeView`] builds the rows of a window of the flattened
//! list and stands in spacers for the rest, so it scales to trees with many
//! expanded nodes when placed inside a scrollable.
//!
//! The recommended flow for interactive trees:
//! 1. keep the source tree, the adapter and a [`trellis_list::Selection`] in
//!    your app state;
//! 2. feed the selection into [`TreeView::selected`] and [`TreeView::proxy`];
//! 3. apply callbacks like [`TreeView::on_press`] and [`TreeView::on_toggle`]
//!    to the adapter and selection in `update`.
//!
//! See `examples/tree_view.rs` for a complete runnable example.
//!
//! # Quick Example
//!
//! ```no_run
//! use iced::widget::text;
//! use iced::Element;
//! use trellis_list::{TreeNode, TreeToListAdapter};
//! use trellis_ui_tree::TreeView;
//!
//! struct Node {
//!     title: String,
//!     children: Vec<Node>,
//! }
//!
//! impl TreeNode for Node {
//!     type Item = String;
//!
//!     fn item(&self) -> String {
//!         self.title.clone()
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
//! #[derive(Clone)]
//! enum Message {
//!     Toggle(String),
//! }
//!
//! struct State {
//!     nodes: Vec<Node>,
//!     adapter: TreeToListAdapter<String>,
//! }
//!
//! fn view(state: &State) -> Element<'_, Message> {
//!     TreeView::new(&state.adapter, |ctx| text(ctx.item().as_str()).into())
//!         .indent_width(14.0)
//!         .on_toggle(Message::Toggle)
//!         .view()
//! }
//! ```

mod view;

pub use view::{TreeRowContext, TreeView};
