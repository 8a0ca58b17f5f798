use std::ops::Range;

use iced::alignment;
use iced::widget::{Column, Row, Space, container, mouse_area};
use iced::{Element, Length, mouse};
use log::trace;
use trellis_list::{Item, NodeRef, TreeToListAdapter, VirtualList};

/// Rendering context passed to row callbacks.
pub struct TreeRowContext<'a, I: Item> {
    pub node: NodeRef<'a, I>,
    pub row: usize,
    pub is_selected: bool,
    pub is_hovered: bool,
    /// The row stands in for a selected item hidden below it.
    pub is_proxy: bool,
}

impl<'a, I: Item> TreeRowContext<'a, I> {
    pub fn item(&self) -> &'a I {
        self.node.item()
    }
}

type RowRenderer<'a, I, Message> =
    dyn Fn(&TreeRowContext<'a, I>) -> Element<'a, Message> + 'a;
type RowStyle<'a, I> = dyn Fn(&TreeRowContext<'a, I>) -> container::Style + 'a;
type RowAction<'a, I, Message> = dyn Fn(I) -> Message + 'a;
type HoverAction<'a, I, Message> = dyn Fn(Option<I>) -> Message + 'a;

/// Tree view over the rows of a [`TreeToListAdapter`].
///
/// Only the rows of the configured window are built; the rows above and
/// below it are replaced by spacers so a surrounding scrollable keeps its
/// full content height.
pub struct TreeView<'a, I: Item, Message: Clone + 'a> {
    adapter: &'a TreeToListAdapter<I>,
    selected: Option<&'a I>,
    proxy: Option<&'a I>,
    hovered: Option<&'a I>,
    window: Option<Range<usize>>,
    on_press: Option<Box<RowAction<'a, I, Message>>>,
    on_right_press: Option<Box<RowAction<'a, I, Message>>>,
    on_hover: Option<Box<HoverAction<'a, I, Message>>>,
    on_toggle: Option<Box<RowAction<'a, I, Message>>>,
    render_row: Box<RowRenderer<'a, I, Message>>,
    row_style: Option<Box<RowStyle<'a, I>>>,
    toggle_content: Option<Box<RowRenderer<'a, I, Message>>>,
    row_height: f32,
    spacing: f32,
    indent_width: f32,
    toggle_width: f32,
}

impl<'a, I, Message> TreeView<'a, I, Message>
where
    I: Item + 'a,
    Message: Clone + 'a,
{
    /// Create a tree view that renders each row using `render_row`.
    pub fn new(
        adapter: &'a TreeToListAdapter<I>,
        render_row: impl Fn(&TreeRowContext<'a, I>) -> Element<'a, Message> + 'a,
    ) -> Self {
        Self {
            adapter,
            selected: None,
            proxy: None,
            hovered: None,
            window: None,
            on_press: None,
            on_right_press: None,
            on_hover: None,
            on_toggle: None,
            render_row: Box::new(render_row),
            row_style: None,
            toggle_content: None,
            row_height: 0.0,
            spacing: 0.0,
            indent_width: 0.0,
            toggle_width: 0.0,
        }
    }

    /// Provide the currently selected item.
    pub fn selected(mut self, item: Option<&'a I>) -> Self {
        self.selected = item;
        self
    }

    /// Provide the visible stand-in of a selected item hidden behind a
    /// collapsed node, see [`trellis_list::Selection::proxy`].
    pub fn proxy(mut self, item: Option<&'a I>) -> Self {
        self.proxy = item;
        self
    }

    /// Provide the currently hovered item.
    pub fn hovered(mut self, item: Option<&'a I>) -> Self {
        self.hovered = item;
        self
    }

    /// Only build the rows in `rows`.
    pub fn window(mut self, rows: Range<usize>) -> Self {
        self.window = Some(rows);
        self
    }

    /// Take the window and row height from a [`VirtualList`] kept in sync
    /// with the adapter.
    pub fn virtual_list<C>(self, list: &VirtualList<I, C>) -> Self {
        let row_height = list.options().item_extent;
        self.window(list.visible_range(true)).row_height(row_height)
    }

    /// Emit a message when a row receives a left press.
    pub fn on_press(mut self, on_press: impl Fn(I) -> Message + 'a) -> Self {
        self.on_press = Some(Box::new(on_press));
        self
    }

    /// Emit a message when a row receives a right press.
    pub fn on_right_press(
        mut self,
        on_right_press: impl Fn(I) -> Message + 'a,
    ) -> Self {
        self.on_right_press = Some(Box::new(on_right_press));
        self
    }

    /// Emit a message when the pointer enters or leaves a row.
    pub fn on_hover(
        mut self,
        on_hover: impl Fn(Option<I>) -> Message + 'a,
    ) -> Self {
        self.on_hover = Some(Box::new(on_hover));
        self
    }

    /// Emit a message when the toggle of an expandable row is clicked.
    pub fn on_toggle(mut self, on_toggle: impl Fn(I) -> Message + 'a) -> Self {
        self.on_toggle = Some(Box::new(on_toggle));
        self
    }

    /// Provide a row style callback for background/text styling.
    pub fn row_style(
        mut self,
        row_style: impl Fn(&TreeRowContext<'a, I>) -> container::Style + 'a,
    ) -> Self {
        self.row_style = Some(Box::new(row_style));
        self
    }

    /// Provide content to render inside the toggle area.
    pub fn toggle_content(
        mut self,
        toggle_content: impl Fn(&TreeRowContext<'a, I>) -> Element<'a, Message> + 'a,
    ) -> Self {
        self.toggle_content = Some(Box::new(toggle_content));
        self
    }

    /// Fixed height of every row. Required for the spacers of a window.
    pub fn row_height(mut self, height: f32) -> Self {
        self.row_height = height.max(0.0);
        self
    }

    /// Set indentation width per tree depth level.
    pub fn indent_width(mut self, width: f32) -> Self {
        self.indent_width = width.max(0.0);
        self
    }

    /// Set the width reserved for the toggle area.
    pub fn toggle_width(mut self, width: f32) -> Self {
        self.toggle_width = width.max(0.0);
        self
    }

    /// Vertical spacing between rows.
    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing.max(0.0);
        self
    }

    /// Build the `Element` for the tree view.
    pub fn view(self) -> Element<'a, Message> {
        let count = self.adapter.count();
        let rows = clamp_window(self.window.clone(), count);
        trace!("tree view rows {rows:?} of {count}");

        let mut column = Column::new().spacing(self.spacing);
        if let Some(extent) =
            spacer_extent(rows.start, self.row_height, self.spacing)
        {
            column = column.push(Space::new().height(Length::Fixed(extent)));
        }

        for row in rows.clone() {
            let Some(node) = self.adapter.node_at(row) else {
                break;
            };
            let item = node.item();
            let context = TreeRowContext {
                node,
                row,
                is_selected: self.selected == Some(item),
                is_hovered: self.hovered == Some(item),
                is_proxy: self.proxy == Some(item),
            };
            column = column.push(self.build_row(&context));
        }

        if let Some(extent) =
            spacer_extent(count - rows.end, self.row_height, self.spacing)
        {
            column = column.push(Space::new().height(Length::Fixed(extent)));
        }

        column.into()
    }

    fn build_row(&self, context: &TreeRowContext<'a, I>) -> Element<'a, Message> {
        let item = context.item();
        let content = wrap_mouse_area(
            (self.render_row)(context),
            self.on_press.as_deref(),
            self.on_right_press.as_deref(),
            self.on_hover.as_deref(),
            item,
        );

        let mut row = Row::new().spacing(0.0);

        let indent = context.node.depth() as f32 * self.indent_width;
        if indent > 0.0 {
            row = row.push(Space::new().width(Length::Fixed(indent)));
        }

        if self.toggle_width > 0.0 || self.toggle_content.is_some() {
            row = row.push(self.build_toggle_slot(context));
        }

        row = row.push(content);

        let mut element: Element<'a, Message> = if self.row_height > 0.0 {
            container(row)
                .height(Length::Fixed(self.row_height))
                .align_y(alignment::Vertical::Center)
                .into()
        } else {
            row.into()
        };

        if let Some(ref row_style) = self.row_style {
            let style = row_style(context);
            element = container(element)
                .width(Length::Fill)
                .style(move |_| style)
                .into();
        }

        element
    }

    fn build_toggle_slot(
        &self,
        context: &TreeRowContext<'a, I>,
    ) -> Element<'a, Message> {
        let content = self
            .toggle_content
            .as_ref()
            .map(|toggle| toggle(context))
            .unwrap_or_else(|| Space::new().into());

        let content = container(content)
            .width(Length::Fixed(self.toggle_width))
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .into();

        let on_toggle = self
            .on_toggle
            .as_deref()
            .filter(|_| !context.node.is_leaf());
        wrap_mouse_area(
            content,
            on_toggle,
            None,
            self.on_hover.as_deref(),
            context.item(),
        )
    }
}

fn wrap_mouse_area<'a, I: Item, Message: Clone + 'a>(
    element: Element<'a, Message>,
    on_press: Option<&(dyn Fn(I) -> Message + 'a)>,
    on_right_press: Option<&(dyn Fn(I) -> Message + 'a)>,
    on_hover: Option<&(dyn Fn(Option<I>) -> Message + 'a)>,
    item: &I,
) -> Element<'a, Message> {
    if on_press.is_none() && on_right_press.is_none() && on_hover.is_none() {
        return element;
    }

    let mut area = mouse_area(element);

    if let Some(on_press) = on_press {
        area = area.on_press(on_press(item.clone()));
    }

    if let Some(on_right_press) = on_right_press {
        area = area.on_right_press(on_right_press(item.clone()));
    }

    if let Some(on_hover) = on_hover {
        area = area
            .on_enter(on_hover(Some(item.clone())))
            .on_exit(on_hover(None));
    }

    area.interaction(mouse::Interaction::Pointer).into()
}

/// The requested window limited to `count` rows; every row without one.
fn clamp_window(window: Option<Range<usize>>, count: usize) -> Range<usize> {
    match window {
        Some(rows) => {
            let end = rows.end.min(count);
            rows.start.min(end)..end
        },
        None => 0..count,
    }
}

/// Height of a spacer standing in for `rows` rows. The column adds one
/// spacing gap between the spacer and its neighbour.
fn spacer_extent(rows: usize, row_height: f32, spacing: f32) -> Option<f32> {
    if rows == 0 || row_height <= 0.0 {
        return None;
    }
    Some(rows as f32 * (row_height + spacing) - spacing)
}
