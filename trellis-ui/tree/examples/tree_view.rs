use std::collections::HashMap;

use env_logger::Env;
use iced::keyboard::key::Named;
use iced::widget::scrollable::AbsoluteOffset;
use iced::widget::{
    Space, button, column, container, operation, row, scrollable, text,
};
use iced::{Color, Element, Length, Size, Subscription, Task};
use log::warn;
use trellis_list::{
    Key as ListKey, ListOptions, Result, Selection, TreeNode,
    TreeToListAdapter, VirtualList,
};
use trellis_ui_tree::{TreeRowContext, TreeView};

const ROW_HEIGHT: f32 = 22.0;
const TREE_SCROLL_ID: &str = "tree_scroll";

fn main() -> iced::Result {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    iced::application(App::new, App::update, App::view)
        .title("Tree view")
        .window_size(Size {
            width: 800.0,
            height: 600.0,
        })
        .subscription(App::subscription)
        .run()
}

#[derive(Debug, Clone)]
enum Message {
    Select(u32),
    Toggle(u32),
    Hover(Option<u32>),
    AddChild(u32),
    ExpandAll,
    CollapseAll,
    Scrolled(scrollable::Viewport),
    Keyboard(iced::keyboard::Event),
}

struct Node {
    item: u32,
    children: Vec<Node>,
}

impl TreeNode for Node {
    type Item = u32;

    fn item(&self) -> u32 {
        self.item
    }

    fn count(&self) -> usize {
        self.children.len()
    }

    fn node_at(&self, index: usize) -> &Self {
        &self.children[index]
    }
}

#[derive(Default)]
struct Animals {
    roots: Vec<Node>,
    names: HashMap<u32, String>,
    next_item: u32,
}

impl Animals {
    /// Append a node named `name` below `parent`, or at the top level.
    fn add(&mut self, parent: Option<u32>, name: &str) -> u32 {
        let item = self.next_item;
        self.next_item += 1;
        self.names.insert(item, name.to_owned());

        let node = Node {
            item,
            children: Vec::new(),
        };
        match parent.and_then(|parent| find_mut(&mut self.roots, parent)) {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
        item
    }

    fn name(&self, item: &u32) -> &str {
        self.names.get(item).map_or("?", String::as_str)
    }
}

fn find_mut(nodes: &mut [Node], item: u32) -> Option<&mut Node> {
    for node in nodes {
        if node.item == item {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, item) {
            return Some(found);
        }
    }
    None
}

/// Build the sample tree and return the item of "Doves".
fn add_species(animals: &mut Animals) -> u32 {
    let root = Some(animals.add(None, "Animals"));

    let mammals = Some(animals.add(root, "Mammals"));
    for name in ["Cats", "Dogs", "Horses", "Duck-billed platypuses"] {
        animals.add(mammals, name);
    }

    let birds = Some(animals.add(root, "Birds"));
    animals.add(birds, "Peacocks");
    let doves = animals.add(birds, "Doves");

    let reptiles = Some(animals.add(root, "Reptiles"));
    for name in ["Lizards", "Turtles", "Crocodiles", "Snakes"] {
        animals.add(reptiles, name);
    }

    let arthropods = Some(animals.add(root, "Arthropods"));
    let crustaceans = Some(animals.add(arthropods, "Crustaceans"));
    animals.add(crustaceans, "Crabs");
    animals.add(crustaceans, "Lobsters");
    let insects = Some(animals.add(arthropods, "Insects"));
    animals.add(insects, "Ants");
    animals.add(insects, "Bees");
    let arachnids = Some(animals.add(arthropods, "Arachnids"));
    animals.add(arachnids, "Spiders");
    animals.add(arachnids, "Scorpions");

    doves
}

struct App {
    animals: Animals,
    adapter: TreeToListAdapter<u32>,
    list: VirtualList<u32, ()>,
    selection: Selection<u32>,
    proxy: Option<u32>,
    hovered: Option<u32>,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let mut animals = Animals::default();
        let doves = add_species(&mut animals);
        let adapter = TreeToListAdapter::new(&animals.roots);
        let list = VirtualList::new(ListOptions {
            item_extent: ROW_HEIGHT,
            viewport_extent: 600.0,
            ..ListOptions::default()
        });

        let mut app = Self {
            animals,
            adapter,
            list,
            selection: Selection::new(),
            proxy: None,
            hovered: None,
        };
        app.selection
            .select_tree_item(&app.adapter, &app.animals.roots, doves);
        if let Err(err) = app.adapter.show(&app.animals.roots, &doves) {
            warn!("failed to reveal the initial selection: {err}");
        }
        app.sync();
        (app, Task::none())
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::keyboard::listen().map(Message::Keyboard)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let keyboard = matches!(message, Message::Keyboard(_));
        if let Err(err) = self.apply(message) {
            warn!("tree update failed: {err}");
        }
        self.sync();
        if !keyboard {
            return Task::none();
        }
        operation::scroll_to(
            TREE_SCROLL_ID,
            AbsoluteOffset {
                x: 0.0,
                y: self.list.scroll_offset(),
            },
        )
    }

    fn apply(&mut self, message: Message) -> Result<()> {
        let roots = &self.animals.roots;
        match message {
            Message::Select(item) => {
                self.selection.select(&self.adapter, item);
            },
            Message::Toggle(item) => {
                self.adapter.toggle_expanded(roots, &item)?;
            },
            Message::Hover(item) => {
                self.hovered = item;
            },
            Message::AddChild(item) => {
                self.animals.add(Some(item), "<new>");
                self.adapter.data_changed(&self.animals.roots, false)?;
            },
            Message::ExpandAll => self.adapter.expand_all(roots)?,
            Message::CollapseAll => self.adapter.collapse_all(),
            Message::Scrolled(viewport) => {
                self.list.set_viewport_extent(viewport.bounds().height);
                self.list.set_scroll_offset(viewport.absolute_offset().y);
            },
            Message::Keyboard(iced::keyboard::Event::KeyPressed {
                key: iced::keyboard::Key::Named(key),
                ..
            }) => {
                if let Some(key) = list_key(key) {
                    self.selection.key_press(
                        &mut self.adapter,
                        roots,
                        &mut self.list,
                        key,
                    )?;
                }
            },
            Message::Keyboard(_) => {},
        }
        Ok(())
    }

    /// Bring the virtual list and the selection proxy up to date with the
    /// adapter.
    fn sync(&mut self) {
        self.list.layout(&self.adapter, |_, _| ());
        self.proxy = self.selection.proxy(&self.adapter, &self.animals.roots);
    }

    fn view(&self) -> Element<'_, Message> {
        let tree = TreeView::new(&self.adapter, |context| {
            self.render_row(context)
        })
        .virtual_list(&self.list)
        .selected(self.selection.selected())
        .proxy(self.proxy.as_ref())
        .hovered(self.hovered.as_ref())
        .on_press(Message::Select)
        .on_toggle(Message::Toggle)
        .on_hover(Message::Hover)
        .row_style(row_style)
        .toggle_content(toggle_icon)
        .toggle_width(16.0)
        .indent_width(14.0)
        .view();

        let tree = scrollable::Scrollable::new(tree)
            .width(Length::Fill)
            .height(Length::Fill)
            .id(TREE_SCROLL_ID)
            .on_scroll(Message::Scrolled);

        let buttons = row![
            button("Expand All").on_press(Message::ExpandAll),
            button("Collapse All").on_press(Message::CollapseAll),
        ]
        .spacing(8);

        container(column![tree, buttons].spacing(8))
            .padding(10)
            .into()
    }

    fn render_row<'a>(
        &'a self,
        context: &TreeRowContext<'a, u32>,
    ) -> Element<'a, Message> {
        let item = *context.item();
        row![
            text(self.animals.name(&item)),
            button(text("+").size(12))
                .padding([0, 6])
                .on_press(Message::AddChild(item)),
        ]
        .spacing(6)
        .into()
    }
}

fn list_key(key: Named) -> Option<ListKey> {
    match key {
        Named::ArrowUp => Some(ListKey::Up),
        Named::ArrowDown => Some(ListKey::Down),
        Named::ArrowLeft => Some(ListKey::Left),
        Named::ArrowRight => Some(ListKey::Right),
        Named::PageUp => Some(ListKey::PageUp),
        Named::PageDown => Some(ListKey::PageDown),
        _ => None,
    }
}

fn row_style(context: &TreeRowContext<'_, u32>) -> container::Style {
    let background = if context.is_selected {
        Some(Color::from_rgb(0.12, 0.26, 0.46).into())
    } else if context.is_proxy {
        Some(Color::from_rgb(0.12, 0.18, 0.26).into())
    } else if context.is_hovered {
        Some(Color::from_rgb(0.18, 0.18, 0.18).into())
    } else {
        None
    };

    container::Style {
        background,
        text_color: Some(Color::from_rgb(0.9, 0.9, 0.9)),
        ..Default::default()
    }
}

fn toggle_icon<'a>(context: &TreeRowContext<'a, u32>) -> Element<'a, Message> {
    if context.node.is_leaf() {
        Space::new().width(Length::Fixed(16.0)).into()
    } else if context.node.is_expanded() {
        text("[-]").into()
    } else {
        text("[+]").into()
    }
}
