#![forbid(unsafe_code)]

//! The view-node boundary and its in-memory implementation.
//!
//! [`ViewNode`] is everything the binding compiler needs from a rendering
//! surface: classification, attributes, the text/value/markup slots, event
//! registration, moving children in and out of an off-screen holder, and
//! retaining binding handles for the node's lifetime.
//!
//! [`Node`] implements it over `Rc<RefCell<..>>` so templates can be compiled
//! and driven headlessly (tests, server-side rendering, demos).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fbind_core::{BindError, Result};

/// Element or text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// An event delivered to listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    name: String,
    value: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Attach the target's current value (what the user typed).
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Event callback registered on a node.
pub type Listener = Rc<dyn Fn(&Event) -> Result<()>>;

/// Wrap a closure as a [`Listener`].
pub fn listener(f: impl Fn(&Event) -> Result<()> + 'static) -> Listener {
    Rc::new(f)
}

/// What the binding compiler requires from a view node.
///
/// Handles are cheap to clone and share the underlying node.
pub trait ViewNode: Clone + 'static {
    fn kind(&self) -> NodeKind;

    /// Attributes as `(name, value)` pairs, in document order.
    fn attributes(&self) -> Vec<(String, String)>;

    fn children(&self) -> Vec<Self>;

    /// Text content (descendant text for elements).
    fn text(&self) -> String;

    fn set_text(&self, text: &str);

    /// Form-control value slot.
    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    /// Markup-content slot. Replaces the node's children.
    fn set_inner_html(&self, markup: &str);

    fn add_listener(&self, event: &str, listener: Listener);

    /// Detach every child into an off-screen holder.
    fn take_children(&self) -> Vec<Self>;

    /// Reattach previously detached children.
    fn append_children(&self, children: Vec<Self>);

    /// Keep `handle` alive for as long as this node lives.
    fn retain(&self, handle: Rc<dyn Any>);
}

// ---------------------------------------------------------------------------
// Node: in-memory view node
// ---------------------------------------------------------------------------

/// Elements rendered without a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

struct NodeData {
    kind: NodeKind,
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    value: String,
    inner_html: Option<String>,
    children: Vec<Node>,
    listeners: Vec<(String, Listener)>,
    retained: Vec<Rc<dyn Any>>,
}

/// Shared handle to an in-memory view node.
#[derive(Clone)]
pub struct Node {
    data: Rc<RefCell<NodeData>>,
}

impl Node {
    fn with_data(kind: NodeKind, tag: String, text: String) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                kind,
                tag,
                attrs: Vec::new(),
                text,
                value: String::new(),
                inner_html: None,
                children: Vec::new(),
                listeners: Vec::new(),
                retained: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_data(NodeKind::Element, tag.into().to_ascii_lowercase(), String::new())
    }

    #[must_use]
    pub fn text_node(content: impl Into<String>) -> Self {
        Self::with_data(NodeKind::Text, String::new(), content.into())
    }

    /// Builder: add an attribute. A `value` attribute also seeds the value slot.
    #[must_use]
    pub fn with_attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn with_child(self, child: Node) -> Self {
        self.append(child);
        self
    }

    /// Builder: append a text child.
    #[must_use]
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.append(Node::text_node(content));
        self
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        let mut data = self.data.borrow_mut();
        if name == "value" {
            data.value.clone_from(&value);
        }
        match data.attrs.iter().position(|(n, _)| *n == name) {
            Some(i) => data.attrs[i].1 = value,
            None => data.attrs.push((name, value)),
        }
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.data
            .borrow()
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn append(&self, child: Node) {
        self.data.borrow_mut().children.push(child);
    }

    #[must_use]
    pub fn tag(&self) -> String {
        self.data.borrow().tag.clone()
    }

    #[must_use]
    pub fn inner_html(&self) -> Option<String> {
        self.data.borrow().inner_html.clone()
    }

    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.data
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Run every listener registered for `event.name()`.
    ///
    /// An event without a value is delivered carrying the node's current
    /// value slot. All listeners run even if some fail. Returns how many ran,
    /// or the collected failures.
    pub fn dispatch(&self, event: &Event) -> Result<usize> {
        let event = match event.value() {
            Some(_) => event.clone(),
            None => event.clone().with_value(self.value()),
        };
        let event = &event;
        let listeners: Vec<Listener> = self
            .data
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event.name())
            .map(|(_, l)| Rc::clone(l))
            .collect();

        let mut failures = Vec::new();
        for listener in &listeners {
            if let Err(err) = listener(event) {
                tracing::warn!(event = event.name(), error = %err, "listener failed");
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(listeners.len())
        } else {
            Err(BindError::Subscribers(failures))
        }
    }

    /// Simulate typing: set the value slot, then dispatch `input`.
    pub fn input(&self, typed: &str) -> Result<usize> {
        self.type_into("input", typed)
    }

    /// Like [`input`](Self::input) with a custom event name.
    pub fn type_into(&self, event: &str, typed: &str) -> Result<usize> {
        self.set_value(typed);
        self.dispatch(&Event::new(event).with_value(typed))
    }

    /// Simulate a click.
    pub fn click(&self) -> Result<usize> {
        self.dispatch(&Event::new("click"))
    }

    fn find(&self, pred: &dyn Fn(&Node) -> bool) -> Option<Node> {
        if pred(self) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find(pred))
    }

    fn find_all(&self, pred: &dyn Fn(&Node) -> bool) -> Vec<Node> {
        let mut out = Vec::new();
        self.collect(pred, &mut out);
        out
    }

    fn collect(&self, pred: &dyn Fn(&Node) -> bool, out: &mut Vec<Node>) {
        if pred(self) {
            out.push(self.clone());
        }
        for child in self.children() {
            child.collect(pred, out);
        }
    }

    /// First node in document order, including `self`, whose `id` matches.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        self.find(&|n| n.attr("id").as_deref() == Some(id))
    }

    /// Every element with `tag`, in document order, including `self`.
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Vec<Node> {
        let tag = tag.to_ascii_lowercase();
        self.find_all(&|n| n.kind() == NodeKind::Element && n.tag() == tag)
    }

    /// Serialize this node (and its subtree) as markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.data.borrow();
        match data.kind {
            NodeKind::Text => out.push_str(&escape_text(&data.text)),
            NodeKind::Element => {
                out.push('<');
                out.push_str(&data.tag);
                for (name, value) in &data.attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                    return;
                }
                match &data.inner_html {
                    Some(markup) => out.push_str(markup),
                    None => {
                        for child in &data.children {
                            child.write_markup(out);
                        }
                    }
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl ViewNode for Node {
    fn kind(&self) -> NodeKind {
        self.data.borrow().kind
    }

    fn attributes(&self) -> Vec<(String, String)> {
        self.data.borrow().attrs.clone()
    }

    fn children(&self) -> Vec<Self> {
        self.data.borrow().children.clone()
    }

    fn text(&self) -> String {
        let data = self.data.borrow();
        match data.kind {
            NodeKind::Text => data.text.clone(),
            NodeKind::Element => data.children.iter().map(ViewNode::text).collect(),
        }
    }

    fn set_text(&self, text: &str) {
        let kind = self.kind();
        match kind {
            NodeKind::Text => self.data.borrow_mut().text = text.to_owned(),
            NodeKind::Element => {
                let mut data = self.data.borrow_mut();
                data.inner_html = None;
                data.children = vec![Node::text_node(text)];
            }
        }
    }

    fn value(&self) -> String {
        self.data.borrow().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.data.borrow_mut().value = value.to_owned();
    }

    fn set_inner_html(&self, markup: &str) {
        let mut data = self.data.borrow_mut();
        data.children.clear();
        data.inner_html = Some(markup.to_owned());
    }

    fn add_listener(&self, event: &str, listener: Listener) {
        self.data
            .borrow_mut()
            .listeners
            .push((event.to_owned(), listener));
    }

    fn take_children(&self) -> Vec<Self> {
        std::mem::take(&mut self.data.borrow_mut().children)
    }

    fn append_children(&self, children: Vec<Self>) {
        self.data.borrow_mut().children.extend(children);
    }

    fn retain(&self, handle: Rc<dyn Any>) {
        self.data.borrow_mut().retained.push(handle);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        match data.kind {
            NodeKind::Text => f.debug_tuple("Text").field(&data.text).finish(),
            NodeKind::Element => f
                .debug_struct("Element")
                .field("tag", &data.tag)
                .field("attrs", &data.attrs)
                .field("children", &data.children.len())
                .field("listeners", &data.listeners.len())
                .finish(),
        }
    }
}
