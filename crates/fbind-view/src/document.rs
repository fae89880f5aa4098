#![forbid(unsafe_code)]

//! A document: a root node plus selector lookup.

use crate::markup::{self, MarkupError};
use crate::node::Node;

/// Owns a root [`Node`] and resolves simple selectors against it.
#[derive(Clone, Debug)]
pub struct Document {
    root: Node,
}

impl Document {
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Parse `source` (one root element) into a document.
    pub fn parse(source: &str) -> Result<Self, MarkupError> {
        markup::parse(source).map(Self::new)
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// First node matching `selector`, in document order.
    ///
    /// Supports `#id` and bare tag names.
    #[must_use]
    pub fn query(&self, selector: &str) -> Option<Node> {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            return self.root.find_by_id(id);
        }
        self.root.find_by_tag(selector).into_iter().next()
    }

    #[must_use]
    pub fn to_markup(&self) -> String {
        self.root.to_markup()
    }
}
