#![forbid(unsafe_code)]

//! Node-mutation functions, one per bindable slot.

use fbind_core::Value;
use fbind_view::ViewNode;

use crate::directive::Directive;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Updater {
    /// Form-control value slot.
    Model,
    /// Markup-content slot.
    Html,
    /// Plain-text slot.
    Text,
}

impl Updater {
    /// The updater a reactive directive writes through.
    #[must_use]
    pub fn for_directive(directive: &Directive) -> Option<Self> {
        match directive {
            Directive::Model => Some(Self::Model),
            Directive::Html => Some(Self::Html),
            Directive::Text => Some(Self::Text),
            Directive::On { .. } => None,
        }
    }

    pub fn apply<N: ViewNode>(self, node: &N, value: &Value) {
        self.apply_str(node, &value.to_string());
    }

    pub fn apply_str<N: ViewNode>(self, node: &N, text: &str) {
        match self {
            Self::Model => node.set_value(text),
            Self::Html => node.set_inner_html(text),
            Self::Text => node.set_text(text),
        }
    }
}
