#![forbid(unsafe_code)]

//! The closed set of directives and their attribute syntax.
//!
//! A directive attribute is `<prefix><name>[:<event>]`, e.g. `v-model`,
//! `v-html`, `v-text`, `v-on:click`. Text-node interpolation (`{{expr}}`)
//! binds through [`Directive::Text`] as well.

use std::fmt;

use fbind_core::{BindError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Two-way binding of a form control's value slot.
    Model,
    /// One-way binding of the markup-content slot.
    Html,
    /// One-way binding of plain text content.
    Text,
    /// Static dispatch of `event` to a view-model method.
    On { event: String },
}

impl Directive {
    /// Classify an attribute name.
    ///
    /// `Ok(None)` means the attribute is not a directive. A prefixed name
    /// outside the closed set is an error.
    pub fn parse(attr: &str, prefix: &str) -> Result<Option<Self>> {
        let Some(body) = attr.strip_prefix(prefix) else {
            return Ok(None);
        };
        let (name, event) = match body.split_once(':') {
            Some((name, event)) => (name, Some(event.trim())),
            None => (body, None),
        };
        let directive = match (name, event) {
            ("model", _) => Self::Model,
            ("html", _) => Self::Html,
            ("text", _) => Self::Text,
            ("on", Some(event)) if !event.is_empty() => Self::On {
                event: event.to_owned(),
            },
            ("on", _) => {
                return Err(BindError::MissingEventName {
                    name: format!("{prefix}on"),
                });
            }
            _ => {
                return Err(BindError::UnknownDirective {
                    name: attr.to_owned(),
                });
            }
        };
        Ok(Some(directive))
    }

    /// Whether the directive creates a watcher.
    #[must_use]
    pub fn is_reactive(&self) -> bool {
        !matches!(self, Self::On { .. })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Html => f.write_str("html"),
            Self::Text => f.write_str("text"),
            Self::On { event } => write!(f, "on:{event}"),
        }
    }
}
