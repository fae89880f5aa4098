#![forbid(unsafe_code)]

//! Error type shared by the reactive core and everything built on it.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed path | Empty expression or empty segment | `InvalidPath` |
//! | Missing key | Path walks through a key the object lacks | `MissingPath` |
//! | Scalar intermediate | Path continues past a non-object value | `NotAnObject` |
//! | Computed write | Assigning to a derived property | `ReadOnly` |
//! | Subscriber failure | One or more callbacks failed during notify | `Subscribers` |

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

#[derive(Debug, Clone, Error)]
pub enum BindError {
    #[error("invalid expression path: {expr:?}")]
    InvalidPath { expr: String },

    #[error("cannot resolve '{path}': no property '{segment}'")]
    MissingPath { path: String, segment: String },

    #[error("cannot resolve '{path}': '{segment}' is not an object")]
    NotAnObject { path: String, segment: String },

    #[error("property '{key}' is computed and cannot be assigned")]
    ReadOnly { key: String },

    #[error("unknown directive '{name}'")]
    UnknownDirective { name: String },

    #[error("directive '{name}' requires an event name (e.g. {name}:click)")]
    MissingEventName { name: String },

    #[error("no method named '{name}'")]
    UnknownMethod { name: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("target '{selector}' matched no node")]
    TargetNotFound { selector: String },

    #[error("{} subscriber(s) failed; first: {}", .0.len(), first_message(.0))]
    Subscribers(Vec<BindError>),

    #[error("{message}")]
    Callback { message: String },
}

fn first_message(errors: &[BindError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

impl BindError {
    /// Build a free-form callback failure.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Flatten nested subscriber aggregates into their leaf errors.
    #[must_use]
    pub fn leaves(&self) -> Vec<&BindError> {
        match self {
            Self::Subscribers(inner) => inner.iter().flat_map(BindError::leaves).collect(),
            other => vec![other],
        }
    }
}
