#![forbid(unsafe_code)]

//! View-node tree for fbind.
//!
//! The binding compiler only talks to the [`ViewNode`] trait. This crate
//! also ships [`Node`], an in-memory implementation with markup
//! serialization and event simulation, and [`markup`], a reader for the
//! template subset.

pub mod document;
pub mod markup;
pub mod node;

pub use document::Document;
pub use markup::MarkupError;
pub use node::{Event, Listener, Node, NodeKind, VOID_ELEMENTS, ViewNode, listener};
