#![forbid(unsafe_code)]

//! Binding compiler and view-model orchestration for fbind.
//!
//! A [`ViewModel`] owns a reactive data object and compiles a view subtree
//! against it. Directive attributes (`v-model`, `v-html`, `v-text`,
//! `v-on:<event>`) and `{{expr}}` text markers become watchers held by the
//! view model's [`BindingSet`].
//!
//! # Example
//!
//! ```
//! use fbind_runtime::{Options, ViewModel};
//! use fbind_view::markup;
//! use serde_json::json;
//!
//! let root = markup::parse(r#"<div><input v-model="user.name"><p>Hello {{user.name}}!</p></div>"#)
//!     .unwrap();
//! let vm = ViewModel::new(
//!     Options::from_json(&json!({ "user": { "name": "Ann" } })).target(root.clone()),
//! )
//! .unwrap();
//!
//! let input = root.find_by_tag("input").remove(0);
//! input.input("Bo").unwrap();
//! assert_eq!(root.find_by_tag("p")[0].to_markup(), "<p>Hello Bo!</p>");
//! assert_eq!(vm.binding_count(), 2);
//! ```
//!
//! # Feature Flags
//!
//! - `toml-config` (default): [`BindConfig::from_toml_str`] and
//!   [`BindConfig::load`].

pub mod binding;
pub mod compiler;
pub mod config;
pub mod directive;
pub mod template;
pub mod updater;
pub mod vm;

pub use binding::BindingSet;
pub use compiler::Compiler;
pub use config::{BindConfig, ConfigError};
pub use directive::Directive;
pub use template::Template;
pub use updater::Updater;
pub use vm::{Method, Options, ViewModel};
