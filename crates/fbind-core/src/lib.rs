#![forbid(unsafe_code)]

//! Reactive core for fbind.
//!
//! - [`Object`] / [`Value`]: the intercepted data model. Every reactive
//!   property is a [`ReactiveCell`] owning one [`Dep`].
//! - [`observe`]: turns plain JSON into intercepted objects, depth-first.
//! - [`Watcher`]: binds an expression [`Path`] to a callback and re-runs it
//!   when a property it read changes.
//!
//! # Architecture
//!
//! Dependency capture is explicit. A watcher evaluates its path passing a
//! [`Capture`] down every read; each reactive cell touched attaches the
//! watcher to its registry. Reads without a capture attach nothing, so two
//! evaluations can never leak dependencies into each other.
//!
//! Everything is single-threaded (`Rc`/`RefCell`) and synchronous: a write
//! returns only after every affected watcher has run.
//!
//! # Example
//!
//! ```
//! use fbind_core::{Object, Watcher};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let data = Object::from_json(&json!({ "user": { "name": "Ann" } }));
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _watcher = Watcher::watch(&data, "user.name", move |v| {
//!     sink.borrow_mut().push(v.to_string());
//!     Ok(())
//! })
//! .unwrap();
//!
//! data.assign(&"user.name".parse().unwrap(), "Bo").unwrap();
//! assert_eq!(*seen.borrow(), ["Bo"]);
//! assert_eq!(data.get("user").unwrap().to_json(), json!({ "name": "Bo" }));
//! ```

pub mod cell;
pub mod dep;
pub mod error;
pub mod observer;
pub mod path;
pub mod value;
pub mod watcher;

pub use cell::ReactiveCell;
pub use dep::{Capture, Dep, Subscriber, SubscriberId, next_subscriber_id};
pub use error::{BindError, Result};
pub use observer::observe;
pub use path::Path;
pub use value::{Computed, ComputedFn, ComputedScope, Object, Property, Value};
pub use watcher::Watcher;
