#![forbid(unsafe_code)]

//! fbind public facade crate.
//!
//! ```
//! use fbind::prelude::*;
//! use serde_json::json;
//!
//! let doc = Document::parse(r#"<main><div id="app"><b>{{greeting}}</b></div></main>"#).unwrap();
//! let vm = ViewModel::new(
//!     Options::from_json(&json!({ "greeting": "hi" }))
//!         .target_selector(&doc, "#app")
//!         .unwrap(),
//! )
//! .unwrap();
//! vm.set("greeting", "hello").unwrap();
//! assert_eq!(doc.to_markup(), r#"<main><div id="app"><b>hello</b></div></main>"#);
//! ```

pub use fbind_core as core;
#[cfg(feature = "runtime")]
pub use fbind_runtime as runtime;
pub use fbind_view as view;

pub mod prelude {
    pub use fbind_core::{BindError, Object, Path, Result, Value, Watcher};
    #[cfg(feature = "runtime")]
    pub use fbind_runtime::{BindConfig, Options, ViewModel};
    pub use fbind_view::{Document, Event, Node, ViewNode};
}
