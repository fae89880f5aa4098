#![forbid(unsafe_code)]

//! Test harness and reference fixtures for fbind.
//!
//! - [`test_logging`]: route `tracing` output through the test writer.
//! - [`outline`]: deterministic, indentation-based dump of a view tree.
//! - [`CallLog`]: records watcher and method invocations.
//! - [`fixtures`]: canned data objects and templates.
//! - [`strategies`]: proptest strategies for scalar values.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use fbind_core::{Result, Value};
use fbind_view::{Node, NodeKind, ViewNode};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Route this thread's `tracing` output to the libtest capture buffer until
/// the guard drops.
///
/// Honors `RUST_LOG`; defaults to `debug` for the fbind crates. The global
/// dispatcher is left alone, so `#[traced_test]` can share the test binary.
#[must_use = "logging stops when the guard drops"]
pub fn test_logging() -> DefaultGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("fbind_core=debug,fbind_view=debug,fbind_runtime=debug")
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

// ---------------------------------------------------------------------------
// Tree outline
// ---------------------------------------------------------------------------

/// Render `root` as one line per node, two spaces of indent per level.
///
/// Elements print as `tag [attr="v" ...]`, followed by `value="..."` when the
/// value slot is set and `html=...` when markup content is set. Text nodes
/// print quoted.
#[must_use]
pub fn outline(root: &Node) -> String {
    let mut out = String::new();
    write_outline(root, 0, &mut out);
    out
}

fn write_outline(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node.kind() {
        NodeKind::Text => {
            let _ = writeln!(out, "{indent}{:?}", node.text());
        }
        NodeKind::Element => {
            let _ = write!(out, "{indent}{}", node.tag());
            for (name, value) in node.attributes() {
                let _ = write!(out, " {name}={value:?}");
            }
            let value = node.value();
            if !value.is_empty() {
                let _ = write!(out, " value={value:?}");
            }
            if let Some(html) = node.inner_html() {
                let _ = write!(out, " html={html:?}");
            }
            out.push('\n');
            for child in node.children() {
                write_outline(&child, depth + 1, out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CallLog
// ---------------------------------------------------------------------------

/// Shared, ordered record of callback invocations.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// A watcher callback appending `label=value`.
    pub fn recorder(&self, label: &str) -> impl FnMut(&Value) -> Result<()> + 'static {
        let log = self.clone();
        let label = label.to_owned();
        move |value| {
            log.push(format!("{label}={value}"));
            Ok(())
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub mod fixtures {
    use serde_json::json;

    /// `{ user: { name: "Ann" }, count: 0 }`
    #[must_use]
    pub fn user_data() -> serde_json::Value {
        json!({ "user": { "name": "Ann" }, "count": 0 })
    }

    /// Nested school record used by the demo page.
    #[must_use]
    pub fn school_data() -> serde_json::Value {
        json!({
            "school": { "name": "Riverside", "age": 10 },
            "message": "<h1>welcome</h1>"
        })
    }

    /// A form with a two-way input, a greeting and a click handler.
    pub const FORM_TEMPLATE: &str = r#"<div id="app">
  <input type="text" v-model="user.name">
  <p>Hello {{user.name}}!</p>
  <button v-on:click="increment">+1</button>
  <span>{{count}}</span>
</div>"#;

    /// The demo page: nested interpolation, markup binding and a method.
    pub const SCHOOL_TEMPLATE: &str = r#"<div id="app">
  <input type="text" v-model="school.name">
  <div>{{school.name}} {{school.age}}</div>
  <ul><li>{{school.name}}</li></ul>
  <p>{{describe}}</p>
  <div v-html="message"></div>
  <button v-on:click="change">change</button>
</div>"#;
}

// ---------------------------------------------------------------------------
// Proptest strategies
// ---------------------------------------------------------------------------

pub mod strategies {
    use fbind_core::Value;
    use proptest::prelude::*;

    /// Non-container values. NaN is excluded so value equality is reflexive.
    pub fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1.0e6f64..1.0e6).prop_map(Value::Number),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }
}
