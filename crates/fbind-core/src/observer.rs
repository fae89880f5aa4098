#![forbid(unsafe_code)]

//! Property interception for plain data.
//!
//! [`observe`] turns a plain JSON document into an intercepted [`Value`]:
//! every nested mapping becomes an [`Object`] whose keys are reactive cells.
//! Children are intercepted before the key that holds them is defined, so a
//! container is fully observable by the time anything can read it.
//!
//! Arrays are intercepted like mappings keyed by index (`"0"`, `"1"`, ...).
//! Array mutation methods are not trapped.

use crate::value::{Object, Value};

/// Intercept `raw` recursively, depth-first.
#[must_use]
pub fn observe(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            let obj = Object::new();
            for (i, item) in items.iter().enumerate() {
                let value = observe(item);
                obj.define_reactive(i.to_string(), value);
            }
            Value::Object(obj)
        }
        serde_json::Value::Object(map) => {
            let obj = Object::new();
            for (key, item) in map {
                let value = observe(item);
                obj.define_reactive(key.clone(), value);
            }
            tracing::trace!(object = obj.id(), keys = obj.len(), "observed object");
            Value::Object(obj)
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        observe(&raw)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(raw: &serde_json::Value) -> Self {
        observe(raw)
    }
}

impl Object {
    /// Intercept a JSON mapping. Non-mapping input yields an empty object.
    #[must_use]
    pub fn from_json(raw: &serde_json::Value) -> Self {
        match observe(raw) {
            Value::Object(obj) => obj,
            _ => Self::new(),
        }
    }
}
