#![forbid(unsafe_code)]

//! Reactive cells: one intercepted property, its value, and its registry.

use std::cell::RefCell;
use std::fmt;

use crate::dep::{Capture, Dep};
use crate::error::Result;
use crate::value::Value;

/// A single intercepted property.
///
/// Reads made under a [`Capture`] attach the capturing subscriber to this
/// cell's [`Dep`]. Writes that change the value notify that registry before
/// returning.
///
/// Object values are reactive by construction, so a container written here is
/// already intercepted. Raw JSON goes through [`observe`](crate::observe) first.
pub struct ReactiveCell {
    value: RefCell<Value>,
    dep: Dep,
}

impl ReactiveCell {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value: RefCell::new(value),
            dep: Dep::new(),
        }
    }

    /// Read trap.
    pub fn read(&self, capture: Option<Capture<'_>>) -> Value {
        if let Some(capture) = capture {
            self.dep.depend(capture);
        }
        self.value.borrow().clone()
    }

    /// Untracked read.
    #[must_use]
    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Write trap. Returns `Ok(false)` without notifying when `value` is
    /// strictly equal to the stored value.
    pub fn write(&self, value: Value) -> Result<bool> {
        if *self.value.borrow() == value {
            return Ok(false);
        }
        *self.value.borrow_mut() = value;
        self.dep.notify()?;
        Ok(true)
    }

    #[must_use]
    pub fn dep(&self) -> &Dep {
        &self.dep
    }
}

impl fmt::Debug for ReactiveCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("value", &*self.value.borrow())
            .field("dep", &self.dep)
            .finish()
    }
}
