#![forbid(unsafe_code)]

//! Watchers: live bindings between an expression path and a callback.
//!
//! # Invariants
//!
//! 1. Dependencies are captured once, during construction. `update()`
//!    re-evaluates untracked, so a watcher never picks up properties it did
//!    not read the first time (replacing a sub-object leaves the watcher
//!    attached to the old object's cells).
//! 2. The callback runs if and only if the re-evaluated value is strictly
//!    unequal to the stored one.
//! 3. A watcher whose callback is already running is not re-entered; the
//!    nested update only refreshes the stored value.
//!
//! # Failure Modes
//!
//! - Path does not resolve at construction: `Watcher::new` returns the error.
//! - Path stops resolving later: `update()` returns the error, which the
//!   notifying [`Dep`](crate::Dep) logs and aggregates.
//! - Callback error: returned from `update()` the same way.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dep::{Capture, Subscriber, SubscriberId, next_subscriber_id};
use crate::error::Result;
use crate::path::Path;
use crate::value::{Object, Value};

type Callback = Box<dyn FnMut(&Value) -> Result<()>>;

/// Subscriber that re-evaluates `path` against `root` on change.
pub struct Watcher {
    id: SubscriberId,
    me: Weak<dyn Subscriber>,
    root: Object,
    path: Path,
    callback: RefCell<Callback>,
    old: RefCell<Value>,
}

impl Watcher {
    /// Evaluate `path` once under this watcher's capture and keep the result.
    ///
    /// The callback is not invoked for the initial value.
    pub fn new(
        root: &Object,
        path: Path,
        callback: impl FnMut(&Value) -> Result<()> + 'static,
    ) -> Result<Rc<Self>> {
        let id = next_subscriber_id();
        let watcher = Rc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Subscriber> = me.clone();
            Self {
                id,
                me,
                root: root.clone(),
                path,
                callback: RefCell::new(Box::new(callback)),
                old: RefCell::new(Value::Null),
            }
        });
        let initial = watcher.get()?;
        tracing::debug!(watcher = id, path = %watcher.path, "watcher created");
        *watcher.old.borrow_mut() = initial;
        Ok(watcher)
    }

    /// Parse `expr` and build a watcher for it.
    pub fn watch(
        root: &Object,
        expr: &str,
        callback: impl FnMut(&Value) -> Result<()> + 'static,
    ) -> Result<Rc<Self>> {
        Self::new(root, Path::parse(expr)?, callback)
    }

    fn get(&self) -> Result<Value> {
        self.root
            .resolve(&self.path, Some(Capture::new(self.id, &self.me)))
    }

    /// The last observed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.old.borrow().clone()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Subscriber for Watcher {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) -> Result<()> {
        let new = self.root.resolve(&self.path, None)?;
        if *self.old.borrow() == new {
            return Ok(());
        }
        *self.old.borrow_mut() = new.clone();

        let Ok(mut callback) = self.callback.try_borrow_mut() else {
            tracing::debug!(watcher = self.id, path = %self.path, "skipping re-entrant update");
            return Ok(());
        };
        tracing::trace!(watcher = self.id, path = %self.path, "watcher fired");
        (*callback)(&new)
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("path", &self.path.to_string())
            .field("value", &*self.old.borrow())
            .finish()
    }
}
