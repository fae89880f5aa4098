#![forbid(unsafe_code)]

//! Ownership of the watchers a compiled template creates.
//!
//! Registries hold watchers weakly, so a watcher lives exactly as long as
//! the [`BindingSet`] that holds it. Dropping or clearing the set
//! disconnects every binding it owns.
//!
//! # Invariants
//!
//! 1. Watchers are released in reverse registration order on drop.
//! 2. After drop or [`clear`](BindingSet::clear), no callback from this set
//!    fires again.
//! 3. [`len`](BindingSet::len) counts every watcher created, including
//!    duplicates for repeated paths.

use std::fmt;
use std::rc::Rc;

use fbind_core::{Object, Path, Result, Value, Watcher};

/// Holds the watchers of one view model.
#[derive(Default)]
pub struct BindingSet {
    watchers: Vec<Rc<Watcher>>,
}

impl BindingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `watcher` alive until the set is dropped or cleared.
    pub fn hold(&mut self, watcher: Rc<Watcher>) {
        self.watchers.push(watcher);
    }

    /// Create a watcher on `path` and hold it.
    pub fn watch(
        &mut self,
        root: &Object,
        path: Path,
        callback: impl FnMut(&Value) -> Result<()> + 'static,
    ) -> Result<Rc<Watcher>> {
        let watcher = Watcher::new(root, path, callback)?;
        self.hold(Rc::clone(&watcher));
        Ok(watcher)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Watcher>> {
        self.watchers.iter()
    }

    /// Release every watcher now. The set stays usable.
    pub fn clear(&mut self) {
        while self.watchers.pop().is_some() {}
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSet")
            .field("binding_count", &self.watchers.len())
            .finish()
    }
}
