#![forbid(unsafe_code)]

//! Per-property subscriber registries.
//!
//! A [`Dep`] is owned by exactly one reactive property. Subscribers attach
//! themselves while their expression is being evaluated under a [`Capture`];
//! a write to the property calls [`Dep::notify`], which runs every live
//! subscriber's [`Subscriber::update`].
//!
//! # Invariants
//!
//! 1. A subscriber id appears at most once per registry.
//! 2. Subscribers are notified synchronously, in registration order.
//! 3. Registries hold `Weak` handles; dropped subscribers are pruned lazily
//!    during notification.
//! 4. A failing subscriber does not stop the others. Failures are logged and
//!    returned together once every subscriber has run.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;

use crate::error::{BindError, Result};

/// Identity of a subscriber, unique for the process lifetime.
pub type SubscriberId = u64;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh [`SubscriberId`].
#[must_use]
pub fn next_subscriber_id() -> SubscriberId {
    NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Something a [`Dep`] can notify.
pub trait Subscriber {
    fn id(&self) -> SubscriberId;

    /// React to a change in one of the properties this subscriber depends on.
    fn update(&self) -> Result<()>;
}

/// The subscriber currently capturing dependencies.
///
/// Passed explicitly down every tracked read. A read made with `None`
/// attaches nothing.
#[derive(Clone, Copy)]
pub struct Capture<'a> {
    id: SubscriberId,
    target: &'a Weak<dyn Subscriber>,
}

impl<'a> Capture<'a> {
    #[must_use]
    pub fn new(id: SubscriberId, target: &'a Weak<dyn Subscriber>) -> Self {
        Self { id, target }
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl fmt::Debug for Capture<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture").field("id", &self.id).finish()
    }
}

struct Entry {
    id: SubscriberId,
    subscriber: Weak<dyn Subscriber>,
}

/// Dependency registry for a single reactive property.
#[derive(Default)]
pub struct Dep {
    entries: RefCell<Vec<Entry>>,
    ids: RefCell<AHashSet<SubscriberId>>,
}

impl Dep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the capturing subscriber. Returns `false` if it was already attached.
    pub fn depend(&self, capture: Capture<'_>) -> bool {
        if !self.ids.borrow_mut().insert(capture.id) {
            return false;
        }
        self.entries.borrow_mut().push(Entry {
            id: capture.id,
            subscriber: capture.target.clone(),
        });
        tracing::trace!(subscriber = capture.id, "dependency captured");
        true
    }

    /// Run every live subscriber's update, in registration order.
    pub fn notify(&self) -> Result<()> {
        // Snapshot first: updates may read (and so borrow) this registry again.
        let live: Vec<Rc<dyn Subscriber>> = {
            let mut entries = self.entries.borrow_mut();
            let mut ids = self.ids.borrow_mut();
            entries.retain(|e| {
                let alive = e.subscriber.strong_count() > 0;
                if !alive {
                    ids.remove(&e.id);
                }
                alive
            });
            entries.iter().filter_map(|e| e.subscriber.upgrade()).collect()
        };

        tracing::trace!(subscribers = live.len(), "notify");
        let mut failures = Vec::new();
        for subscriber in live {
            if let Err(err) = subscriber.update() {
                tracing::warn!(subscriber = subscriber.id(), error = %err, "subscriber update failed");
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BindError::Subscribers(failures))
        }
    }

    /// Number of registered subscribers, including ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.ids.borrow().contains(&id)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("subscribers", &self.len())
            .finish()
    }
}
