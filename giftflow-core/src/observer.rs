//! Listener registration with explicit cancellation handles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Handle for anything that must be torn down: a listener slot, a remote feed, a
/// storage-event hook. Cancelling twice is a no-op; dropping the handle cancels.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slots<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Ordered set of callbacks notified with a shared value.
///
/// Emission snapshots the current callbacks first, so a callback may register or
/// cancel listeners without re-entering a borrow.
pub struct Listeners<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Rc::clone(&self.slots),
        }
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> Listeners<T> {
    pub fn add(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Rc::new(callback)));
            id
        };
        let weak: Weak<RefCell<Slots<T>>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.borrow_mut().entries.retain(|(slot, _)| *slot != id);
            }
        })
    }

    pub fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .slots
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
