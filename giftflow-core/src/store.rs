//! Local key/value persistence and cross-tab change signals.

use crate::error::StoreError;
use crate::observer::Subscription;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Trait for abstracting the browser-scoped key/value cache.
/// Platform-specific implementations should provide this.
pub trait PersistedStore {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be reached.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage is unavailable or rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage is unavailable.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A key changed in another tab of the same browser.
///
/// `key` is `None` when the other tab cleared the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: Option<String>,
    pub new_value: Option<String>,
}

impl StorageChange {
    #[must_use]
    pub fn touches(&self, key: &str) -> bool {
        self.key.as_deref().is_none_or(|changed| changed == key)
    }
}

/// Source of storage-change notifications originating in other tabs.
///
/// Delivery may repeat; handlers must be idempotent.
pub trait StorageSignals {
    fn watch(&self, on_change: Box<dyn Fn(&StorageChange)>) -> Subscription;
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization fails or the store rejects the write.
pub fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: PersistedStore + ?Sized,
    T: serde::Serialize,
{
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

type WatchFn = Rc<dyn Fn(&StorageChange)>;

struct Watcher {
    id: u64,
    tab: u64,
    on_change: WatchFn,
}

#[derive(Default)]
struct Backing {
    entries: HashMap<String, String>,
    watchers: Vec<Watcher>,
    pending: VecDeque<(u64, StorageChange)>,
    next_tab: u64,
    next_watch: u64,
    fail_writes: bool,
}

/// In-memory store shared by every tab opened from it.
///
/// Each handle returned by [`MemoryStore::open_tab`] behaves like a separate
/// browser tab over the same storage: its writes queue change signals for the
/// watchers of every *other* tab, delivered on [`MemoryStore::flush_signals`].
#[derive(Clone)]
pub struct MemoryStore {
    backing: Rc<RefCell<Backing>>,
    tab: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let backing = Backing {
            next_tab: 1,
            ..Backing::default()
        };
        Self {
            backing: Rc::new(RefCell::new(backing)),
            tab: 0,
        }
    }

    /// Another tab sharing this storage.
    #[must_use]
    pub fn open_tab(&self) -> Self {
        let tab = {
            let mut backing = self.backing.borrow_mut();
            let tab = backing.next_tab;
            backing.next_tab += 1;
            tab
        };
        Self {
            backing: Rc::clone(&self.backing),
            tab,
        }
    }

    /// Make every subsequent write and removal fail, as a full or disabled storage
    /// would.
    pub fn fail_writes(&self, fail: bool) {
        self.backing.borrow_mut().fail_writes = fail;
    }

    /// Deliver queued change signals. Returns how many were delivered.
    pub fn flush_signals(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut backing = self.backing.borrow_mut();
                backing.pending.pop_front().and_then(|(watch_id, change)| {
                    backing
                        .watchers
                        .iter()
                        .find(|w| w.id == watch_id)
                        .map(|w| (Rc::clone(&w.on_change), change))
                })
            };
            match next {
                Some((on_change, change)) => {
                    on_change(&change);
                    delivered += 1;
                }
                None if self.backing.borrow().pending.is_empty() => return delivered,
                None => {}
            }
        }
    }

    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.backing.borrow().pending.len()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backing.borrow().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn queue_change(backing: &mut Backing, origin: u64, change: &StorageChange) {
        let targets: Vec<u64> = backing
            .watchers
            .iter()
            .filter(|w| w.tab != origin)
            .map(|w| w.id)
            .collect();
        for id in targets {
            backing.pending.push_back((id, change.clone()));
        }
    }
}

impl PersistedStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.backing.borrow().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut backing = self.backing.borrow_mut();
        if backing.fail_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        backing.entries.insert(key.to_string(), value.to_string());
        let change = StorageChange {
            key: Some(key.to_string()),
            new_value: Some(value.to_string()),
        };
        Self::queue_change(&mut backing, self.tab, &change);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut backing = self.backing.borrow_mut();
        if backing.fail_writes {
            return Err(StoreError::Unavailable(format!("cannot remove {key}")));
        }
        if backing.entries.remove(key).is_some() {
            let change = StorageChange {
                key: Some(key.to_string()),
                new_value: None,
            };
            Self::queue_change(&mut backing, self.tab, &change);
        }
        Ok(())
    }
}

impl StorageSignals for MemoryStore {
    fn watch(&self, on_change: Box<dyn Fn(&StorageChange)>) -> Subscription {
        let id = {
            let mut backing = self.backing.borrow_mut();
            let id = backing.next_watch;
            backing.next_watch += 1;
            backing.watchers.push(Watcher {
                id,
                tab: self.tab,
                on_change: Rc::from(on_change),
            });
            id
        };
        let weak = Rc::downgrade(&self.backing);
        Subscription::new(move || {
            if let Some(backing) = weak.upgrade() {
                let mut backing = backing.borrow_mut();
                backing.watchers.retain(|w| w.id != id);
                backing.pending.retain(|(watch_id, _)| *watch_id != id);
            }
        })
    }
}
