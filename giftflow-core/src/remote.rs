//! Remote document store seam.
//!
//! The remote holds one canonical configuration document per id. Operations are
//! callback based: completion may arrive later on the same thread (a browser fetch)
//! or immediately (the in-memory fake). No timeouts are applied; a request that
//! never completes is indistinguishable from one still pending.

use crate::error::RemoteError;
use crate::observer::Subscription;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub type FetchDone = Box<dyn FnOnce(Result<Option<Value>, RemoteError>)>;
pub type PushDone = Box<dyn FnOnce(Result<(), RemoteError>)>;
pub type SnapshotFn = Box<dyn FnMut(Result<Value, RemoteError>)>;

/// Trait for abstracting the remote configuration document store.
/// Platform-specific implementations should provide this.
pub trait RemoteConfigStore {
    /// Point read. `Ok(None)` means the document does not exist yet.
    fn fetch(&self, doc_id: &str, done: FetchDone);

    /// Replace the whole document.
    fn push(&self, doc_id: &str, document: Value, done: PushDone);

    /// Live feed of the document: the current snapshot first (when one exists),
    /// then every later revision in commit order. Intermediate revisions may be
    /// skipped. Dropping the returned handle closes the feed.
    fn subscribe(&self, doc_id: &str, on_snapshot: SnapshotFn) -> Subscription;
}

/// Remote used when no endpoint is configured: reads find nothing, writes are
/// accepted and dropped, and the feed stays silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRemote;

impl RemoteConfigStore for NoRemote {
    fn fetch(&self, _doc_id: &str, done: FetchDone) {
        done(Ok(None));
    }

    fn push(&self, _doc_id: &str, _document: Value, done: PushDone) {
        done(Ok(()));
    }

    fn subscribe(&self, _doc_id: &str, _on_snapshot: SnapshotFn) -> Subscription {
        Subscription::noop()
    }
}

type SharedSnapshotFn = Rc<RefCell<SnapshotFn>>;

struct Subscriber {
    id: u64,
    doc_id: String,
    on_snapshot: SharedSnapshotFn,
}

#[derive(Default)]
struct RemoteInner {
    documents: HashMap<String, Value>,
    subscribers: Vec<Subscriber>,
    next_id: u64,
    offline: bool,
    hold_pushes: bool,
    held: VecDeque<(String, Value, PushDone)>,
    pushes: Vec<(String, Value)>,
}

/// In-memory remote shared between clones, standing in for the hosted document
/// store in tests and the tester binary.
///
/// Pushes commit immediately and fan out to every subscriber of the document,
/// the writer's own feed included. [`MemoryRemote::hold_pushes`] parks pushes
/// until [`MemoryRemote::release_pushes`] to model a slow network.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Rc<RefCell<RemoteInner>>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, fetches and pushes fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    pub fn hold_pushes(&self) {
        self.inner.borrow_mut().hold_pushes = true;
    }

    /// Complete every parked push in order and stop parking.
    pub fn release_pushes(&self) {
        self.inner.borrow_mut().hold_pushes = false;
        loop {
            let next = self.inner.borrow_mut().held.pop_front();
            let Some((doc_id, document, done)) = next else {
                break;
            };
            done(self.commit(&doc_id, document));
        }
    }

    /// Commit a revision as another operator session would.
    pub fn publish(&self, doc_id: &str, document: Value) {
        self.inner
            .borrow_mut()
            .documents
            .insert(doc_id.to_string(), document.clone());
        self.broadcast(doc_id, &Ok(document));
    }

    /// Deliver a feed error to every subscriber of `doc_id`.
    pub fn fail_feed(&self, doc_id: &str, error: RemoteError) {
        self.broadcast(doc_id, &Err(error));
    }

    #[must_use]
    pub fn document(&self, doc_id: &str) -> Option<Value> {
        self.inner.borrow().documents.get(doc_id).cloned()
    }

    #[must_use]
    pub fn subscriber_count(&self, doc_id: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.doc_id == doc_id)
            .count()
    }

    /// Every push that reached the remote, in commit order.
    #[must_use]
    pub fn pushes(&self) -> Vec<(String, Value)> {
        self.inner.borrow().pushes.clone()
    }

    fn commit(&self, doc_id: &str, document: Value) -> Result<(), RemoteError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.offline {
                return Err(RemoteError::Transport("remote unreachable".to_string()));
            }
            inner.pushes.push((doc_id.to_string(), document.clone()));
            inner.documents.insert(doc_id.to_string(), document.clone());
        }
        self.broadcast(doc_id, &Ok(document));
        Ok(())
    }

    fn broadcast(&self, doc_id: &str, event: &Result<Value, RemoteError>) {
        let targets: Vec<SharedSnapshotFn> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.doc_id == doc_id)
            .map(|s| Rc::clone(&s.on_snapshot))
            .collect();
        for target in targets {
            if let Ok(mut on_snapshot) = target.try_borrow_mut() {
                (&mut *on_snapshot)(event.clone());
            } else {
                log::warn!("Skipping re-entrant snapshot delivery for {doc_id}");
            }
        }
    }
}

impl RemoteConfigStore for MemoryRemote {
    fn fetch(&self, doc_id: &str, done: FetchDone) {
        let result = {
            let inner = self.inner.borrow();
            if inner.offline {
                Err(RemoteError::Transport("remote unreachable".to_string()))
            } else {
                Ok(inner.documents.get(doc_id).cloned())
            }
        };
        done(result);
    }

    fn push(&self, doc_id: &str, document: Value, done: PushDone) {
        let held = {
            let mut inner = self.inner.borrow_mut();
            if inner.hold_pushes {
                inner.held.push_back((doc_id.to_string(), document, done));
                None
            } else {
                Some((document, done))
            }
        };
        if let Some((document, done)) = held {
            done(self.commit(doc_id, document));
        }
    }

    fn subscribe(&self, doc_id: &str, on_snapshot: SnapshotFn) -> Subscription {
        let shared: SharedSnapshotFn = Rc::new(RefCell::new(on_snapshot));
        let (id, initial) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                doc_id: doc_id.to_string(),
                on_snapshot: Rc::clone(&shared),
            });
            (id, inner.documents.get(doc_id).cloned())
        };
        if let Some(snapshot) = initial {
            let mut on_snapshot = shared.borrow_mut();
            (&mut *on_snapshot)(Ok(snapshot));
        }
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|s| s.id != id);
            }
        })
    }
}
