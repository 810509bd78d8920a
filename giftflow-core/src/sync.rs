//! Configuration synchronization.
//!
//! The engine owns the one in-memory [`ContentConfig`] and keeps it consistent
//! with three sources:
//!
//! * the local cache, read on startup and written on every change;
//! * the remote document, which is authoritative: each snapshot from the live
//!   feed replaces the in-memory value wholesale (last writer wins, no merge);
//! * other tabs, which announce cache writes through storage-change signals and
//!   are answered by re-reading the cache, with no network round-trip.
//!
//! Remote failures never reach the caller. They are logged, reported to the
//! activity sink, and the engine keeps serving whatever the cache holds.

use crate::activity::{ActivitySink, kinds};
use crate::config::ContentConfig;
use crate::error::RemoteError;
use crate::hydrate::{hydrate, hydrate_str};
use crate::keys::{CONFIG_KEY, REMOTE_DOC_ID};
use crate::observer::{Listeners, Subscription};
use crate::remote::RemoteConfigStore;
use crate::store::{PersistedStore, StorageChange, write_json};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct EngineInner<S, R> {
    store: S,
    remote: R,
    doc_id: String,
    current: RefCell<ContentConfig>,
    listeners: Listeners<ContentConfig>,
    feed: RefCell<Option<Subscription>>,
    feed_refs: Cell<usize>,
    activity: RefCell<Option<Rc<dyn ActivitySink>>>,
}

/// Shared handle to the synchronization engine. Clones refer to the same engine.
pub struct SyncEngine<S, R> {
    inner: Rc<EngineInner<S, R>>,
}

impl<S, R> Clone for SyncEngine<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, R> SyncEngine<S, R>
where
    S: PersistedStore + 'static,
    R: RemoteConfigStore + 'static,
{
    pub fn new(store: S, remote: R) -> Self {
        Self::with_doc_id(store, remote, REMOTE_DOC_ID)
    }

    pub fn with_doc_id(store: S, remote: R, doc_id: impl Into<String>) -> Self {
        let initial = read_cache(&store);
        Self {
            inner: Rc::new(EngineInner {
                store,
                remote,
                doc_id: doc_id.into(),
                current: RefCell::new(initial),
                listeners: Listeners::default(),
                feed: RefCell::new(None),
                feed_refs: Cell::new(0),
                activity: RefCell::new(None),
            }),
        }
    }

    /// Report remote outcomes to `sink` in addition to the `log` facade.
    #[must_use]
    pub fn with_activity(self, sink: Rc<dyn ActivitySink>) -> Self {
        *self.inner.activity.borrow_mut() = Some(sink);
        self
    }

    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.inner.doc_id
    }

    /// Read the local cache, hydrated. Falls back to defaults when the cache is
    /// missing, unreadable or corrupt.
    #[must_use]
    pub fn load(&self) -> ContentConfig {
        read_cache(&self.inner.store)
    }

    /// The authoritative in-memory config.
    #[must_use]
    pub fn current(&self) -> ContentConfig {
        self.inner.current.borrow().clone()
    }

    /// Publish `cfg`: write the local cache now, then push to the remote without
    /// waiting. A failed push leaves the local write in place.
    pub fn save(&self, cfg: &ContentConfig) {
        let document = match serde_json::to_value(cfg) {
            Ok(document) => document,
            Err(err) => {
                log::error!("Config could not be serialized, not saved: {err}");
                return;
            }
        };
        if let Err(err) = self.inner.store.set(CONFIG_KEY, &document.to_string()) {
            log::warn!("Config cache write failed, remote push continues: {err}");
        }
        self.replace(cfg.clone());
        self.record(kinds::CONFIG_PUBLISHED, None);

        let weak = Rc::downgrade(&self.inner);
        let doc_id = self.inner.doc_id.clone();
        self.inner.remote.push(
            &self.inner.doc_id,
            document,
            Box::new(move |result: Result<(), RemoteError>| {
                if let Err(err) = result {
                    log::warn!("Remote push of {doc_id} failed, keeping local copy: {err}");
                    if let Some(inner) = weak.upgrade() {
                        Self { inner }.record(
                            kinds::REMOTE_PUSH_FAILED,
                            Some(json!({ "error": err.to_string() })),
                        );
                    }
                }
            }),
        );
    }

    /// Listen for config changes and keep the remote feed open while the returned
    /// handle lives.
    ///
    /// The engine holds at most one feed no matter how many callers subscribe;
    /// the feed closes when the last handle is dropped.
    pub fn subscribe_remote(&self, on_change: impl Fn(&ContentConfig) + 'static) -> Subscription {
        let listener = self.inner.listeners.add(on_change);
        self.retain_feed();
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            drop(listener);
            if let Some(inner) = weak.upgrade() {
                Self { inner }.release_feed();
            }
        })
    }

    /// Listen for config changes without holding the remote feed open.
    pub fn watch(&self, on_change: impl Fn(&ContentConfig) + 'static) -> Subscription {
        self.inner.listeners.add(on_change)
    }

    /// React to a storage-change signal from another tab. Safe to call repeatedly.
    pub fn handle_storage_change(&self, change: &StorageChange) {
        if change.touches(CONFIG_KEY) {
            self.refresh_from_cache();
        }
    }

    /// Re-read the cache into memory, notifying listeners only on a real change.
    pub fn refresh_from_cache(&self) -> ContentConfig {
        let cached = self.load();
        if *self.inner.current.borrow() != cached {
            log::debug!("Config changed in another tab, refreshing");
            self.replace(cached.clone());
        }
        cached
    }

    /// One-shot read of the remote document, applied like a feed snapshot.
    pub fn pull(&self) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.remote.fetch(
            &self.inner.doc_id,
            Box::new(move |result: Result<Option<Value>, RemoteError>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let engine = Self { inner };
                match result {
                    Ok(Some(document)) => engine.apply_snapshot(&document),
                    Ok(None) => log::debug!("Remote {} has no document yet", engine.doc_id()),
                    Err(err) => engine.feed_failed(&err),
                }
            }),
        );
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.feed.borrow().is_some()
    }

    /// Close the remote feed regardless of outstanding subscribe handles.
    pub fn disconnect(&self) {
        self.inner.feed_refs.set(0);
        let feed = self.inner.feed.borrow_mut().take();
        drop(feed);
    }

    fn retain_feed(&self) {
        let refs = self.inner.feed_refs.get();
        self.inner.feed_refs.set(refs + 1);
        if refs == 0 || !self.is_connected() {
            self.open_feed();
        }
    }

    fn release_feed(&self) {
        let refs = self.inner.feed_refs.get().saturating_sub(1);
        self.inner.feed_refs.set(refs);
        if refs == 0 {
            let feed = self.inner.feed.borrow_mut().take();
            drop(feed);
        }
    }

    fn open_feed(&self) {
        let weak = Rc::downgrade(&self.inner);
        let feed = self.inner.remote.subscribe(
            &self.inner.doc_id,
            Box::new(move |event: Result<Value, RemoteError>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let engine = Self { inner };
                match event {
                    Ok(document) => engine.apply_snapshot(&document),
                    Err(err) => engine.feed_failed(&err),
                }
            }),
        );
        let previous = self.inner.feed.borrow_mut().replace(feed);
        drop(previous);
    }

    fn apply_snapshot(&self, document: &Value) {
        let cfg: ContentConfig = hydrate(document);
        if let Err(err) = write_json(&self.inner.store, CONFIG_KEY, &cfg) {
            log::warn!("Remote config applied in memory only, cache write failed: {err}");
        }
        self.replace(cfg);
        self.record(kinds::CONFIG_REMOTE_APPLIED, None);
    }

    fn feed_failed(&self, err: &RemoteError) {
        log::warn!("Remote config feed for {} failed: {err}", self.inner.doc_id);
        self.record(
            kinds::REMOTE_FEED_ERROR,
            Some(json!({ "error": err.to_string() })),
        );
    }

    fn replace(&self, cfg: ContentConfig) {
        *self.inner.current.borrow_mut() = cfg.clone();
        self.inner.listeners.emit(&cfg);
    }

    fn record(&self, kind: &str, payload: Option<Value>) {
        let sink = self.inner.activity.borrow().clone();
        if let Some(sink) = sink {
            sink.record(kind, payload);
        }
    }
}

fn read_cache<S: PersistedStore>(store: &S) -> ContentConfig {
    match store.get(CONFIG_KEY) {
        Ok(Some(raw)) => hydrate_str(&raw),
        Ok(None) => ContentConfig::default(),
        Err(err) => {
            log::warn!("Config cache unreadable, using defaults: {err}");
            ContentConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use crate::store::MemoryStore;

    fn engine() -> (MemoryStore, MemoryRemote, SyncEngine<MemoryStore, MemoryRemote>) {
        let store = MemoryStore::new();
        let remote = MemoryRemote::new();
        let sync = SyncEngine::new(store.clone(), remote.clone());
        (store, remote, sync)
    }

    fn renamed(to: &str) -> ContentConfig {
        let mut cfg = ContentConfig::default();
        cfg.couple.to = to.to_string();
        cfg
    }

    #[test]
    fn load_without_cache_is_default() {
        let (_, _, sync) = engine();
        assert_eq!(sync.load(), ContentConfig::default());
        assert_eq!(sync.current(), ContentConfig::default());
    }

    #[test]
    fn load_never_fails_on_garbage() {
        let (store, _, sync) = engine();
        for blob in ["", "null", "[]", "{\"places\": 7}", "\u{0}\u{1}"] {
            store.set(CONFIG_KEY, blob).unwrap();
            assert_eq!(sync.load(), ContentConfig::default(), "blob {blob:?}");
        }
    }

    #[test]
    fn save_is_visible_locally_before_remote_completes() {
        let (_, remote, sync) = engine();
        remote.hold_pushes();
        let cfg = renamed("Robin");
        sync.save(&cfg);
        assert_eq!(sync.load(), cfg);
        assert_eq!(sync.current(), cfg);
        assert!(remote.document(REMOTE_DOC_ID).is_none());

        remote.release_pushes();
        let pushed: ContentConfig = hydrate(&remote.document(REMOTE_DOC_ID).unwrap());
        assert_eq!(pushed, cfg);
    }

    #[test]
    fn failed_push_keeps_local_copy() {
        let (_, remote, sync) = engine();
        remote.set_offline(true);
        let cfg = renamed("Kai");
        sync.save(&cfg);
        assert_eq!(sync.load(), cfg);
        assert!(remote.pushes().is_empty());
    }

    #[test]
    fn snapshots_replace_rather_than_merge() {
        let (_, remote, sync) = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            sync.subscribe_remote(move |cfg| seen.borrow_mut().push(cfg.couple.clone()))
        };

        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "from": "A1", "to": "A2" }, "adminPasscode": "aaaa" }));
        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "to": "B2" } }));

        let current = sync.current();
        assert_eq!(current.couple.from, "Alex");
        assert_eq!(current.couple.to, "B2");
        assert_eq!(current.admin_passcode, "1234");
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(sync.load(), current);
    }

    #[test]
    fn initial_snapshot_overrides_local_edit() {
        let (store, remote, _) = engine();
        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "to": "Remote" } }));
        let sync = SyncEngine::new(store, remote);
        sync.save(&renamed("Local"));
        let _sub = sync.subscribe_remote(|_| {});
        assert_eq!(sync.current().couple.to, "Local");

        let (store, remote, sync) = engine();
        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "to": "Remote" } }));
        store.set(CONFIG_KEY, &serde_json::to_string(&renamed("Stale")).unwrap()).unwrap();
        let _sub = sync.subscribe_remote(|_| {});
        assert_eq!(sync.current().couple.to, "Remote");
    }

    #[test]
    fn one_feed_for_many_subscribers() {
        let (_, remote, sync) = engine();
        let first = sync.subscribe_remote(|_| {});
        let second = sync.subscribe_remote(|_| {});
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 1);
        drop(first);
        assert!(sync.is_connected());
        drop(second);
        assert!(!sync.is_connected());
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 0);
    }

    #[test]
    fn disconnect_closes_the_feed() {
        let (_, remote, sync) = engine();
        let _sub = sync.subscribe_remote(|_| {});
        sync.disconnect();
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 0);
        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "to": "Ignored" } }));
        assert_eq!(sync.current().couple.to, "Sam");
    }

    #[test]
    fn feed_errors_keep_current_config() {
        let (_, remote, sync) = engine();
        sync.save(&renamed("Kept"));
        let _sub = sync.subscribe_remote(|_| {});
        remote.fail_feed(REMOTE_DOC_ID, RemoteError::Closed);
        assert_eq!(sync.current().couple.to, "Kept");
    }

    #[test]
    fn cache_refresh_is_idempotent() {
        let (store, remote, sync) = engine();
        let other_tab = SyncEngine::new(store.open_tab(), remote);
        let hits = Rc::new(Cell::new(0));
        let _watch = {
            let hits = Rc::clone(&hits);
            sync.watch(move |_| hits.set(hits.get() + 1))
        };

        other_tab.save(&renamed("Other"));
        let change = StorageChange {
            key: Some(CONFIG_KEY.to_string()),
            new_value: None,
        };
        sync.handle_storage_change(&change);
        sync.handle_storage_change(&change);
        assert_eq!(sync.current().couple.to, "Other");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn pull_applies_remote_document() {
        let (_, remote, sync) = engine();
        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "from": "Pulled" } }));
        sync.pull();
        assert_eq!(sync.current().couple.from, "Pulled");
    }

    #[test]
    fn doc_id_is_shared_by_every_path() {
        let (_, remote, sync) = engine();
        let _sub = sync.subscribe_remote(|_| {});
        sync.save(&renamed("Same"));
        assert_eq!(remote.pushes()[0].0, sync.doc_id());
        assert_eq!(remote.subscriber_count(sync.doc_id()), 1);
    }
}
