//! Bounded diagnostic trail kept in the local store.
//!
//! Entries are never read back into state or config and are not mirrored
//! remotely; treat the log as best-effort.

use crate::clock::Clock;
use crate::hydrate::lenient_seq;
use crate::keys::LOG_KEY;
use crate::store::{PersistedStore, write_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Most recent entries retained; older entries are evicted first.
pub const LOG_CAPACITY: usize = 400;

/// Standard entry types.
pub mod kinds {
    pub const SESSION_OPENED: &str = "session_opened";
    pub const ROUTE_REDIRECTED: &str = "route_redirected";
    pub const STATE_SAVED: &str = "state_saved";
    pub const PROGRESS_RESET: &str = "progress_reset";
    pub const CONFIG_PUBLISHED: &str = "config_published";
    pub const CONFIG_REMOTE_APPLIED: &str = "config_remote_applied";
    pub const REMOTE_PUSH_FAILED: &str = "remote_push_failed";
    pub const REMOTE_FEED_ERROR: &str = "remote_feed_error";
    pub const PLACE_CHOSEN: &str = "place_chosen";
    pub const OUTFIT_CHOSEN: &str = "outfit_chosen";
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredLogEntry {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Anything that accepts activity entries. Lets the sync engine report without
/// knowing the log's store or clock.
pub trait ActivitySink {
    fn record(&self, kind: &str, payload: Option<Value>);
}

#[derive(Deserialize)]
#[serde(transparent)]
struct StoredEntries(#[serde(deserialize_with = "lenient_seq")] Vec<StoredLogEntry>);

pub struct ActivityLog<S, C> {
    store: S,
    clock: C,
}

impl<S: PersistedStore, C: Clock> ActivityLog<S, C> {
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Append an entry and evict beyond [`LOG_CAPACITY`]. Storage failures are
    /// logged and otherwise ignored.
    pub fn record(&self, kind: &str, payload: Option<Value>) {
        let mut entries = self.read_all();
        entries.push(StoredLogEntry {
            timestamp: self.clock.now_ms(),
            kind: kind.to_string(),
            payload,
        });
        if entries.len() > LOG_CAPACITY {
            let excess = entries.len() - LOG_CAPACITY;
            entries.drain(..excess);
        }
        if let Err(err) = write_json(&self.store, LOG_KEY, &entries) {
            log::warn!("Activity entry {kind} not persisted: {err}");
        }
    }

    /// Entries oldest to newest; empty when the log is missing or corrupt.
    #[must_use]
    pub fn read_all(&self) -> Vec<StoredLogEntry> {
        let raw = match self.store.get(LOG_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log::warn!("Activity log unreadable: {err}");
                return Vec::new();
            }
        };
        serde_json::from_str::<StoredEntries>(&raw)
            .map(|StoredEntries(entries)| entries)
            .unwrap_or_else(|err| {
                log::warn!("Activity log corrupt, ignoring: {err}");
                Vec::new()
            })
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(LOG_KEY) {
            log::warn!("Activity log not cleared: {err}");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_all().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: PersistedStore, C: Clock> ActivitySink for ActivityLog<S, C> {
    fn record(&self, kind: &str, payload: Option<Value>) {
        Self::record(self, kind, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn fixture() -> (MemoryStore, ManualClock, ActivityLog<MemoryStore, ManualClock>) {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let log = ActivityLog::new(store.clone(), clock.clone());
        (store, clock, log)
    }

    #[test]
    fn records_in_order_with_timestamps() {
        let (_, clock, log) = fixture();
        log.record(kinds::SESSION_OPENED, Some(json!({ "route": "/" })));
        clock.advance(5);
        log.record(kinds::STATE_SAVED, None);

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "session_opened");
        assert_eq!(entries[0].payload, Some(json!({ "route": "/" })));
        assert_eq!(entries[1].timestamp - entries[0].timestamp, 5);
        assert_eq!(entries[1].payload, None);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let (_, _, log) = fixture();
        for i in 0..450 {
            log.record("tick", Some(json!(i)));
        }
        let entries = log.read_all();
        assert_eq!(entries.len(), LOG_CAPACITY);
        assert_eq!(entries.first().and_then(|e| e.payload.clone()), Some(json!(50)));
        assert_eq!(entries.last().and_then(|e| e.payload.clone()), Some(json!(449)));
    }

    #[test]
    fn corrupt_log_reads_empty_and_recovers() {
        let (store, _, log) = fixture();
        store.set(LOG_KEY, "not json").unwrap();
        assert!(log.read_all().is_empty());
        log.record("after", None);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn malformed_entries_are_repaired_in_place() {
        let (store, _, log) = fixture();
        store
            .set(LOG_KEY, r#"[{"timestamp":1,"type":"ok"},{"timestamp":"x","type":"bad"}]"#)
            .unwrap();
        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "ok");
        assert_eq!(entries[1].kind, "bad");
        assert_eq!(entries[1].timestamp, 0);
    }

    #[test]
    fn clear_empties_the_log() {
        let (_, _, log) = fixture();
        log.record("a", None);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn write_failures_are_swallowed() {
        let (store, _, log) = fixture();
        store.fail_writes(true);
        log.record("lost", None);
        assert!(log.is_empty());
    }
}
