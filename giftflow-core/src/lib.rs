//! Giftflow core
//!
//! Platform-agnostic logic for the guided gift flow: the step gate that keeps
//! visitors from skipping ahead, and the synchronization engine that keeps
//! operator-editable content consistent between the local cache, the remote
//! document and other open tabs. Nothing in here depends on a browser; the web
//! crate supplies the storage, remote and clock implementations.

pub mod activity;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod gate;
pub mod hydrate;
pub mod keys;
pub mod observer;
pub mod remote;
pub mod state;
pub mod step;
pub mod store;
pub mod sync;

pub use activity::{ActivityLog, ActivitySink, LOG_CAPACITY, StoredLogEntry};
pub use clock::{Clock, ManualClock};
pub use config::{ContentConfig, CoupleNames, MusicTrack, Outfit, Place, StepCopy, StepCopyTable};
pub use controller::{FlowController, Navigation};
pub use error::{RemoteError, StoreError};
pub use gate::{ADMIN_ROUTE, ENTRY_ROUTE, NOT_FOUND_ROUTE, evaluate, normalize, route_for, step_for};
pub use hydrate::{fill_missing, hydrate, hydrate_str, try_hydrate};
pub use observer::{Listeners, Subscription};
pub use remote::{MemoryRemote, NoRemote, RemoteConfigStore};
pub use state::{AppState, Itinerary, MusicPrefs, PlayStats, StateStore};
pub use step::Step;
pub use store::{MemoryStore, PersistedStore, StorageChange, StorageSignals};
pub use sync::SyncEngine;
