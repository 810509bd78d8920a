//! `localStorage` bindings for the core persistence traits.

use giftflow_core::{PersistedStore, StorageChange, StorageSignals, StoreError, Subscription};
use gloo::events::EventListener;
use gloo::storage::{LocalStorage, Storage};
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;

/// Browser-scoped key/value cache backed by `window.localStorage`.
///
/// Values are stored as the raw text handed in; callers already serialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowserStore;

fn unavailable(err: &wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(
        err.as_string()
            .unwrap_or_else(|| "localStorage unavailable".to_string()),
    )
}

// `LocalStorage::raw` throws when storage is blocked, so check access first.
fn storage() -> Result<web_sys::Storage, StoreError> {
    match gloo::utils::window().local_storage() {
        Ok(Some(_)) => Ok(LocalStorage::raw()),
        Ok(None) => Err(StoreError::Unavailable("localStorage unavailable".to_string())),
        Err(err) => Err(unavailable(&err)),
    }
}

impl PersistedStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        storage()?.get_item(key).map_err(|err| unavailable(&err))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        storage()?
            .set_item(key, value)
            .map_err(|err| StoreError::WriteRejected {
                key: key.to_string(),
                reason: err
                    .as_string()
                    .unwrap_or_else(|| "quota exceeded".to_string()),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        storage()?;
        LocalStorage::delete(key);
        Ok(())
    }
}

/// Cross-tab change notifications from the window `storage` event.
///
/// Browsers only fire the event in tabs other than the writer, which is exactly
/// the set of sessions that need to re-read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowserSignals;

impl StorageSignals for BrowserSignals {
    fn watch(&self, on_change: Box<dyn Fn(&StorageChange)>) -> Subscription {
        let listener = EventListener::new(&gloo::utils::window(), "storage", move |event| {
            if let Some(event) = event.dyn_ref::<StorageEvent>() {
                on_change(&StorageChange {
                    key: event.key(),
                    new_value: event.new_value(),
                });
            }
        });
        Subscription::new(move || drop(listener))
    }
}
