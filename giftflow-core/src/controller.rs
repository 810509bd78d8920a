//! Session-level coordinator.
//!
//! A [`FlowController`] is the single writer of visitor progress for one tab. It
//! owns the persisted [`AppState`], the [`SyncEngine`] for content, and the
//! activity log, and answers the route gate before any page renders.

use crate::activity::{ActivityLog, ActivitySink, kinds};
use crate::clock::Clock;
use crate::config::ContentConfig;
use crate::gate::{self, ENTRY_ROUTE};
use crate::keys::{CONFIG_KEY, REMOTE_DOC_ID, STATE_KEY};
use crate::observer::{Listeners, Subscription};
use crate::remote::RemoteConfigStore;
use crate::state::{AppState, Itinerary, StateStore};
use crate::step::Step;
use crate::store::{PersistedStore, StorageChange, StorageSignals};
use crate::sync::SyncEngine;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

/// What the shell should do with the route it is about to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render,
    /// Replace the current history entry with this route; do not render first.
    Replace(&'static str),
}

struct ControllerInner<S, R, C> {
    states: StateStore<S>,
    sync: SyncEngine<S, R>,
    activity: Rc<ActivityLog<S, C>>,
    clock: C,
    state: RefCell<AppState>,
    state_listeners: Listeners<AppState>,
    feed: RefCell<Option<Subscription>>,
    signals: RefCell<Option<Subscription>>,
}

impl<S, R, C> ControllerInner<S, R, C> {
    fn release(&self) {
        let feed = self.feed.borrow_mut().take();
        let signals = self.signals.borrow_mut().take();
        drop(feed);
        drop(signals);
    }
}

impl<S, R, C> Drop for ControllerInner<S, R, C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Shared handle to one tab's flow session.
pub struct FlowController<S, R, C> {
    inner: Rc<ControllerInner<S, R, C>>,
}

impl<S, R, C> Clone for FlowController<S, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, R, C> PartialEq for FlowController<S, R, C> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S, R, C> FlowController<S, R, C>
where
    S: PersistedStore + Clone + 'static,
    R: RemoteConfigStore + 'static,
    C: Clock + Clone + 'static,
{
    pub fn new(store: S, remote: R, clock: C) -> Self {
        Self::with_doc_id(store, remote, clock, REMOTE_DOC_ID)
    }

    pub fn with_doc_id(store: S, remote: R, clock: C, doc_id: &str) -> Self {
        let activity = Rc::new(ActivityLog::new(store.clone(), clock.clone()));
        let sink: Rc<dyn ActivitySink> = activity.clone();
        let sync = SyncEngine::with_doc_id(store.clone(), remote, doc_id).with_activity(sink);
        let states = StateStore::new(store);
        let state = states.load();
        Self {
            inner: Rc::new(ControllerInner {
                states,
                sync,
                activity,
                clock,
                state: RefCell::new(state),
                state_listeners: Listeners::default(),
                feed: RefCell::new(None),
                signals: RefCell::new(None),
            }),
        }
    }

    /// Start the session: open the remote feed, listen to other tabs, and gate
    /// the entry route.
    ///
    /// `on_config_changed` fires on every authoritative config change, whether it
    /// came from the remote feed or from another tab.
    pub fn open<G: StorageSignals>(
        &self,
        entry_route: &str,
        signals: &G,
        on_config_changed: impl Fn(&ContentConfig) + 'static,
    ) -> Navigation {
        let feed = self.inner.sync.subscribe_remote(on_config_changed);
        let previous = self.inner.feed.borrow_mut().replace(feed);
        drop(previous);

        let weak = Rc::downgrade(&self.inner);
        let watch = signals.watch(Box::new(move |change: &StorageChange| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.handle_storage_change(change);
            }
        }));
        let previous = self.inner.signals.borrow_mut().replace(watch);
        drop(previous);

        self.inner.activity.record(
            kinds::SESSION_OPENED,
            Some(json!({
                "route": gate::normalize(entry_route),
                "step": self.inner.state.borrow().step,
            })),
        );
        self.on_route_change(entry_route)
    }

    /// Gate `route` against the current step.
    pub fn on_route_change(&self, route: &str) -> Navigation {
        let step = self.inner.state.borrow().step;
        match gate::evaluate(route, step) {
            Some(target) if target != gate::normalize(route) => {
                log::info!("Route {route} is ahead of step {step}, redirecting to {target}");
                self.inner.activity.record(
                    kinds::ROUTE_REDIRECTED,
                    Some(json!({ "from": gate::normalize(route), "to": target, "step": step })),
                );
                Navigation::Replace(target)
            }
            _ => Navigation::Render,
        }
    }

    #[must_use]
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.inner.state.borrow().step
    }

    #[must_use]
    pub fn config(&self) -> ContentConfig {
        self.inner.sync.current()
    }

    /// Replace the state, persist it and notify. A lower step in `next` is held at
    /// the current step.
    pub fn set_state(&self, next: AppState) {
        let merged = self.inner.state.borrow().merge_forward(next);
        self.commit(merged);
    }

    /// Read-modify-write of the whole state.
    pub fn update_state(&self, apply: impl FnOnce(&mut AppState)) {
        let mut next = self.state();
        apply(&mut next);
        self.set_state(next);
    }

    /// Returns whether the step moved.
    pub fn advance(&self, step: Step) -> bool {
        let mut moved = false;
        self.update_state(|state| moved = state.advance_to(step));
        moved
    }

    pub fn unlock(&self) {
        self.update_state(AppState::unlock);
    }

    pub fn record_game_attempt(&self) {
        let now = self.inner.clock.now_ms();
        self.update_state(|state| state.record_game_attempt(now));
    }

    pub fn choose_place(&self, place_id: &str) {
        self.update_state(|state| state.chosen_place_id = Some(place_id.to_string()));
        self.inner
            .activity
            .record(kinds::PLACE_CHOSEN, Some(json!({ "placeId": place_id })));
    }

    pub fn set_itinerary(&self, itinerary: Itinerary) {
        let payload = serde_json::to_value(&itinerary).ok();
        self.update_state(|state| state.itinerary = itinerary);
        self.inner.activity.record(kinds::PLACE_CHOSEN, payload);
    }

    pub fn choose_outfit(&self, outfit_id: &str) {
        self.update_state(|state| state.chosen_outfit_id = Some(outfit_id.to_string()));
        self.inner
            .activity
            .record(kinds::OUTFIT_CHOSEN, Some(json!({ "outfitId": outfit_id })));
    }

    pub fn set_music(&self, enabled: bool, volume: f32) {
        self.update_state(|state| {
            state.music.enabled = enabled;
            state.music.set_volume(volume);
        });
    }

    /// Forget all progress and send the visitor back to the entry route. Content
    /// config is left alone.
    pub fn reset_progress(&self) -> Navigation {
        if let Err(err) = self.inner.states.clear() {
            log::warn!("Persisted state not cleared: {err}");
        }
        let fresh = AppState::default();
        *self.inner.state.borrow_mut() = fresh.clone();
        self.inner.activity.record(kinds::PROGRESS_RESET, None);
        self.inner.state_listeners.emit(&fresh);
        Navigation::Replace(ENTRY_ROUTE)
    }

    /// Operator publish. Local first, remote in the background.
    pub fn publish_config(&self, cfg: &ContentConfig) {
        self.inner.sync.save(cfg);
    }

    /// React to a storage signal from another tab.
    pub fn handle_storage_change(&self, change: &StorageChange) {
        if change.touches(STATE_KEY) {
            let fresh = self.inner.states.load();
            let changed = *self.inner.state.borrow() != fresh;
            if changed {
                log::debug!("Progress changed in another tab, now at step {}", fresh.step);
                *self.inner.state.borrow_mut() = fresh.clone();
                self.inner.state_listeners.emit(&fresh);
            }
        }
        if change.touches(CONFIG_KEY) {
            self.inner.sync.handle_storage_change(change);
        }
    }

    pub fn watch_state(&self, on_change: impl Fn(&AppState) + 'static) -> Subscription {
        self.inner.state_listeners.add(on_change)
    }

    pub fn watch_config(&self, on_change: impl Fn(&ContentConfig) + 'static) -> Subscription {
        self.inner.sync.watch(on_change)
    }

    /// Append a diagnostic entry.
    pub fn record(&self, kind: &str, payload: Option<Value>) {
        self.inner.activity.record(kind, payload);
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLog<S, C> {
        &self.inner.activity
    }

    #[must_use]
    pub fn sync(&self) -> &SyncEngine<S, R> {
        &self.inner.sync
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.feed.borrow().is_some()
    }

    /// Close the remote feed and stop listening to other tabs. Dropping the last
    /// handle to the controller does the same.
    pub fn shutdown(&self) {
        self.inner.release();
    }

    fn commit(&self, next: AppState) {
        if let Err(err) = self.inner.states.save(&next) {
            log::warn!("Progress kept in memory only: {err}");
        }
        *self.inner.state.borrow_mut() = next.clone();
        self.inner
            .activity
            .record(kinds::STATE_SAVED, Some(json!({ "step": next.step })));
        self.inner.state_listeners.emit(&next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gate::route_for;
    use crate::remote::MemoryRemote;
    use crate::store::MemoryStore;
    use std::cell::Cell;

    type Controller = FlowController<MemoryStore, MemoryRemote, ManualClock>;

    fn controller() -> (MemoryStore, MemoryRemote, Controller) {
        let store = MemoryStore::new();
        let remote = MemoryRemote::new();
        let flow = FlowController::new(store.clone(), remote.clone(), ManualClock::starting_at(1_000));
        (store, remote, flow)
    }

    #[test]
    fn fresh_session_renders_entry_and_redirects_ahead() {
        let (store, _, flow) = controller();
        assert_eq!(flow.open("/", &store, |_| {}), Navigation::Render);
        assert_eq!(flow.on_route_change("/summary"), Navigation::Replace("/"));
        assert_eq!(flow.on_route_change("/admin"), Navigation::Render);
        assert_eq!(flow.on_route_change("/nowhere"), Navigation::Render);
    }

    #[test]
    fn gating_redirects_to_current_step_route() {
        let (store, _, flow) = controller();
        flow.advance(Step::Puzzle);
        assert_eq!(flow.open("/places", &store, |_| {}), Navigation::Replace("/puzzle"));
        assert_eq!(flow.on_route_change("/puzzle"), Navigation::Render);
        assert_eq!(flow.on_route_change("/"), Navigation::Render);

        let kinds: Vec<String> = flow.activity().read_all().into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&"route_redirected".to_string()));
    }

    #[test]
    fn every_reached_step_renders() {
        let (_, _, flow) = controller();
        for step in Step::ALL {
            flow.advance(step);
            for reached in Step::ALL.into_iter().filter(|s| *s <= step) {
                assert_eq!(flow.on_route_change(route_for(reached)), Navigation::Render);
            }
        }
    }

    #[test]
    fn set_state_never_moves_backward() {
        let (_, _, flow) = controller();
        flow.advance(Step::Outfits);
        flow.set_state(AppState::default());
        assert_eq!(flow.step(), Step::Outfits);
        assert!(!flow.advance(Step::Places));
    }

    #[test]
    fn state_survives_a_new_session() {
        let (store, remote, flow) = controller();
        flow.unlock();
        flow.choose_place("ramen-bar");
        flow.record_game_attempt();

        let reopened = FlowController::new(store, remote, ManualClock::starting_at(0));
        let state = reopened.state();
        assert_eq!(state.step, Step::Message);
        assert!(state.unlocked);
        assert_eq!(state.chosen_place_id.as_deref(), Some("ramen-bar"));
        assert_eq!(state.stats.last_played_at, Some(1_000));
    }

    #[test]
    fn reset_clears_progress_but_keeps_config() {
        let (store, _, flow) = controller();
        let _ = flow.open("/", &store, |_| {});
        let mut cfg = ContentConfig::default();
        cfg.couple.to = "Avery".to_string();
        flow.publish_config(&cfg);

        flow.advance(Step::Outfits);
        flow.choose_place("trattoria");
        flow.choose_outfit("bold");
        assert_eq!(flow.reset_progress(), Navigation::Replace("/"));

        assert_eq!(flow.state(), AppState::default());
        assert_eq!(store.get(STATE_KEY).unwrap(), None);
        assert_eq!(flow.config(), cfg);
        assert_eq!(flow.sync().load(), cfg);
    }

    #[test]
    fn reset_lands_on_defaults_even_when_storage_refuses() {
        let (store, _, flow) = controller();
        flow.advance(Step::Outfits);
        flow.choose_outfit("bold");
        store.fail_writes(true);

        assert_eq!(flow.reset_progress(), Navigation::Replace("/"));
        assert_eq!(flow.state(), AppState::default());
        assert_eq!(flow.on_route_change("/outfits"), Navigation::Replace("/"));
        assert!(store.get(STATE_KEY).unwrap().is_some());
    }

    #[test]
    fn state_listeners_see_every_commit() {
        let (_, _, flow) = controller();
        let steps = Rc::new(RefCell::new(Vec::new()));
        let _watch = {
            let steps = Rc::clone(&steps);
            flow.watch_state(move |s| steps.borrow_mut().push(s.step))
        };
        flow.advance(Step::Puzzle);
        flow.unlock();
        let _ = flow.reset_progress();
        assert_eq!(*steps.borrow(), vec![Step::Puzzle, Step::Message, Step::Landing]);
    }

    #[test]
    fn other_tab_progress_is_picked_up() {
        let (store, remote, flow) = controller();
        let other = FlowController::new(store.open_tab(), remote, ManualClock::starting_at(0));
        let _ = flow.open("/", &store, |_| {});

        other.advance(Step::Places);
        assert_eq!(flow.step(), Step::Landing);
        store.flush_signals();
        assert_eq!(flow.step(), Step::Places);
    }

    #[test]
    fn config_listener_fires_for_remote_and_other_tabs() {
        let (store, remote, flow) = controller();
        let hits = Rc::new(Cell::new(0));
        let _ = {
            let hits = Rc::clone(&hits);
            flow.open("/", &store, move |_| hits.set(hits.get() + 1))
        };

        remote.publish(REMOTE_DOC_ID, json!({ "couple": { "from": "Remote" } }));
        assert_eq!(flow.config().couple.from, "Remote");
        assert_eq!(hits.get(), 1);

        let other_tab = SyncEngine::new(store.open_tab(), crate::remote::NoRemote);
        let mut cfg = ContentConfig::default();
        cfg.couple.from = "Tab".to_string();
        other_tab.save(&cfg);
        store.flush_signals();
        assert_eq!(flow.config().couple.from, "Tab");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn shutdown_releases_feed_and_signals() {
        let (store, remote, flow) = controller();
        let _ = flow.open("/", &store, |_| {});
        assert!(flow.is_open());
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 1);
        flow.shutdown();
        assert!(!flow.is_open());
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 0);

        store.open_tab().set(STATE_KEY, r#"{"step":5}"#).unwrap();
        assert_eq!(store.flush_signals(), 0);
        assert_eq!(flow.step(), Step::Landing);
    }

    #[test]
    fn dropping_the_last_handle_closes_the_feed() {
        let (store, remote, flow) = controller();
        let _ = flow.open("/", &store, |_| {});
        let second = flow.clone();
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 1);

        drop(flow);
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 1);
        drop(second);
        assert_eq!(remote.subscriber_count(REMOTE_DOC_ID), 0);

        store.open_tab().set(STATE_KEY, r#"{"step":5}"#).unwrap();
        assert_eq!(store.flush_signals(), 0);
    }

    #[test]
    fn offline_publish_still_applies_locally() {
        let (store, remote, flow) = controller();
        remote.set_offline(true);
        let _ = flow.open("/", &store, |_| {});
        let mut cfg = ContentConfig::default();
        cfg.admin_passcode = "9999".to_string();
        flow.publish_config(&cfg);
        assert!(flow.config().verify_passcode("9999"));

        let kinds: Vec<String> = flow.activity().read_all().into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&"remote_push_failed".to_string()));
    }
}
