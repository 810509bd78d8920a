//! Visitor progress.
use crate::error::StoreError;
use crate::hydrate::{hydrate_str, or_default};
use crate::keys::STATE_KEY;
use crate::step::Step;
use crate::store::{PersistedStore, write_json};
use serde::{Deserialize, Serialize};

/// Multi-category venue selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Itinerary {
    #[serde(deserialize_with = "or_default")]
    pub dinner: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub snack: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub dessert: Option<String>,
}

impl Itinerary {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dinner.is_none() && self.snack.is_none() && self.dessert.is_none()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.dinner.is_some() && self.snack.is_some() && self.dessert.is_some()
    }

    /// Place ids in serving order, skipping empty slots.
    pub fn place_ids(&self) -> impl Iterator<Item = &str> {
        [&self.dinner, &self.snack, &self.dessert]
            .into_iter()
            .filter_map(|slot| slot.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicPrefs {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for MusicPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.6,
        }
    }
}

impl MusicPrefs {
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayStats {
    #[serde(deserialize_with = "or_default")]
    pub game_attempts: u32,
    #[serde(deserialize_with = "or_default")]
    pub last_played_at: Option<i64>,
}

/// One visitor's progress through the flow.
///
/// `step` only moves forward; the single way back is [`AppState::default`] via an
/// explicit reset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredAppState")]
pub struct AppState {
    pub step: Step,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_place_id: Option<String>,
    pub itinerary: Itinerary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_outfit_id: Option<String>,
    pub music: MusicPrefs,
    pub stats: PlayStats,
}

/// Wire shape accepted on read. Older saves put a JSON-encoded itinerary object
/// into `chosenPlaceId`; those are lifted into [`Itinerary`].
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredAppState {
    #[serde(deserialize_with = "or_default")]
    step: Step,
    unlocked: bool,
    #[serde(deserialize_with = "or_default")]
    chosen_place_id: Option<String>,
    itinerary: Itinerary,
    #[serde(deserialize_with = "or_default")]
    chosen_outfit_id: Option<String>,
    music: MusicPrefs,
    stats: PlayStats,
}

impl From<StoredAppState> for AppState {
    fn from(stored: StoredAppState) -> Self {
        let mut itinerary = stored.itinerary;
        let mut chosen_place_id = stored.chosen_place_id;
        if let Some(encoded) = chosen_place_id.as_deref().filter(|s| s.trim_start().starts_with('{'))
        {
            if let Ok(legacy) = serde_json::from_str::<Itinerary>(encoded) {
                if itinerary.is_empty() {
                    itinerary = legacy;
                }
                chosen_place_id = None;
            }
        }
        let mut music = stored.music;
        music.set_volume(music.volume);
        Self {
            step: stored.step,
            unlocked: stored.unlocked,
            chosen_place_id,
            itinerary,
            chosen_outfit_id: stored.chosen_outfit_id,
            music,
            stats: stored.stats,
        }
    }
}

impl AppState {
    /// Move forward to `step`. Never moves backward; returns whether the step changed.
    pub fn advance_to(&mut self, step: Step) -> bool {
        if step > self.step {
            self.step = step;
            true
        } else {
            false
        }
    }

    /// Mark the puzzle solved and open the message step.
    pub fn unlock(&mut self) {
        self.unlocked = true;
        self.advance_to(Step::Message);
    }

    pub fn record_game_attempt(&mut self, now_ms: i64) {
        self.stats.game_attempts = self.stats.game_attempts.saturating_add(1);
        self.stats.last_played_at = Some(now_ms);
    }

    /// Copy of `next` with the step held at or above the current one.
    #[must_use]
    pub fn merge_forward(&self, mut next: Self) -> Self {
        if next.step < self.step {
            log::warn!(
                "Ignoring backward step change {} -> {}; only reset may rewind",
                self.step,
                next.step
            );
            next.step = self.step;
        }
        next
    }
}

/// Single entry point for the persisted [`AppState`].
///
/// Always reads and writes the whole structure; callers read-modify-write rather
/// than patching individual fields.
#[derive(Debug, Clone)]
pub struct StateStore<S> {
    store: S,
}

impl<S: PersistedStore> StateStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the persisted state, degrading to defaults on absence or corruption.
    #[must_use]
    pub fn load(&self) -> AppState {
        match self.store.get(STATE_KEY) {
            Ok(Some(raw)) => hydrate_str(&raw),
            Ok(None) => AppState::default(),
            Err(err) => {
                log::warn!("State cache unreadable, starting fresh: {err}");
                AppState::default()
            }
        }
    }

    /// Persist the full state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn save(&self, state: &AppState) -> Result<(), StoreError> {
        write_json(&self.store, STATE_KEY, state)
    }

    /// Remove the persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(STATE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn advance_never_moves_backward() {
        let mut state = AppState::default();
        assert!(state.advance_to(Step::Places));
        assert!(!state.advance_to(Step::Puzzle));
        assert_eq!(state.step, Step::Places);
    }

    #[test]
    fn unlock_opens_message_step_once() {
        let mut state = AppState::default();
        state.unlock();
        assert!(state.unlocked);
        assert_eq!(state.step, Step::Message);

        state.advance_to(Step::Outfits);
        state.unlock();
        assert_eq!(state.step, Step::Outfits);
    }

    #[test]
    fn merge_forward_holds_the_step() {
        let current = AppState {
            step: Step::Outfits,
            ..AppState::default()
        };
        let next = current.merge_forward(AppState {
            chosen_outfit_id: Some("bold".to_string()),
            ..AppState::default()
        });
        assert_eq!(next.step, Step::Outfits);
        assert_eq!(next.chosen_outfit_id.as_deref(), Some("bold"));
    }

    #[test]
    fn volume_is_clamped() {
        let mut music = MusicPrefs::default();
        music.set_volume(3.0);
        assert!((music.volume - 1.0).abs() < f32::EPSILON);
        music.set_volume(f32::NAN);
        assert!(music.volume.abs() < f32::EPSILON);
    }

    #[test]
    fn game_attempts_are_counted_with_timestamp() {
        let mut state = AppState::default();
        state.record_game_attempt(10);
        state.record_game_attempt(20);
        assert_eq!(state.stats.game_attempts, 2);
        assert_eq!(state.stats.last_played_at, Some(20));
    }

    #[test]
    fn legacy_encoded_itinerary_is_lifted() {
        let raw = r#"{"step":3,"chosenPlaceId":"{\"dinner\":\"trattoria\",\"dessert\":\"gelateria\"}"}"#;
        let state: AppState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.chosen_place_id, None);
        assert_eq!(state.itinerary.dinner.as_deref(), Some("trattoria"));
        assert_eq!(state.itinerary.snack, None);
        let ids: Vec<&str> = state.itinerary.place_ids().collect();
        assert_eq!(ids, vec!["trattoria", "gelateria"]);
    }

    #[test]
    fn plain_place_id_is_kept() {
        let state: AppState = serde_json::from_str(r#"{"chosenPlaceId":"ramen-bar"}"#).unwrap();
        assert_eq!(state.chosen_place_id.as_deref(), Some("ramen-bar"));
        assert!(state.itinerary.is_empty());
    }

    #[test]
    fn a_bad_leaf_does_not_erase_progress() {
        let store = MemoryStore::new();
        let states = StateStore::new(store.clone());
        store
            .set(
                STATE_KEY,
                r#"{"step":4,"unlocked":true,"chosenOutfitId":"bold","stats":{"lastPlayedAt":"yesterday"}}"#,
            )
            .unwrap();
        let state = states.load();
        assert_eq!(state.step, Step::Outfits);
        assert!(state.unlocked);
        assert_eq!(state.chosen_outfit_id.as_deref(), Some("bold"));
        assert_eq!(state.stats.last_played_at, None);

        store
            .set(
                STATE_KEY,
                r#"{"step":3,"chosenPlaceId":17,"itinerary":{"dinner":"trattoria","snack":[1]},"stats":{"gameAttempts":-2}}"#,
            )
            .unwrap();
        let state = states.load();
        assert_eq!(state.step, Step::Places);
        assert_eq!(state.chosen_place_id, None);
        assert_eq!(state.itinerary.dinner.as_deref(), Some("trattoria"));
        assert_eq!(state.itinerary.snack, None);
        assert_eq!(state.stats.game_attempts, 0);
    }

    #[test]
    fn store_round_trips_and_survives_corruption() {
        let store = MemoryStore::new();
        let states = StateStore::new(store.clone());
        assert_eq!(states.load(), AppState::default());

        let mut state = AppState::default();
        state.advance_to(Step::Places);
        state.chosen_outfit_id = Some("classic".to_string());
        states.save(&state).unwrap();
        assert_eq!(states.load(), state);

        store.set(STATE_KEY, "{{{").unwrap();
        assert_eq!(states.load(), AppState::default());

        store.set(STATE_KEY, r#"{"step":42,"unlocked":true}"#).unwrap();
        let loaded = states.load();
        assert_eq!(loaded.step, Step::Landing);
        assert!(loaded.unlocked);

        states.clear().unwrap();
        assert_eq!(store.get(STATE_KEY).unwrap(), None);
    }
}
