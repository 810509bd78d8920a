use crate::paths::media_url;
use giftflow_core::{MusicPrefs, MusicTrack};
use web_sys::{HtmlInputElement, HtmlMediaElement};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct MusicToggleProps {
    pub track: MusicTrack,
    pub prefs: MusicPrefs,
    pub on_change: Callback<MusicPrefs>,
}

/// Background track with an on/off switch and a volume slider. Preferences are
/// owned by the caller; this component only reflects them onto the `<audio>`.
#[function_component(MusicToggle)]
pub fn music_toggle(props: &MusicToggleProps) -> Html {
    let audio_ref = use_node_ref();

    {
        let audio_ref = audio_ref.clone();
        use_effect_with(props.prefs.clone(), move |prefs| {
            if let Some(audio) = audio_ref.cast::<HtmlMediaElement>() {
                audio.set_volume(f64::from(prefs.volume));
                if prefs.enabled {
                    // Refused until the first interaction in most browsers.
                    let _ = audio.play();
                } else {
                    let _ = audio.pause();
                }
            }
        });
    }

    let on_toggle = {
        let prefs = props.prefs.clone();
        let cb = props.on_change.clone();
        Callback::from(move |_| {
            let mut next = prefs.clone();
            next.enabled = !next.enabled;
            cb.emit(next);
        })
    };
    let on_volume = {
        let prefs = props.prefs.clone();
        let cb = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                #[allow(clippy::cast_possible_truncation)]
                let volume = input.value_as_number() as f32;
                let mut next = prefs.clone();
                next.set_volume(volume);
                cb.emit(next);
            }
        })
    };

    if props.track.url.is_empty() {
        return Html::default();
    }

    html! {
        <div class="music">
            <audio ref={audio_ref} src={media_url(&props.track.url)} preload="auto"></audio>
            <button type="button" class="btn btn-ghost" aria-pressed={props.prefs.enabled.to_string()} onclick={on_toggle}>
                { if props.prefs.enabled { "Music on" } else { "Music off" } }
            </button>
            if !props.track.title.is_empty() {
                <span class="track-title">{ props.track.title.clone() }</span>
            }
            <input
                type="range"
                min="0"
                max="1"
                step="0.05"
                aria-label="Volume"
                value={props.prefs.volume.to_string()}
                oninput={on_volume}
            />
        </div>
    }
}
