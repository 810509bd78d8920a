use giftflow_core::{ContentConfig, StoredLogEntry, try_hydrate};
use serde_json::Value;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigEditError {
    #[error("The editor is empty")]
    Empty,
    #[error("The document must be a JSON object")]
    NotAnObject,
    #[error("Not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse operator input into a full config. Missing sections take their
/// defaults, so partial documents are accepted.
///
/// # Errors
/// Returns an error for blank input, malformed JSON or a non-object document.
pub fn parse_config(text: &str) -> Result<ContentConfig, ConfigEditError> {
    if text.trim().is_empty() {
        return Err(ConfigEditError::Empty);
    }
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ConfigEditError::NotAnObject);
    }
    Ok(try_hydrate(&value)?)
}

#[must_use]
pub fn editor_text(config: &ContentConfig) -> String {
    serde_json::to_string_pretty(config).unwrap_or_default()
}

#[derive(Properties, Clone, PartialEq)]
pub struct AdminPageProps {
    pub config: ContentConfig,
    #[prop_or_default]
    pub entries: Vec<StoredLogEntry>,
    pub on_publish: Callback<ContentConfig>,
    pub on_clear_log: Callback<()>,
}

#[derive(Clone, PartialEq)]
enum Status {
    Idle,
    Published,
    Invalid(String),
}

fn log_rows(entries: &[StoredLogEntry]) -> Html {
    entries
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, entry)| {
            let payload = entry
                .payload
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default();
            html! {
                <tr key={idx}>
                    <td class="timestamp">{ entry.timestamp }</td>
                    <td class="kind">{ entry.kind.clone() }</td>
                    <td class="payload"><code>{ payload }</code></td>
                </tr>
            }
        })
        .collect()
}

#[function_component(AdminPage)]
pub fn admin_page(props: &AdminPageProps) -> Html {
    let unlocked = use_state(|| false);
    let passcode = use_state(String::new);
    let rejected = use_state(|| false);
    let draft = use_state(|| editor_text(&props.config));
    let status = use_state(|| Status::Idle);

    if !*unlocked {
        let on_passcode = {
            let passcode = passcode.clone();
            Callback::from(move |e: InputEvent| {
                if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                    passcode.set(input.value());
                }
            })
        };
        let on_unlock = {
            let config = props.config.clone();
            let passcode = passcode.clone();
            let unlocked = unlocked.clone();
            let rejected = rejected.clone();
            let draft = draft.clone();
            Callback::from(move |e: SubmitEvent| {
                e.prevent_default();
                if config.verify_passcode(&passcode) {
                    draft.set(editor_text(&config));
                    rejected.set(false);
                    unlocked.set(true);
                } else {
                    log::info!("Admin passcode rejected");
                    rejected.set(true);
                }
            })
        };
        return html! {
            <section class="panel admin locked" data-testid="admin-locked">
                <h1>{ "Admin" }</h1>
                <form onsubmit={on_unlock}>
                    <label for="admin-passcode">{ "Passcode" }</label>
                    <input
                        id="admin-passcode"
                        type="password"
                        autocomplete="off"
                        value={(*passcode).clone()}
                        oninput={on_passcode}
                    />
                    <button type="submit" class="btn btn-primary">{ "Unlock" }</button>
                </form>
                if *rejected {
                    <p class="error" role="alert">{ "That passcode didn't work." }</p>
                }
            </section>
        };
    }

    let on_edit = {
        let draft = draft.clone();
        let status = status.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(area) = e.target_dyn_into::<HtmlTextAreaElement>() {
                draft.set(area.value());
                status.set(Status::Idle);
            }
        })
    };
    let on_publish = {
        let draft = draft.clone();
        let status = status.clone();
        let publish = props.on_publish.clone();
        Callback::from(move |_| match parse_config(&draft) {
            Ok(config) => {
                draft.set(editor_text(&config));
                status.set(Status::Published);
                publish.emit(config);
            }
            Err(err) => status.set(Status::Invalid(err.to_string())),
        })
    };
    let on_revert = {
        let draft = draft.clone();
        let status = status.clone();
        let config = props.config.clone();
        Callback::from(move |_| {
            draft.set(editor_text(&config));
            status.set(Status::Idle);
        })
    };
    let on_clear_log = {
        let cb = props.on_clear_log.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let status_line = match &*status {
        Status::Idle => Html::default(),
        Status::Published => html! { <p class="ok" role="status">{ "Published." }</p> },
        Status::Invalid(reason) => html! { <p class="error" role="alert">{ reason.clone() }</p> },
    };

    html! {
        <section class="panel admin" data-testid="admin-screen">
            <h1>{ "Admin" }</h1>
            <h2>{ "Content" }</h2>
            <textarea
                class="config-editor"
                rows="24"
                spellcheck="false"
                value={(*draft).clone()}
                oninput={on_edit}
            />
            <div class="actions">
                <button type="button" class="btn btn-primary" onclick={on_publish}>{ "Publish" }</button>
                <button type="button" class="btn" onclick={on_revert}>{ "Revert to live" }</button>
            </div>
            { status_line }
            <h2>{ format!("Activity ({})", props.entries.len()) }</h2>
            <button type="button" class="btn btn-ghost" onclick={on_clear_log}>{ "Clear log" }</button>
            <table class="activity">
                <thead>
                    <tr><th>{ "When" }</th><th>{ "What" }</th><th>{ "Details" }</th></tr>
                </thead>
                <tbody>{ log_rows(&props.entries) }</tbody>
            </table>
        </section>
    }
}
