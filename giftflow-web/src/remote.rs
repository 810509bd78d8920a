//! Hosted document store over HTTP.
//!
//! Documents live at `{base}/documents/{id}`: `GET` reads, `PUT` replaces the
//! whole document, and `{base}/documents/{id}/stream` is a server-sent event
//! stream whose messages each carry a full JSON snapshot.

use futures::StreamExt;
use futures::future::abortable;
use giftflow_core::remote::{FetchDone, PushDone, SnapshotFn};
use giftflow_core::{NoRemote, RemoteConfigStore, RemoteError, Subscription};
use gloo_net::eventsource::futures::EventSource;
use gloo_net::http::{Request, Response};
use serde_json::Value;
use web_sys::MessageEvent;

const NOT_FOUND: u16 = 404;

fn net_error(err: gloo_net::Error) -> RemoteError {
    match err {
        gloo_net::Error::SerdeError(err) => RemoteError::Decode(err.to_string()),
        other => RemoteError::Transport(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRemote {
    base: String,
}

impl HttpRemote {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn document_url(&self, doc_id: &str) -> String {
        format!("{}/documents/{doc_id}", self.base)
    }

    #[must_use]
    pub fn stream_url(&self, doc_id: &str) -> String {
        format!("{}/stream", self.document_url(doc_id))
    }
}

fn rejected(response: &Response) -> Option<RemoteError> {
    (!response.ok()).then(|| RemoteError::Rejected(response.status()))
}

#[allow(clippy::future_not_send)] // Wasm fetch futures are not `Send`.
async fn get_document(url: String) -> Result<Option<Value>, RemoteError> {
    let response = Request::get(&url).send().await.map_err(net_error)?;
    if response.status() == NOT_FOUND {
        return Ok(None);
    }
    if let Some(err) = rejected(&response) {
        return Err(err);
    }
    let document = response.json::<Value>().await.map_err(net_error)?;
    Ok(Some(document))
}

#[allow(clippy::future_not_send)]
async fn put_document(url: String, document: Value) -> Result<(), RemoteError> {
    let response = Request::put(&url)
        .json(&document)
        .map_err(net_error)?
        .send()
        .await
        .map_err(net_error)?;
    rejected(&response).map_or(Ok(()), Err)
}

fn decode_snapshot(event: &MessageEvent) -> Result<Value, RemoteError> {
    let text = event
        .data()
        .as_string()
        .ok_or_else(|| RemoteError::Decode("snapshot is not text".to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

impl RemoteConfigStore for HttpRemote {
    fn fetch(&self, doc_id: &str, done: FetchDone) {
        let url = self.document_url(doc_id);
        wasm_bindgen_futures::spawn_local(async move {
            done(get_document(url).await);
        });
    }

    fn push(&self, doc_id: &str, document: Value, done: PushDone) {
        let url = self.document_url(doc_id);
        wasm_bindgen_futures::spawn_local(async move {
            done(put_document(url, document).await);
        });
    }

    fn subscribe(&self, doc_id: &str, mut on_snapshot: SnapshotFn) -> Subscription {
        let mut source = match EventSource::new(&self.stream_url(doc_id)) {
            Ok(source) => source,
            Err(err) => {
                on_snapshot(Err(RemoteError::Transport(err.to_string())));
                return Subscription::noop();
            }
        };
        let mut messages = match source.subscribe("message") {
            Ok(messages) => messages,
            Err(err) => {
                on_snapshot(Err(RemoteError::Transport(err.to_string())));
                return Subscription::noop();
            }
        };

        // The task owns the source; aborting it drops the source, which closes
        // the connection.
        let (feed, handle) = abortable(async move {
            while let Some(event) = messages.next().await {
                match event {
                    Ok((_, message)) => on_snapshot(decode_snapshot(&message)),
                    Err(err) => on_snapshot(Err(RemoteError::Transport(err.to_string()))),
                }
            }
            source.close();
        });
        wasm_bindgen_futures::spawn_local(async move {
            let _ = feed.await;
        });
        Subscription::new(move || handle.abort())
    }
}

/// The remote chosen at build time: the hosted store when an endpoint is
/// configured, otherwise local-only operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebRemote {
    Http(HttpRemote),
    LocalOnly(NoRemote),
}

impl WebRemote {
    #[must_use]
    pub fn from_build_env() -> Self {
        match crate::paths::remote_base() {
            Some(base) => Self::Http(HttpRemote::new(base)),
            None => {
                log::info!("No remote endpoint configured; content stays in this browser");
                Self::LocalOnly(NoRemote)
            }
        }
    }
}

impl RemoteConfigStore for WebRemote {
    fn fetch(&self, doc_id: &str, done: FetchDone) {
        match self {
            Self::Http(remote) => remote.fetch(doc_id, done),
            Self::LocalOnly(remote) => remote.fetch(doc_id, done),
        }
    }

    fn push(&self, doc_id: &str, document: Value, done: PushDone) {
        match self {
            Self::Http(remote) => remote.push(doc_id, document, done),
            Self::LocalOnly(remote) => remote.push(doc_id, document, done),
        }
    }

    fn subscribe(&self, doc_id: &str, on_snapshot: SnapshotFn) -> Subscription {
        match self {
            Self::Http(remote) => remote.subscribe(doc_id, on_snapshot),
            Self::LocalOnly(remote) => remote.subscribe(doc_id, on_snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let remote = HttpRemote::new("https://content.example/api/");
        assert_eq!(
            remote.document_url("main-config"),
            "https://content.example/api/documents/main-config"
        );
        assert_eq!(
            remote.stream_url("main-config"),
            "https://content.example/api/documents/main-config/stream"
        );
    }
}
