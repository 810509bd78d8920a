/// Failures from the local key/value cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage rejected write for {key}: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures from the remote document store.
///
/// Every remote failure is logged and swallowed by the sync engine; callers never
/// see these unless they talk to a [`crate::RemoteConfigStore`] directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Remote rejected request with status {0}")]
    Rejected(u16),
    #[error("Remote payload could not be decoded: {0}")]
    Decode(String),
    #[error("Remote subscription closed")]
    Closed,
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
