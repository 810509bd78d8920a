//! Well-known storage keys and the remote document identity.
//!
//! Keys carry a version suffix; a schema change ships as a new key rather than an
//! in-place migration.

pub const STATE_KEY: &str = "giftflow.state.v1";
pub const CONFIG_KEY: &str = "giftflow.config.v1";
pub const LOG_KEY: &str = "giftflow.log.v1";

/// The single shared configuration document. Reads, writes and the live feed all
/// target this id.
pub const REMOTE_DOC_ID: &str = "main-config";
