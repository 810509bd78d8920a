//! Build-time deployment settings.
//!
//! Everything here is read with `option_env!` so a static bundle carries its own
//! configuration: `PUBLIC_URL` for the hosting base path, `GIFTFLOW_REMOTE_URL`
//! for the hosted document store, and `GIFTFLOW_REMOTE_DOC` to override the
//! shared document id.
use giftflow_core::keys::REMOTE_DOC_ID;

/// Build a URL for a static asset that respects the deployment base path.
#[must_use]
pub fn asset_path(relative: &str) -> String {
    asset_path_with_base(relative, option_env!("PUBLIC_URL").unwrap_or(""))
}

/// Resolve a media reference from content config. Absolute URLs pass through;
/// anything else is treated as a bundled asset.
#[must_use]
pub fn media_url(reference: &str) -> String {
    if reference.is_empty() || reference.contains("://") || reference.starts_with("data:") {
        reference.to_string()
    } else {
        asset_path(reference)
    }
}

/// Base path for the router (e.g., `/gift` when hosted under a subdirectory).
///
/// Returns `None` when no base path is configured so the router falls back to root.
#[must_use]
pub fn router_base() -> Option<String> {
    non_empty_base(option_env!("PUBLIC_URL").unwrap_or(""))
}

/// Endpoint of the hosted document store, if one was configured.
#[must_use]
pub fn remote_base() -> Option<String> {
    non_empty_base(option_env!("GIFTFLOW_REMOTE_URL").unwrap_or(""))
}

/// The one document id used for every remote read, write and subscription.
#[must_use]
pub fn remote_doc_id() -> &'static str {
    match option_env!("GIFTFLOW_REMOTE_DOC") {
        Some(id) if !id.trim().is_empty() => id,
        _ => REMOTE_DOC_ID,
    }
}

fn asset_path_with_base(relative: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = relative.trim_start_matches('/');

    if base.is_empty() {
        format!("/{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

fn non_empty_base(base: &str) -> Option<String> {
    let base = base.trim().trim_end_matches('/');
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_are_root_anchored_without_base() {
        assert_eq!(asset_path_with_base("static/audio/theme.mp3", ""), "/static/audio/theme.mp3");
        assert_eq!(asset_path_with_base("/static/audio/theme.mp3", ""), "/static/audio/theme.mp3");
    }

    #[test]
    fn asset_paths_use_public_base() {
        assert_eq!(
            asset_path_with_base("static/img/places/gelateria.jpg", "/gift/"),
            "/gift/static/img/places/gelateria.jpg"
        );
    }

    #[test]
    fn absolute_media_urls_pass_through() {
        assert_eq!(media_url("https://cdn.example/song.mp3"), "https://cdn.example/song.mp3");
        assert_eq!(media_url(""), "");
        if option_env!("PUBLIC_URL").is_none() {
            assert_eq!(media_url("static/img/a.jpg"), "/static/img/a.jpg");
        }
    }

    #[test]
    fn empty_bases_are_none() {
        assert_eq!(non_empty_base(""), None);
        assert_eq!(non_empty_base("  / "), None);
        assert_eq!(non_empty_base("https://api.example/"), Some("https://api.example".to_string()));
    }

    #[test]
    fn doc_id_defaults_to_shared_id() {
        if option_env!("GIFTFLOW_REMOTE_DOC").is_none() {
            assert_eq!(remote_doc_id(), REMOTE_DOC_ID);
        }
    }
}
