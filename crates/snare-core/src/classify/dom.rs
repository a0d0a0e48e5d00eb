//! Download-link recognition for URLs found in page markup.

use url::Url;

use super::rules::{
    DOM_DOWNLOAD_EXTENSIONS, DOWNLOAD_INTENT_KEYS, DOWNLOAD_PATH_SEGMENTS, GITHUB_ARTIFACT_PATHS,
    GITHUB_PAGE_PATHS, WEB_PAGE_EXTENSIONS,
};
use crate::url_model::{file_extension, is_numeric_extension};

/// Judges whether an anchor or media URL looks like a download.
///
/// `has_download_attr` is true when the anchor carries a `download` attribute.
/// Unparseable URLs are never downloads.
pub fn is_download_link(url: &str, has_download_attr: bool) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    match parsed.scheme() {
        "magnet" => return true,
        "blob" | "data" => return false,
        _ => {}
    }

    if has_download_attr {
        return true;
    }

    if has_download_intent(&parsed) {
        return true;
    }

    let pathname = parsed.path().to_ascii_lowercase();

    if DOM_DOWNLOAD_EXTENSIONS.iter().any(|ext| pathname.ends_with(ext)) {
        return true;
    }

    if pathname.contains('.') && DOWNLOAD_PATH_SEGMENTS.iter().any(|p| pathname.contains(p)) {
        return true;
    }

    let host = parsed.host_str().unwrap_or("");
    if host.contains("github.com") || host.contains("githubusercontent.com") {
        if GITHUB_PAGE_PATHS.iter().any(|p| pathname.contains(p)) {
            return false;
        }
        if GITHUB_ARTIFACT_PATHS.iter().any(|p| pathname.contains(p)) {
            return true;
        }
    }

    let segment = pathname.rsplit('/').next().unwrap_or("");
    match file_extension(segment) {
        Some(ext) => !is_numeric_extension(&ext) && !WEB_PAGE_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

fn has_download_intent(url: &Url) -> bool {
    DOWNLOAD_INTENT_KEYS.iter().any(|key| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v == "1" || v == "true" || v.eq_ignore_ascii_case("download"))
            .unwrap_or(false)
    })
}
