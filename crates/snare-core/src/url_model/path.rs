//! Filename extraction from URL path.

use super::is_numeric_extension;

/// Extracts the last path segment from a URL for use as a filename hint.
///
/// Only segments that contain a dot qualify, and a purely numeric suffix
/// (`v1.0.3` → `.3`) is rejected as a version number. The segment is
/// percent-decoded when that yields valid UTF-8.
///
/// Returns `None` if the URL cannot be parsed or no segment qualifies.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().rsplit('/').next()?;
    if segment.is_empty() || segment == "." || segment == ".." || !segment.contains('.') {
        return None;
    }
    let ext = &segment[segment.rfind('.')?..];
    if is_numeric_extension(ext) || ext == "." {
        return None;
    }
    let decoded = urlencoding::decode(segment)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

/// Last path segment of a URL regardless of whether it looks like a file.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(
        urlencoding::decode(segment)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| segment.to_string()),
    )
}
