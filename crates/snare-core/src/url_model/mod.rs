//! URL modeling and filename derivation.
//!
//! Derives the best available filename for a captured request from its
//! Content-Disposition header, query parameters, URL path or MIME type, and
//! sanitizes it for common filesystems.

mod content_disposition;
mod mime;
mod path;
mod query;
mod sanitize;

pub use content_disposition::{is_attachment, parse_content_disposition_filename};
pub use mime::extension_from_mime;
pub use path::{filename_from_url_path, last_path_segment};
pub use query::filename_from_query;
pub use sanitize::sanitize_filename;

/// Lowercased extension (with leading dot) of a filename or URL path, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    let idx = filename.rfind('.')?;
    let ext = &filename[idx..];
    if ext.len() < 2 || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// True for extensions like `.3` that come from version numbers (`v1.0.3`).
pub fn is_numeric_extension(ext: &str) -> bool {
    ext.strip_prefix('.')
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Derives a filename for a captured request.
///
/// Order: Content-Disposition (`filename*` before `filename`), well-known
/// query parameters, the last URL path segment (when it has a non-numeric
/// extension), and finally `download_<UTC timestamp><ext>` with the
/// extension guessed from `content_type`.
///
/// The result is not sanitized; callers sanitize at capture or dispatch.
///
/// # Examples
///
/// - `derive_filename("https://example.com/archive.zip", None, None)` → `"archive.zip"`
/// - `derive_filename("https://example.com/", Some("attachment; filename=\"report.pdf\""), None)` → `"report.pdf"`
pub fn derive_filename(
    url: &str,
    content_disposition: Option<&str>,
    content_type: Option<&str>,
) -> String {
    content_disposition
        .and_then(parse_content_disposition_filename)
        .or_else(|| filename_from_query(url))
        .or_else(|| filename_from_url_path(url))
        .unwrap_or_else(|| {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
            let ext = content_type.and_then(extension_from_mime).unwrap_or("");
            format!("download_{timestamp}{ext}")
        })
}
