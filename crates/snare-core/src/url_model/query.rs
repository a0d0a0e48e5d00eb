//! Filename hints carried in URL query parameters.

use super::content_disposition::parse_content_disposition_filename;

/// Query keys that commonly carry a download filename, in priority order.
const FILENAME_KEYS: &[&str] = &[
    "filename",
    "attname",
    "response-content-disposition",
    "download",
    "dl",
    "file",
    "name",
];

/// True for values like `dl=1` that flag intent rather than name a file.
fn is_boolean_flag(value: &str) -> bool {
    matches!(value, "1" | "0" | "true" | "false")
}

/// Extracts a filename from well-known query parameters.
///
/// `response-content-disposition` (S3/GCS signed URLs) is parsed as a
/// Content-Disposition header; if that yields nothing the key is skipped.
/// Boolean-looking values are skipped so `?dl=1&file=x.zip` yields `x.zip`.
pub fn filename_from_query(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;

    for key in FILENAME_KEYS {
        let Some(value) = parsed
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
        else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        if *key == "response-content-disposition" {
            if let Some(name) = parse_content_disposition_filename(&value) {
                return Some(name);
            }
            continue;
        }
        if is_boolean_flag(&value) {
            continue;
        }
        return Some(value);
    }

    None
}
