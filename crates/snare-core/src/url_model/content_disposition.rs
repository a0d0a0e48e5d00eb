//! Content-Disposition header parsing (disposition type, filename and filename*).

/// True if the header's disposition type is `attachment`.
pub fn is_attachment(header_value: &str) -> bool {
    header_value
        .split(';')
        .next()
        .map(|kind| kind.trim().eq_ignore_ascii_case("attachment"))
        .unwrap_or(false)
}

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename="value"` (quoted; strips quotes and unescapes)
/// - `filename=value` (token)
/// - `filename*=charset'lang'percent-encoded` (RFC 5987; decoded)
///
/// If both `filename` and `filename*` exist, `filename*` takes precedence.
/// A plain `filename` that is itself percent-encoded is decoded when the
/// result is valid UTF-8, otherwise kept verbatim.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let value = header_value.trim();
    let mut filename_from_token: Option<String> = None;

    for param in value.split(';') {
        let param = param.trim();
        let Some((name, v)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            if let Some(decoded) = decode_ext_value(v) {
                return Some(decoded);
            }
        }

        if name == "filename" {
            let unquoted = if v.starts_with('"') && v.ends_with('"') && v.len() >= 2 {
                decode_quoted_filename(&v[1..v.len() - 1])
            } else {
                v.to_string()
            };
            let unquoted = unquoted.trim();
            if !unquoted.is_empty() {
                let decoded = urlencoding::decode(unquoted)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| unquoted.to_string());
                filename_from_token = Some(decoded);
            }
        }
    }

    filename_from_token
}

/// Decode an RFC 5987 ext-value: `charset'language'pct-encoded`.
///
/// The charset is not used for transcoding; values are decoded as UTF-8.
fn decode_ext_value(v: &str) -> Option<String> {
    let v = v.trim_matches('"');
    let mut parts = v.splitn(3, '\'');
    let _charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    let decoded = urlencoding::decode(encoded).ok()?;
    let decoded = decode_quoted_filename(&decoded);
    if decoded.trim().is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Decode backslash-escaped quotes in a quoted filename value.
pub(super) fn decode_quoted_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
