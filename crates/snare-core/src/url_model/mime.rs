//! MIME type → file extension table.

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("application/pdf", ".pdf"),
    ("application/zip", ".zip"),
    ("application/x-rar-compressed", ".rar"),
    ("application/x-7z-compressed", ".7z"),
    ("application/x-tar", ".tar"),
    ("application/gzip", ".gz"),
    ("application/x-bzip2", ".bz2"),
    ("video/mp4", ".mp4"),
    ("video/x-matroska", ".mkv"),
    ("video/x-msvideo", ".avi"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
    ("audio/mpeg", ".mp3"),
    ("audio/flac", ".flac"),
    ("audio/wav", ".wav"),
    ("audio/aac", ".aac"),
    ("audio/ogg", ".ogg"),
    ("audio/x-m4a", ".m4a"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/bmp", ".bmp"),
    ("image/svg+xml", ".svg"),
    ("application/vnd.ms-excel", ".xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
];

/// Guess a file extension (with leading dot) from a MIME type.
///
/// Parameters such as `; charset=...` are ignored and matching is
/// case-insensitive.
pub fn extension_from_mime(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim();
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}
