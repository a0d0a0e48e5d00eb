//! Fixed tables used by the classification heuristics.

/// Images below this size are page assets, not downloads.
pub const IMAGE_SIZE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Size floor applied even when the user configured a smaller minimum.
pub const MIN_SIZE_FLOOR: u64 = 100 * 1024;

/// MIME prefixes that are downloads regardless of size.
pub const DOWNLOAD_MIME_PREFIXES: &[&str] = &[
    "application/octet-stream",
    "application/zip",
    "application/x-rar",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-bzip2",
    "application/pdf",
    "video/",
    "audio/",
    "application/vnd.ms-",
    "application/vnd.openxmlformats-",
    "application/x-executable",
    "application/x-msi",
    "application/x-iso9660-image",
];

/// Page resources and API payloads; never downloads.
pub const EXCLUDED_MIME_TYPES: &[&str] = &[
    "text/html",
    "text/plain",
    "text/css",
    "text/javascript",
    "application/javascript",
    "application/json",
    "application/xml",
    "text/xml",
    "image/x-icon",
    "image/vnd.microsoft.icon",
];

/// Extensions that mark a network response as a download.
pub const NETWORK_DOWNLOAD_EXTENSIONS: &[&str] = &[
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2",
    ".exe", ".msi", ".dmg", ".pkg", ".deb", ".rpm", ".apk",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm",
    ".mp3", ".flac", ".wav", ".aac", ".ogg", ".m4a",
    ".iso", ".img", ".torrent",
];

/// Path suffixes that mark an anchor as a download link.
pub const DOM_DOWNLOAD_EXTENSIONS: &[&str] = &[
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".tar.gz",
    ".exe", ".msi", ".dmg", ".pkg", ".deb", ".rpm", ".appimage",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm",
    ".mp3", ".flac", ".wav", ".aac", ".ogg", ".m4a",
    ".iso", ".img",
    ".apk", ".ipa", ".jar", ".war",
    ".torrent",
];

/// Path fragments used by download endpoints.
pub const DOWNLOAD_PATH_SEGMENTS: &[&str] = &[
    "/download/",
    "/downloads/",
    "/releases/download/",
    "/attachments/",
    "/files/",
    "/assets/",
];

/// Server-rendered page extensions; a link to one is navigation.
pub const WEB_PAGE_EXTENSIONS: &[&str] = &[".html", ".htm", ".php", ".asp", ".aspx", ".jsp"];

/// Query keys whose value `1`/`true`/`download` signals download intent.
pub const DOWNLOAD_INTENT_KEYS: &[&str] = &[
    "download",
    "dl",
    "export",
    "action",
    "response-content-disposition",
];

/// GitHub pages that browse a repository rather than fetch an artifact.
pub const GITHUB_PAGE_PATHS: &[&str] = &["/releases/tag/", "/releases/edit/", "/tree/", "/blob/"];

/// GitHub artifact paths.
pub const GITHUB_ARTIFACT_PATHS: &[&str] = &["/releases/download/", "/archive/refs/"];
