//! Download-candidate heuristics.
//!
//! [`classify`] decides whether a finished network request is a download;
//! [`is_download_link`] judges anchor URLs found in a page. Both are pure and
//! never fail: malformed inputs are treated as missing signals.
//!
//! The network rules are ordered and partially overlapping; later rules
//! assume earlier ones already handled their cases (the image size check
//! must run before the MIME deny-list, for example).

mod dom;
pub mod rules;

pub use dom::is_download_link;

use serde::{Deserialize, Serialize};

use crate::url_model::is_numeric_extension;
use rules::{
    DOWNLOAD_MIME_PREFIXES, EXCLUDED_MIME_TYPES, IMAGE_SIZE_THRESHOLD, MIN_SIZE_FLOOR,
    NETWORK_DOWNLOAD_EXTENSIONS,
};

/// Browser resource type of a request (webRequest `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Object,
    #[serde(rename = "xmlhttprequest")]
    XmlHttpRequest,
    Ping,
    Media,
    #[serde(rename = "websocket")]
    WebSocket,
    #[default]
    #[serde(other)]
    Other,
}

impl ResourceType {
    /// Top-level or framed page navigation.
    pub fn is_navigation(self) -> bool {
        matches!(self, ResourceType::MainFrame | ResourceType::SubFrame)
    }
}

/// Signals available about a request once its response headers are known.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMeta<'a> {
    pub url: &'a str,
    pub resource_type: ResourceType,
    /// MIME essence, without parameters.
    pub content_type: Option<&'a str>,
    pub content_length: Option<u64>,
    /// Content-Disposition type was `attachment`.
    pub is_attachment: bool,
    /// Filename from Content-Disposition or a query parameter.
    pub suggested_filename: Option<&'a str>,
    /// Extension with leading dot.
    pub extension: Option<&'a str>,
}

/// Which rule decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Attachment,
    NamedFile,
    PageNavigation,
    DownloadMime,
    SmallImage,
    ExcludedMime,
    LargeEnough,
    DownloadExtension,
    NoSignal,
}

/// Heuristic outcome. Candidates are still subject to the user's filter policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Candidate(Reason),
    Rejected(Reason),
}

impl Verdict {
    pub fn is_candidate(self) -> bool {
        matches!(self, Verdict::Candidate(_))
    }

    pub fn reason(self) -> Reason {
        match self {
            Verdict::Candidate(r) | Verdict::Rejected(r) => r,
        }
    }
}

/// Decide whether a request is a download candidate. First matching rule wins.
///
/// `min_file_size` is the user's configured floor; the effective size
/// threshold is never below [`MIN_SIZE_FLOOR`].
pub fn classify(meta: &RequestMeta<'_>, min_file_size: u64) -> Verdict {
    if meta.is_attachment {
        return Verdict::Candidate(Reason::Attachment);
    }

    if meta.suggested_filename.is_some() {
        return Verdict::Candidate(Reason::NamedFile);
    }

    if meta.resource_type.is_navigation() {
        return Verdict::Rejected(Reason::PageNavigation);
    }

    let content_type = meta
        .content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    if let Some(ct) = &content_type {
        if DOWNLOAD_MIME_PREFIXES.iter().any(|p| ct.starts_with(p)) {
            return Verdict::Candidate(Reason::DownloadMime);
        }
    }

    if meta.resource_type == ResourceType::Image
        && meta
            .content_length
            .map_or(true, |len| len < IMAGE_SIZE_THRESHOLD)
    {
        return Verdict::Rejected(Reason::SmallImage);
    }

    if let Some(ct) = &content_type {
        if EXCLUDED_MIME_TYPES.contains(&ct.as_str()) {
            return Verdict::Rejected(Reason::ExcludedMime);
        }
    }

    let effective_min = min_file_size.max(MIN_SIZE_FLOOR);
    if meta.content_length.is_some_and(|len| len >= effective_min) {
        return Verdict::Candidate(Reason::LargeEnough);
    }

    if let Some(ext) = meta.extension {
        let ext = ext.to_ascii_lowercase();
        if !is_numeric_extension(&ext) && NETWORK_DOWNLOAD_EXTENSIONS.contains(&ext.as_str()) {
            return Verdict::Candidate(Reason::DownloadExtension);
        }
    }

    Verdict::Rejected(Reason::NoSignal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn meta() -> RequestMeta<'static> {
        RequestMeta {
            url: "https://cdn.example.com/x",
            resource_type: ResourceType::XmlHttpRequest,
            ..RequestMeta::default()
        }
    }

    #[test]
    fn attachment_wins_regardless_of_size_or_type() {
        for (ct, len, rt) in [
            (Some("text/html"), Some(10), ResourceType::MainFrame),
            (Some("application/json"), None, ResourceType::Image),
            (None, Some(0), ResourceType::Other),
        ] {
            let m = RequestMeta {
                content_type: ct,
                content_length: len,
                resource_type: rt,
                is_attachment: true,
                ..meta()
            };
            assert_eq!(classify(&m, 0), Verdict::Candidate(Reason::Attachment));
        }
    }

    #[test]
    fn suggested_filename_is_candidate() {
        let m = RequestMeta {
            suggested_filename: Some("data.csv"),
            content_type: Some("text/plain"),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Candidate(Reason::NamedFile));
    }

    #[test]
    fn navigation_never_candidate() {
        let m = RequestMeta {
            resource_type: ResourceType::MainFrame,
            content_type: Some("application/zip"),
            content_length: Some(500 * MIB),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Rejected(Reason::PageNavigation));
    }

    #[test]
    fn download_mime_ignores_size() {
        let m = RequestMeta {
            content_type: Some("Application/PDF; charset=binary"),
            content_length: Some(12),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Candidate(Reason::DownloadMime));

        let m = RequestMeta {
            content_type: Some("application/x-rar-compressed"),
            ..meta()
        };
        assert!(classify(&m, 0).is_candidate());
    }

    #[test]
    fn image_without_length_rejected() {
        let m = RequestMeta {
            resource_type: ResourceType::Image,
            content_type: Some("image/png"),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Rejected(Reason::SmallImage));
    }

    #[test]
    fn large_image_is_candidate() {
        let m = RequestMeta {
            resource_type: ResourceType::Image,
            content_type: Some("image/jpeg"),
            content_length: Some(10 * MIB),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Candidate(Reason::LargeEnough));

        let small = RequestMeta {
            content_length: Some(10 * MIB - 1),
            ..m
        };
        assert_eq!(classify(&small, 0), Verdict::Rejected(Reason::SmallImage));
    }

    #[test]
    fn excluded_mime_even_when_large() {
        let m = RequestMeta {
            content_type: Some("application/json"),
            content_length: Some(50 * MIB),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Rejected(Reason::ExcludedMime));
    }

    #[test]
    fn size_floor_is_at_least_100_kib() {
        let below = RequestMeta {
            content_type: Some("application/x-custom"),
            content_length: Some(100 * 1024 - 1),
            ..meta()
        };
        assert_eq!(classify(&below, 0), Verdict::Rejected(Reason::NoSignal));

        let at = RequestMeta {
            content_length: Some(100 * 1024),
            ..below
        };
        assert_eq!(classify(&at, 0), Verdict::Candidate(Reason::LargeEnough));
        assert_eq!(classify(&at, 200 * 1024), Verdict::Rejected(Reason::NoSignal));
    }

    #[test]
    fn download_extension_without_other_signals() {
        let m = RequestMeta {
            extension: Some(".ISO"),
            ..meta()
        };
        assert_eq!(classify(&m, 0), Verdict::Candidate(Reason::DownloadExtension));
    }

    #[test]
    fn numeric_or_unknown_extension_rejected() {
        for ext in [".3", ".js", ".woff2"] {
            let m = RequestMeta {
                extension: Some(ext),
                ..meta()
            };
            assert_eq!(classify(&m, 0), Verdict::Rejected(Reason::NoSignal), "{ext}");
        }
    }
}
