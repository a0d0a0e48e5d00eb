use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::classify::{RequestMeta, ResourceType};
use crate::link::{now_millis, Link, LinkSource};
use crate::url_model::{
    derive_filename, extension_from_mime, file_extension, filename_from_query,
    filename_from_url_path, is_attachment, parse_content_disposition_filename, sanitize_filename,
};

/// One HTTP header as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Last phase observed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initiated,
    HeadersSent,
    HeadersReceived,
}

/// Accumulated state of one in-flight network request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_id: String,
    pub tab_id: i64,
    pub url: String,
    /// URL after the last redirect seen so far.
    pub final_url: String,
    pub method: String,
    pub resource_type: ResourceType,
    /// URLs left behind by redirects, oldest first.
    pub redirect_chain: Vec<String>,
    pub phase: Phase,

    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub cookies: Option<String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,

    /// MIME essence, lowercased.
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
    pub is_attachment: bool,
    pub accept_ranges: Option<String>,

    pub suggested_filename: Option<String>,
    /// With leading dot, lowercased.
    pub extension: Option<String>,

    pub created: Instant,
    pub captured_at: i64,
}

impl CapturedRequest {
    pub fn new(
        request_id: impl Into<String>,
        tab_id: i64,
        url: impl Into<String>,
        method: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        let url = url.into();
        Self {
            request_id: request_id.into(),
            tab_id,
            final_url: url.clone(),
            url,
            method: method.into(),
            resource_type,
            redirect_chain: Vec::new(),
            phase: Phase::Initiated,
            referer: None,
            user_agent: None,
            cookies: None,
            authorization: None,
            accept: None,
            content_type: None,
            content_length: None,
            content_disposition: None,
            is_attachment: false,
            accept_ranges: None,
            suggested_filename: None,
            extension: None,
            created: Instant::now(),
            captured_at: now_millis(),
        }
    }

    pub(crate) fn record_request_headers(&mut self, headers: &[Header]) {
        for h in headers {
            let value = Some(h.value.clone());
            match h.name.to_ascii_lowercase().as_str() {
                "referer" => self.referer = value,
                "user-agent" => self.user_agent = value,
                "cookie" => self.cookies = value,
                "authorization" => self.authorization = value,
                "accept" => self.accept = value,
                _ => {}
            }
        }
        self.phase = Phase::HeadersSent;
    }

    /// Response headers for `url`. A new URL means a redirect was followed.
    pub(crate) fn record_response_headers(&mut self, url: &str, headers: &[Header]) {
        if !url.is_empty() && url != self.final_url {
            let previous = std::mem::replace(&mut self.final_url, url.to_string());
            self.redirect_chain.push(previous);
        }

        for h in headers {
            let value = h.value.trim();
            match h.name.to_ascii_lowercase().as_str() {
                "content-type" => {
                    let essence = value.split(';').next().unwrap_or("").trim();
                    self.content_type =
                        (!essence.is_empty()).then(|| essence.to_ascii_lowercase());
                }
                "content-length" => self.content_length = value.parse::<u64>().ok(),
                "content-disposition" => {
                    self.is_attachment = is_attachment(value);
                    self.content_disposition = Some(value.to_string());
                }
                "accept-ranges" => self.accept_ranges = Some(value.to_string()),
                _ => {}
            }
        }

        self.suggested_filename = self
            .content_disposition
            .as_deref()
            .and_then(parse_content_disposition_filename)
            .or_else(|| filename_from_query(&self.final_url));

        self.extension = self
            .suggested_filename
            .as_deref()
            .and_then(file_extension)
            .or_else(|| {
                self.content_type
                    .as_deref()
                    .and_then(extension_from_mime)
                    .map(str::to_string)
            })
            .or_else(|| {
                filename_from_url_path(&self.final_url).and_then(|name| file_extension(&name))
            });

        self.phase = Phase::HeadersReceived;
    }

    /// Classifier input.
    pub fn meta(&self) -> RequestMeta<'_> {
        RequestMeta {
            url: &self.final_url,
            resource_type: self.resource_type,
            content_type: self.content_type.as_deref(),
            content_length: self.content_length,
            is_attachment: self.is_attachment,
            suggested_filename: self.suggested_filename.as_deref(),
            extension: self.extension.as_deref(),
        }
    }

    pub fn filename(&self) -> String {
        let name = match &self.suggested_filename {
            Some(name) => name.clone(),
            None => derive_filename(&self.final_url, None, self.content_type.as_deref()),
        };
        sanitize_filename(&name)
    }

    /// Network link for this request, carrying its request context.
    pub fn to_link(&self) -> Link {
        let id = format!("network_{}_{}", self.request_id, now_millis());
        let mut link = Link::new(id, self.final_url.clone(), self.filename(), LinkSource::Network);
        link.size = self.content_length;
        link.captured_at = self.captured_at;
        link.content_type = self.content_type.clone();
        link.referer = self.referer.clone();
        link.user_agent = self.user_agent.clone();
        link.cookies = self.cookies.clone();
        link.authorization = self.authorization.clone();
        link.accept_ranges = self.accept_ranges.clone();
        link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> CapturedRequest {
        CapturedRequest::new("1", 3, url, "GET", ResourceType::Other)
    }

    #[test]
    fn redirect_hops_accumulate() {
        let mut r = request("https://a.test/get");
        r.record_response_headers("https://b.test/tmp", &[]);
        r.record_response_headers("https://cdn.test/file.iso", &[]);
        r.record_response_headers("https://cdn.test/file.iso", &[]);
        assert_eq!(r.final_url, "https://cdn.test/file.iso");
        assert_eq!(r.redirect_chain, vec!["https://a.test/get", "https://b.test/tmp"]);
        assert_eq!(r.url, "https://a.test/get");
    }

    #[test]
    fn response_headers_parsed_leniently() {
        let mut r = request("https://a.test/dl?id=4");
        r.record_response_headers(
            "https://a.test/dl?id=4",
            &[
                Header::new("Content-Type", "Application/Octet-Stream; charset=binary"),
                Header::new("Content-Length", "not-a-number"),
                Header::new("Content-Disposition", "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"),
                Header::new("Accept-Ranges", "bytes"),
            ],
        );
        assert_eq!(r.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(r.content_length, None);
        assert!(r.is_attachment);
        assert_eq!(r.suggested_filename.as_deref(), Some("résumé.pdf"));
        assert_eq!(r.extension.as_deref(), Some(".pdf"));
        assert_eq!(r.phase, Phase::HeadersReceived);
    }

    #[test]
    fn inline_disposition_is_not_attachment() {
        let mut r = request("https://a.test/view");
        r.record_response_headers(
            "https://a.test/view",
            &[Header::new("content-disposition", "inline; filename=\"scan.pdf\"")],
        );
        assert!(!r.is_attachment);
        assert_eq!(r.suggested_filename.as_deref(), Some("scan.pdf"));
    }

    #[test]
    fn extension_falls_back_to_mime_then_path() {
        let mut r = request("https://a.test/stream");
        r.record_response_headers("https://a.test/stream", &[Header::new("Content-Type", "video/mp4")]);
        assert_eq!(r.extension.as_deref(), Some(".mp4"));

        let mut r = request("https://a.test/pkg/tool.deb");
        r.record_response_headers("https://a.test/pkg/tool.deb", &[]);
        assert_eq!(r.extension.as_deref(), Some(".deb"));
    }

    #[test]
    fn request_headers_captured_for_link() {
        let mut r = request("https://a.test/f.zip");
        r.record_request_headers(&[
            Header::new("Referer", "https://a.test/"),
            Header::new("User-Agent", "UA"),
            Header::new("Cookie", "sid=1"),
            Header::new("X-Other", "ignored"),
        ]);
        r.record_response_headers("https://a.test/f.zip", &[Header::new("Content-Length", "2048")]);
        let link = r.to_link();
        assert!(link.id.starts_with("network_1_"));
        assert_eq!(link.filename, "f.zip");
        assert_eq!(link.file_type, "zip");
        assert_eq!(link.size, Some(2048));
        assert_eq!(link.referer.as_deref(), Some("https://a.test/"));
        assert_eq!(link.cookies.as_deref(), Some("sid=1"));
        assert_eq!(link.source, LinkSource::Network);
    }
}
