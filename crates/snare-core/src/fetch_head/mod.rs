//! HTTP HEAD probing.
//!
//! Links captured from page markup carry no size; a HEAD request through
//! libcurl fills in length, content type, disposition and range support.

mod parse;

use anyhow::{Context, Result};
use serde::Serialize;
use std::str;
use std::time::Duration;

/// Response metadata of the final hop of a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// URL after redirects.
    pub final_url: String,
    pub content_length: Option<u64>,
    /// MIME essence, lowercased.
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    /// Server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

impl ProbeResult {
    /// Filename the response would be saved under.
    pub fn filename(&self) -> String {
        crate::url_model::derive_filename(
            &self.final_url,
            self.content_disposition.as_deref(),
            self.content_type.as_deref(),
        )
    }
}

/// Performs a HEAD request, following redirects.
///
/// `headers` are raw `Name: value` lines (e.g. a captured Referer).
/// Blocking; use [`probe_async`] from async code.
pub fn probe(url: &str, headers: &[String]) -> Result<ProbeResult> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;

    if !headers.is_empty() {
        let mut list = curl::easy::List::new();
        for h in headers {
            list.append(h.trim())?;
        }
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    let final_url = easy
        .effective_url()
        .ok()
        .flatten()
        .unwrap_or(url)
        .to_string();

    let mut result = parse::parse_headers(&lines);
    result.final_url = final_url;
    Ok(result)
}

pub async fn probe_async(url: String, headers: Vec<String>) -> Result<ProbeResult> {
    tokio::task::spawn_blocking(move || probe(&url, &headers))
        .await
        .context("probe task panicked")?
}
