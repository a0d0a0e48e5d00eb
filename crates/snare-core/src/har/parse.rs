//! HAR 1.2 structures (the subset replay needs).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::classify::ResourceType;

/// Root HAR document.
#[derive(Debug, Deserialize)]
pub struct HarLog {
    pub log: HarRoot,
}

#[derive(Debug, Deserialize)]
pub struct HarRoot {
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
pub struct HarEntry {
    pub request: HarRequest,
    pub response: HarResponse,
    /// Chrome/Firefox extension field (`document`, `xhr`, `media`, ...).
    #[serde(default, rename = "_resourceType")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HarRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
pub struct HarResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default, rename = "redirectURL")]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
pub struct HarHeader {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl HarEntry {
    pub fn resource_type(&self) -> ResourceType {
        match self.resource_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("document") => ResourceType::MainFrame,
            Some("xhr") | Some("fetch") => ResourceType::XmlHttpRequest,
            Some("image") => ResourceType::Image,
            Some("media") => ResourceType::Media,
            Some("script") => ResourceType::Script,
            Some("stylesheet") => ResourceType::Stylesheet,
            Some("font") => ResourceType::Font,
            Some("websocket") => ResourceType::WebSocket,
            Some("ping") => ResourceType::Ping,
            _ => ResourceType::Other,
        }
    }

    /// Redirect target of a 3xx response (`redirectURL`, else `Location`).
    pub fn redirect_target(&self) -> Option<&str> {
        if !(300..400).contains(&self.response.status) {
            return None;
        }
        self.response
            .redirect_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| header(&self.response.headers, "Location"))
            .map(str::trim)
    }
}

pub(crate) fn header<'a>(headers: &'a [HarHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Read and parse a HAR file.
pub fn load(path: &Path) -> Result<HarLog> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read HAR file: {}", path.display()))?;
    let har: HarLog = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse HAR JSON: {}", path.display()))?;
    Ok(har)
}
