//! Captured links and their persistence.

mod kv;
mod store;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use store::{LinkStore, LINKS_KEY};

use serde::{Deserialize, Serialize};

use crate::url_model::file_extension;

/// Where a link was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkSource {
    Page,
    ContextMenu,
    #[serde(alias = "manual")]
    Network,
}

/// A download candidate.
///
/// `cookies` and `authorization` live only in memory for the duration of a
/// dispatch; [`Link::for_storage`] strips them before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    /// Extension without the dot, lowercased (`zip`), or empty when unknown.
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub selected: bool,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub captured_at: i64,
    pub source: LinkSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_ranges: Option<String>,
}

impl Link {
    /// New selected link; the file type is taken from the filename.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        filename: impl Into<String>,
        source: LinkSource,
    ) -> Self {
        let filename = filename.into();
        let file_type = file_type_of(&filename);
        Self {
            id: id.into(),
            url: url.into(),
            filename,
            size: None,
            file_type,
            selected: true,
            captured_at: now_millis(),
            source,
            content_type: None,
            referer: None,
            user_agent: None,
            cookies: None,
            authorization: None,
            accept_ranges: None,
        }
    }

    /// Copy without the sensitive request context.
    pub fn for_storage(&self) -> Link {
        Link {
            cookies: None,
            authorization: None,
            ..self.clone()
        }
    }

    /// True when the link carries request context that storage drops.
    pub fn has_sensitive_context(&self) -> bool {
        self.cookies.is_some() || self.authorization.is_some()
    }
}

/// `zip` for `Archive.ZIP`; empty when the name has no extension.
pub fn file_type_of(filename: &str) -> String {
    file_extension(filename)
        .map(|ext| ext.trim_start_matches('.').to_string())
        .unwrap_or_default()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
