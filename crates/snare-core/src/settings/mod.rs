//! User settings: capture toggles, filters, privacy switches and daemon
//! connection parameters.
//!
//! The same schema is read from `config.toml` and accepted as JSON from the
//! browser extension, so keys are camelCase in both.

mod cache;

pub use cache::{SettingsCache, SettingsProvider, StaticSettings, SETTINGS_CACHE_TTL};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection parameters for the aria2 JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaemonConfig {
    /// WebSocket URL of the RPC endpoint.
    pub url: String,
    /// Shared secret, sent as `token:<secret>`.
    pub secret: String,
    /// Connect when the host starts instead of on first call.
    pub auto_connect: bool,
    /// Base reconnect delay in milliseconds; doubles per attempt.
    #[serde(alias = "reconnectIntervalMs")]
    pub reconnect_interval: u64,
    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Per-call timeout in milliseconds.
    #[serde(alias = "requestTimeoutMs")]
    pub request_timeout: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:16888/jsonrpc".to_string(),
            secret: "GDownload_secret".to_string(),
            auto_connect: true,
            reconnect_interval: 1_000,
            max_reconnect_attempts: 10,
            request_timeout: 30_000,
        }
    }
}

impl DaemonConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval)
    }
}

/// Which captured request headers may be forwarded to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub send_user_agent: bool,
    pub send_referer: bool,
    pub send_cookies: bool,
    pub send_authorization: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            send_user_agent: true,
            send_referer: true,
            send_cookies: false,
            send_authorization: false,
        }
    }
}

/// Full settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Start DOM capture automatically when a page reports its document.
    pub auto_capture: bool,
    /// Announce newly captured links to the UI.
    pub show_notifications: bool,
    /// Dispatch network-captured links as soon as they are seen.
    pub auto_send: bool,

    /// Minimum size in bytes (0 = no floor).
    pub min_file_size: u64,
    /// Allowed extensions such as `.zip` (empty = all).
    pub file_types: Vec<String>,
    /// URL deny patterns (regex, or substring when not a valid regex).
    pub url_blacklist: Vec<String>,
    /// Domain allow patterns (empty = all domains).
    pub domain_whitelist: Vec<String>,

    #[serde(flatten)]
    pub privacy: PrivacySettings,

    #[serde(alias = "aria2Config")]
    pub daemon: DaemonConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_capture: true,
            show_notifications: true,
            auto_send: false,
            min_file_size: 0,
            file_types: Vec::new(),
            url_blacklist: Vec::new(),
            domain_whitelist: Vec::new(),
            privacy: PrivacySettings::default(),
            daemon: DaemonConfig::default(),
        }
    }
}
