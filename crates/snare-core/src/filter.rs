//! User filter policy shared by network and DOM capture.
//!
//! Compiled once from [`Settings`] so the per-request hot path never
//! re-parses patterns. Deny and allow patterns are regular expressions; a
//! pattern that does not compile is matched as a plain substring.

use regex::Regex;
use std::fmt;

use crate::settings::Settings;

#[derive(Debug, Clone)]
enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl Pattern {
    fn compile(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match Regex::new(raw) {
            Ok(re) => Pattern::Regex(re),
            Err(_) => Pattern::Literal(raw.to_string()),
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(haystack),
            Pattern::Literal(s) => haystack.contains(s.as_str()),
        }
    }
}

/// Why a candidate was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Blacklisted,
    DomainNotAllowed(String),
    FileType(String),
    TooSmall { size: u64, min: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Blacklisted => write!(f, "URL blacklisted"),
            Rejection::DomainNotAllowed(d) => write!(f, "domain not in whitelist: {}", d),
            Rejection::FileType(ext) => write!(f, "file type not allowed: {}", ext),
            Rejection::TooSmall { size, min } => write!(f, "file too small: {} < {}", size, min),
        }
    }
}

/// Compiled blacklist, whitelist, extension allow-set and size floor.
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    url_blacklist: Vec<Pattern>,
    domain_whitelist: Vec<Pattern>,
    file_types: Vec<String>,
    min_file_size: u64,
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

impl FilterPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            url_blacklist: settings
                .url_blacklist
                .iter()
                .filter_map(|p| Pattern::compile(p))
                .collect(),
            domain_whitelist: settings
                .domain_whitelist
                .iter()
                .filter_map(|p| Pattern::compile(p))
                .collect(),
            file_types: settings
                .file_types
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| normalize_extension(t))
                .collect(),
            min_file_size: settings.min_file_size,
        }
    }

    /// User-configured size floor (0 = none).
    pub fn min_file_size(&self) -> u64 {
        self.min_file_size
    }

    /// Applies the rules in order: URL blacklist, domain whitelist, extension
    /// allow-set (only when the extension is known), minimum size (only when
    /// the size is known).
    pub fn check(&self, url: &str, extension: Option<&str>, size: Option<u64>) -> Result<(), Rejection> {
        if self.url_blacklist.iter().any(|p| p.is_match(url)) {
            return Err(Rejection::Blacklisted);
        }

        if !self.domain_whitelist.is_empty() {
            let domain = url::Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();
            if !self.domain_whitelist.iter().any(|p| p.is_match(&domain)) {
                return Err(Rejection::DomainNotAllowed(domain));
            }
        }

        if !self.file_types.is_empty() {
            if let Some(ext) = extension.filter(|e| !e.is_empty()) {
                let ext = normalize_extension(ext);
                if !self.file_types.contains(&ext) {
                    return Err(Rejection::FileType(ext));
                }
            }
        }

        if self.min_file_size > 0 {
            if let Some(size) = size {
                if size < self.min_file_size {
                    return Err(Rejection::TooSmall {
                        size,
                        min: self.min_file_size,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn allows(&self, url: &str, extension: Option<&str>, size: Option<u64>) -> bool {
        match self.check(url, extension, size) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(url, "filtered: {}", reason);
                false
            }
        }
    }
}
