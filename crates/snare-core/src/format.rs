//! Human-readable byte sizes (binary units).

use regex::Regex;
use std::sync::OnceLock;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// `0 B`, `512 B`, `1.00 KB`, `1.50 MB`, ... up to TB.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Parse `"1.5 MB"`, `"100kb"`, `"42 B"` into bytes. None when malformed.
pub fn parse_size(input: &str) -> Option<u64> {
    static SIZE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = SIZE_RE
        .get_or_init(|| Regex::new(r"(?i)^\s*([0-9]+(?:\.[0-9]+)?)\s*([KMGT]?B)?\s*$").ok())
        .as_ref()?;
    let caps = re.captures(input)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| "B".to_string());
    let exp = UNITS.iter().position(|u| *u == unit)?;
    Some((value * 1024f64.powi(exp as i32)).round() as u64)
}
