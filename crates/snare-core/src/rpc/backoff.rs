use std::time::Duration;

use crate::settings::DaemonConfig;

/// Exponential reconnect backoff with an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts per reconnect sequence.
    pub max_attempts: u32,
    /// Delay before the first attempt; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on a single delay.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(cfg: &DaemonConfig) -> Self {
        Self {
            max_attempts: cfg.max_reconnect_attempts,
            base_delay: cfg.reconnect_base_delay(),
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt` (0-based): `base * 2^attempt`, capped.
    /// None once the ceiling is reached.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u32 << attempt.min(16);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}
