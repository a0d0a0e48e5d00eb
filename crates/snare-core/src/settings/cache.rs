//! Settings cache with a short time-to-live.
//!
//! Network observations arrive in bursts, so settings are cached and only
//! reloaded from the provider when older than [`SETTINGS_CACHE_TTL`]. A change
//! notification replaces the cached value immediately.

use anyhow::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};

use super::Settings;
use crate::filter::FilterPolicy;

pub const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(5);

/// Source of the current settings (config file, extension storage, ...).
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn load(&self) -> Result<Settings>;
}

/// Provider that always returns the same settings.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub Settings);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn load(&self) -> Result<Settings> {
        Ok(self.0.clone())
    }
}

/// Cached settings plus the filter policy compiled from them.
pub struct SettingsCache<P> {
    provider: P,
    ttl: Duration,
    settings: Settings,
    policy: FilterPolicy,
    loaded_at: Option<Instant>,
}

impl<P: SettingsProvider> SettingsCache<P> {
    pub fn new(provider: P) -> Self {
        Self::with_ttl(provider, SETTINGS_CACHE_TTL)
    }

    pub fn with_ttl(provider: P, ttl: Duration) -> Self {
        let settings = Settings::default();
        let policy = FilterPolicy::from_settings(&settings);
        Self {
            provider,
            ttl,
            settings,
            policy,
            loaded_at: None,
        }
    }

    fn is_fresh(&self) -> bool {
        self.loaded_at
            .map(|at| at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Reload from the provider if the cached copy is stale.
    ///
    /// A failed load keeps the previous settings and retries after the next TTL.
    pub async fn refresh(&mut self) {
        if self.is_fresh() {
            return;
        }
        match self.provider.load().await {
            Ok(settings) => self.replace(settings),
            Err(e) => {
                tracing::warn!("settings load failed, keeping cached settings: {:#}", e);
                self.loaded_at = Some(Instant::now());
            }
        }
    }

    /// Current settings, reloading first when stale.
    pub async fn get(&mut self) -> &Settings {
        self.refresh().await;
        &self.settings
    }

    /// Current filter policy, reloading first when stale.
    pub async fn policy(&mut self) -> &FilterPolicy {
        self.refresh().await;
        &self.policy
    }

    /// Cached settings without touching the provider.
    pub fn cached(&self) -> &Settings {
        &self.settings
    }

    /// Change notification: `None` means the stored settings were removed.
    pub fn apply_change(&mut self, settings: Option<Settings>) {
        self.replace(settings.unwrap_or_default());
        tracing::debug!("settings updated, cache refreshed");
    }

    fn replace(&mut self, settings: Settings) {
        if settings != self.settings {
            self.policy = FilterPolicy::from_settings(&settings);
        }
        self.settings = settings;
        self.loaded_at = Some(Instant::now());
    }
}
