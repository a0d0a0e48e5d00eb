//! `config.toml` and data paths under the XDG base directories.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{Settings, SettingsProvider};

const PREFIX: &str = "snare";

/// `~/.config/snare/config.toml`
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(PREFIX)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// `~/.local/share/snare/links.json`, the persisted link list.
pub fn link_store_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(PREFIX)?;
    Ok(xdg_dirs.place_data_file("links.json")?)
}

/// Load settings from the default location, creating the file with defaults if missing.
pub fn load_or_init() -> Result<Settings> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).context("serialize default settings")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(settings);
    }
    load_from(path)
}

pub fn load_from(path: &Path) -> Result<Settings> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse(&data).with_context(|| format!("parse {}", path.display()))
}

fn parse(data: &str) -> Result<Settings> {
    Ok(toml::from_str(data)?)
}

/// Settings provider backed by a `config.toml`; re-read on every cache refresh.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsProvider for ConfigFile {
    async fn load(&self) -> Result<Settings> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        parse(&data).with_context(|| format!("parse {}", self.path.display()))
    }
}
