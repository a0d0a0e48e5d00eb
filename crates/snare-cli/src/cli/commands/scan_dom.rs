//! `snare scan-dom <document.json>` – capture links from a page snapshot.

use anyhow::{Context, Result};
use snare_core::dom::{Document, DomCaptureService};
use snare_core::filter::FilterPolicy;
use snare_core::settings::Settings;
use std::path::Path;

use super::{open_store, print_links};

pub async fn run_scan_dom(cfg: &Settings, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let document: Document = serde_json::from_slice(&data)
        .with_context(|| format!("parse document {}", path.display()))?;

    let mut service = DomCaptureService::new();
    let links = service.scan(&document, &FilterPolicy::from_settings(cfg));
    if links.is_empty() {
        println!("No download links on {}.", document.url);
        return Ok(());
    }

    let mut store = open_store().await?;
    let added = store.add_all(links.clone()).await?;
    print_links(&links);
    println!("{} link(s) found, {} new", links.len(), added);
    Ok(())
}
