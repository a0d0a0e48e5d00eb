//! `snare import-har <path>` – capture links from a HAR file.

use anyhow::Result;
use snare_core::aggregator::RequestAggregator;
use snare_core::dispatch::dispatch;
use snare_core::filter::FilterPolicy;
use snare_core::har;
use snare_core::rpc::RpcClient;
use snare_core::settings::Settings;
use std::path::Path;

use super::{ensure_sent, open_store, print_links, print_report};

pub async fn run_import_har(
    cfg: &Settings,
    path: &Path,
    allow_cookies: bool,
    send: bool,
) -> Result<()> {
    let har = har::load(path)?;
    let policy = FilterPolicy::from_settings(cfg);
    let mut aggregator = RequestAggregator::new();
    let links = har::replay(&har.log.entries, &mut aggregator, &policy, allow_cookies);
    tracing::info!(
        "replayed {} HAR entries from {}: {} link(s)",
        har.log.entries.len(),
        path.display(),
        links.len()
    );

    if links.is_empty() {
        println!(
            "No downloads found in {} ({} entries).",
            path.display(),
            har.log.entries.len()
        );
        return Ok(());
    }

    let mut store = open_store().await?;
    let added = store.add_all(links.clone()).await?;
    print_links(&links);
    println!("{} link(s) captured, {} new", links.len(), added);

    if !send {
        if allow_cookies && links.iter().any(|l| l.has_sensitive_context()) {
            println!("  (cookies are not stored; use --send to dispatch with them)");
        }
        return Ok(());
    }

    let client = RpcClient::websocket(&cfg.daemon);
    let report = dispatch(&links, &cfg.privacy, &client).await;
    client.disconnect();
    store.remove_dispatched(&report).await?;
    print_report(&report);
    ensure_sent(&report)
}
