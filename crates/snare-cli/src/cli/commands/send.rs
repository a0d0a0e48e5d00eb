//! `snare send` – dispatch the selected links.

use anyhow::Result;
use snare_core::dispatch::dispatch;
use snare_core::rpc::RpcClient;
use snare_core::settings::Settings;

use super::{ensure_sent, open_store, print_report};

/// Sends every selected link; the ones the daemon accepted leave the list.
pub async fn run_send(cfg: &Settings) -> Result<()> {
    let mut store = open_store().await?;
    let selected = store.selected();
    anyhow::ensure!(!selected.is_empty(), "no links selected");

    let client = RpcClient::websocket(&cfg.daemon);
    let report = dispatch(&selected, &cfg.privacy, &client).await;
    client.disconnect();

    let removed = store.remove_dispatched(&report).await?;
    tracing::debug!("removed {} dispatched link(s) from the list", removed);
    print_report(&report);
    ensure_sent(&report)
}
