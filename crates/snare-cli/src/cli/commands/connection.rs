//! `snare test-connection` – ask the daemon for its global stats.

use anyhow::{Context, Result};
use serde_json::Value;
use snare_core::format::format_size;
use snare_core::rpc::RpcClient;
use snare_core::settings::Settings;

pub async fn run_test_connection(cfg: &Settings) -> Result<()> {
    let client = RpcClient::websocket(&cfg.daemon);
    let stat = client
        .global_stat()
        .await
        .with_context(|| format!("daemon at {} did not answer", client.url()))?;
    client.disconnect();

    println!("Connected to {}", client.url());
    let field = |key: &str| stat.get(key).and_then(Value::as_str).unwrap_or("?").to_string();
    let speed = |key: &str| {
        stat.get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .map(|b| format!("{}/s", format_size(b)))
            .unwrap_or_else(|| "?".to_string())
    };
    println!("  active:   {}", field("numActive"));
    println!("  waiting:  {}", field("numWaiting"));
    println!("  stopped:  {}", field("numStopped"));
    println!("  download: {}", speed("downloadSpeed"));
    println!("  upload:   {}", speed("uploadSpeed"));
    Ok(())
}
