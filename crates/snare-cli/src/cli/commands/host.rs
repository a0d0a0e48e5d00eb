//! `snare host` – native-messaging host on stdin/stdout.

use anyhow::Result;
use snare_core::config::{self, ConfigFile};
use snare_core::host::Host;
use snare_core::link::{JsonFileStore, KeyValueStore, LinkStore, MemoryStore};
use snare_core::rpc::WebSocketConnector;
use snare_core::settings::SettingsCache;
use std::sync::Arc;

/// Serves the browser extension until it closes stdin. With `ephemeral` the
/// link list lives only as long as the process.
pub async fn run_host(ephemeral: bool) -> Result<()> {
    let kv: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(config::link_store_path()?))
    };
    let store = LinkStore::open(kv).await?;
    let settings = SettingsCache::new(ConfigFile::new(config::config_path()?));

    let host = Host::new(settings, store, Arc::new(WebSocketConnector::default())).await;
    host.run(tokio::io::stdin(), tokio::io::stdout()).await
}
