//! JSON-RPC client for the aria2-compatible download daemon.

mod backoff;
mod client;
mod envelope;
mod error;
mod transport;

pub use backoff::ReconnectPolicy;
pub use client::{ConnectionState, RpcClient};
pub use envelope::{RpcRequest, RpcResponse};
pub use error::RpcError;
pub use transport::{Channel, Connector, WebSocketConnector};

use serde_json::{json, Value};

use crate::dispatch::JobOptions;

impl RpcClient {
    /// `aria2.addUri`; returns the daemon's job id (gid).
    pub async fn add_uri(&self, url: &str, options: &JobOptions) -> Result<String, RpcError> {
        let options =
            serde_json::to_value(options).map_err(|e| RpcError::Protocol(e.to_string()))?;
        let result = self
            .call("aria2.addUri", vec![json!([url]), options])
            .await?;
        match result {
            Value::String(gid) => Ok(gid),
            other => Err(RpcError::Protocol(format!(
                "aria2.addUri returned {} instead of a job id",
                other
            ))),
        }
    }

    /// `aria2.getGlobalStat`, used as a connectivity check.
    pub async fn global_stat(&self) -> Result<Value, RpcError> {
        self.call("aria2.getGlobalStat", Vec::new()).await
    }
}
