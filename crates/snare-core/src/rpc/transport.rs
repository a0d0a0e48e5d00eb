//! Message transport beneath the RPC client.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use super::RpcError;

/// An open connection as a pair of text-message channels.
///
/// Dropping every `outgoing` sender closes the connection; `incoming`
/// yields `None` once the peer is gone.
pub struct Channel {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<String>,
}

/// Opens connections to the daemon.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, url: &str) -> Result<Channel, RpcError>;
}

/// WebSocket connector; one reader and one writer task per connection.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    pub handshake_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, url: &str) -> Result<Channel, RpcError> {
        let (ws, _) = tokio::time::timeout(self.handshake_timeout, connect_async(url))
            .await
            .map_err(|_| RpcError::Connect(format!("timed out connecting to {}", url)))?
            .map_err(|e| RpcError::Connect(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                    tracing::warn!("websocket send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let text = match msg {
                    Ok(WsMessage::Text(text)) => text.as_str().to_owned(),
                    Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            tracing::debug!("ignoring non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(WsMessage::Close(frame)) => {
                        tracing::debug!("websocket closed by peer: {:?}", frame);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("websocket read failed: {}", e);
                        break;
                    }
                };
                if in_tx.send(text).is_err() {
                    break;
                }
            }
        });

        Ok(Channel {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}
