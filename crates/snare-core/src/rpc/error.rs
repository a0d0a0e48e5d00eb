use thiserror::Error;

/// Failure of an RPC call or of the connection beneath it.
///
/// `Clone` so one failed connection attempt can be reported to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("cannot connect to daemon: {0}")]
    Connect(String),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("request timeout")]
    Timeout,
    /// Error envelope from the daemon; displayed verbatim.
    #[error("{message}")]
    Remote { code: i64, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("max reconnection attempts reached ({attempts})")]
    ReconnectExhausted { attempts: u32 },
}

impl RpcError {
    /// Transport-level failure (as opposed to a daemon-reported one).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::Connect(_)
                | RpcError::ConnectionClosed
                | RpcError::Timeout
                | RpcError::ReconnectExhausted { .. }
        )
    }
}
