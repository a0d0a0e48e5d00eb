//! One persistent connection, calls correlated by id.
//!
//! Connection lifecycle is `Disconnected -> Connecting -> Connected`. While
//! connecting, every caller awaits the same shared attempt. A lost connection
//! rejects all pending calls; reconnecting is explicit ([`RpcClient::reconnect`]).

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

use super::envelope::{RpcRequest, RpcResponse};
use super::{Channel, Connector, ReconnectPolicy, RpcError, WebSocketConnector};
use crate::settings::DaemonConfig;

type ConnectFuture = Shared<BoxFuture<'static, Result<(), RpcError>>>;

enum ConnState {
    Disconnected,
    Connecting {
        generation: u64,
        attempt: ConnectFuture,
    },
    Connected {
        outgoing: mpsc::UnboundedSender<String>,
        generation: u64,
    },
}

/// Coarse connection state, as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct PendingCall {
    tx: oneshot::Sender<Result<Value, RpcError>>,
    created: Instant,
}

struct Inner {
    url: String,
    secret: String,
    timeout: Duration,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    next_id: AtomicU64,
    generation: AtomicU64,
    state: Mutex<ConnState>,
    pending: Mutex<HashMap<String, PendingCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// JSON-RPC client. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

impl RpcClient {
    pub fn new(config: &DaemonConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: config.url.clone(),
                secret: config.secret.clone(),
                timeout: config.request_timeout(),
                policy: ReconnectPolicy::from_config(config),
                connector,
                next_id: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                state: Mutex::new(ConnState::Disconnected),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Client over a real WebSocket.
    pub fn websocket(config: &DaemonConfig) -> Self {
        Self::new(config, Arc::new(WebSocketConnector::default()))
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        match &*lock(&self.inner.state) {
            ConnState::Disconnected => ConnectionState::Disconnected,
            ConnState::Connecting { .. } => ConnectionState::Connecting,
            ConnState::Connected { outgoing, .. } if !outgoing.is_closed() => {
                ConnectionState::Connected
            }
            ConnState::Connected { .. } => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of calls awaiting a response.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Connect unless already connected; joins an attempt already in flight.
    pub async fn connect(&self) -> Result<(), RpcError> {
        self.ensure_connected().await.map(|_| ())
    }

    /// Sender and generation of a live connection, opening one if needed.
    async fn ensure_connected(&self) -> Result<(mpsc::UnboundedSender<String>, u64), RpcError> {
        loop {
            let attempt = {
                let mut state = lock(&self.inner.state);
                match &*state {
                    ConnState::Connected {
                        outgoing,
                        generation,
                    } if !outgoing.is_closed() => {
                        return Ok((outgoing.clone(), *generation));
                    }
                    ConnState::Connecting { attempt, .. } => attempt.clone(),
                    _ => {
                        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                        let inner = Arc::clone(&self.inner);
                        let attempt: ConnectFuture =
                            Inner::open(inner, generation).boxed().shared();
                        *state = ConnState::Connecting {
                            generation,
                            attempt: attempt.clone(),
                        };
                        attempt
                    }
                }
            };
            attempt.await?;
        }
    }

    /// Call `method` with positional `params`; the secret token is prepended.
    ///
    /// Fails with [`RpcError::Timeout`] when no response arrives in time; a late
    /// response is then discarded.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let (outgoing, generation) = self.ensure_connected().await?;

        let id = (self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let request = RpcRequest::new(&id, method, &self.inner.secret, params);
        let text = serde_json::to_string(&request).map_err(|e| RpcError::Protocol(e.to_string()))?;

        let rx = self.inner.register(&id, generation)?;
        if outgoing.send(text).is_err() {
            lock(&self.inner.pending).remove(&id);
            return Err(RpcError::ConnectionClosed);
        }
        tracing::debug!(id = %id, method, "rpc call sent");

        match tokio::time::timeout(self.inner.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RpcError::ConnectionClosed),
            Err(_) => {
                if let Some(call) = lock(&self.inner.pending).remove(&id) {
                    tracing::warn!(
                        id = %id,
                        method,
                        "rpc call timed out after {:?}",
                        call.created.elapsed()
                    );
                }
                Err(RpcError::Timeout)
            }
        }
    }

    /// Close the connection and reject every pending call.
    pub fn disconnect(&self) {
        let previous = std::mem::replace(&mut *lock(&self.inner.state), ConnState::Disconnected);
        if matches!(previous, ConnState::Connected { .. }) {
            tracing::info!("disconnected from {}", self.inner.url);
        }
        drop(previous);
        self.inner.reject_all();
    }

    /// Reconnect with exponential backoff.
    ///
    /// Each sequence waits `base * 2^attempt` (capped) before every attempt and
    /// gives up after the configured ceiling with [`RpcError::ReconnectExhausted`];
    /// the next call starts a fresh sequence.
    pub async fn reconnect(&self) -> Result<(), RpcError> {
        if self.is_connected() {
            return Ok(());
        }
        let policy = self.inner.policy;
        let mut attempt = 0;
        while let Some(delay) = policy.delay(attempt) {
            tracing::info!(
                "reconnecting to {} in {:?} (attempt {}/{})",
                self.inner.url,
                delay,
                attempt + 1,
                policy.max_attempts
            );
            tokio::time::sleep(delay).await;
            match self.connect().await {
                Ok(()) => {
                    tracing::info!("reconnected to {}", self.inner.url);
                    return Ok(());
                }
                Err(e) => tracing::warn!("reconnect attempt {} failed: {}", attempt + 1, e),
            }
            attempt += 1;
        }
        Err(RpcError::ReconnectExhausted {
            attempts: policy.max_attempts,
        })
    }
}

impl Inner {
    /// Open connection `generation`. It is installed only if the state still
    /// belongs to this attempt; a disconnect in the meantime wins.
    async fn open(inner: Arc<Inner>, generation: u64) -> Result<(), RpcError> {
        let result = inner.connector.open(&inner.url).await;
        let mut state = lock(&inner.state);
        let current = matches!(
            &*state,
            ConnState::Connecting { generation: g, .. } if *g == generation
        );
        match result {
            Ok(_) if !current => {
                tracing::debug!(
                    "dropping connection to {}: disconnected while connecting",
                    inner.url
                );
                Err(RpcError::ConnectionClosed)
            }
            Ok(Channel { outgoing, incoming }) => {
                *state = ConnState::Connected {
                    outgoing,
                    generation,
                };
                drop(state);
                tokio::spawn(read_loop(Arc::downgrade(&inner), incoming, generation));
                tracing::info!("connected to {}", inner.url);
                Ok(())
            }
            Err(e) => {
                if current {
                    *state = ConnState::Disconnected;
                }
                tracing::warn!("connection to {} failed: {}", inner.url, e);
                Err(e)
            }
        }
    }

    /// Record a pending call on connection `generation`. If that connection
    /// is already gone its rejection pass may have run, so fail right away.
    fn register(
        &self,
        id: &str,
        generation: u64,
    ) -> Result<oneshot::Receiver<Result<Value, RpcError>>, RpcError> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(
            id.to_string(),
            PendingCall {
                tx,
                created: Instant::now(),
            },
        );
        if !self.is_current(generation) {
            lock(&self.pending).remove(id);
            return Err(RpcError::ConnectionClosed);
        }
        Ok(rx)
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(
            &*lock(&self.state),
            ConnState::Connected { outgoing, generation: g }
                if *g == generation && !outgoing.is_closed()
        )
    }

    fn handle_message(&self, text: &str) {
        let response: RpcResponse = match serde_json::from_str(text) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("unparseable rpc message: {}", e);
                return;
            }
        };
        let Some(id) = response.id_key() else {
            tracing::debug!(method = ?response.method, "ignoring daemon notification");
            return;
        };
        let Some(call) = lock(&self.pending).remove(&id) else {
            tracing::debug!(id = %id, "discarding response with no pending call");
            return;
        };
        let _ = call.tx.send(response.into_result());
    }

    /// Connection `generation` ended. Stale generations are ignored.
    fn handle_disconnect(&self, generation: u64) {
        {
            let mut state = lock(&self.state);
            match &*state {
                ConnState::Connected { generation: g, .. } if *g == generation => {
                    *state = ConnState::Disconnected;
                }
                _ => return,
            }
        }
        tracing::info!("connection to {} closed", self.url);
        self.reject_all();
    }

    fn reject_all(&self) {
        let drained: Vec<PendingCall> = lock(&self.pending).drain().map(|(_, c)| c).collect();
        if !drained.is_empty() {
            tracing::warn!("rejecting {} pending rpc call(s): connection closed", drained.len());
        }
        for call in drained {
            let _ = call.tx.send(Err(RpcError::ConnectionClosed));
        }
    }
}

async fn read_loop(inner: Weak<Inner>, mut incoming: mpsc::UnboundedReceiver<String>, generation: u64) {
    while let Some(text) = incoming.recv().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.handle_message(&text);
    }
    if let Some(inner) = inner.upgrade() {
        inner.handle_disconnect(generation);
    }
}
