//! In-process stand-in for the aria2 daemon.
//!
//! Implements [`Connector`] so an `RpcClient` can talk to it without a
//! socket. Each request is recorded and answered by a responder closure;
//! a responder returning `None` leaves the call unanswered.

use async_trait::async_trait;
use serde_json::{json, Value};
use snare_core::rpc::{Channel, Connector, RpcError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

type Responder = dyn Fn(&Value) -> Option<Value> + Send + Sync;

pub struct FakeDaemon {
    opens: AtomicUsize,
    refuse: AtomicUsize,
    open_delay_ms: AtomicU64,
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<Value>>>,
    peer: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl FakeDaemon {
    /// Daemon that accepts every `aria2.addUri` and answers
    /// `aria2.getGlobalStat`; other methods get an error envelope.
    pub fn new() -> Arc<Self> {
        Self::with_responder(default_reply)
    }

    pub fn with_responder(
        responder: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            opens: AtomicUsize::new(0),
            refuse: AtomicUsize::new(0),
            open_delay_ms: AtomicU64::new(0),
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
            peer: Arc::new(Mutex::new(None)),
        })
    }

    /// Number of connections opened (including refused attempts).
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    /// Hold every handshake for `delay` before it resolves.
    pub fn delay_open(&self, delay: Duration) {
        self.open_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Send an unsolicited message to the client.
    pub fn push(&self, message: Value) {
        if let Some(tx) = self.peer.lock().unwrap().as_ref() {
            let _ = tx.send(message.to_string());
        }
    }

    /// Drop the current connection from the daemon side.
    pub fn close(&self) {
        self.peer.lock().unwrap().take();
    }
}

pub fn reply(request: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": request["id"].clone(), "result": result })
}

pub fn error_reply(request: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": request["id"].clone(),
        "error": { "code": code, "message": message }
    })
}

pub fn default_reply(request: &Value) -> Option<Value> {
    match request["method"].as_str() {
        Some("aria2.addUri") => {
            let gid = format!("gid{}", request["id"].as_str().unwrap_or("0"));
            Some(reply(request, json!(gid)))
        }
        Some("aria2.getGlobalStat") => Some(reply(
            request,
            json!({ "numActive": "0", "numWaiting": "0", "downloadSpeed": "0" }),
        )),
        _ => Some(error_reply(request, 1, "Method not found")),
    }
}

#[async_trait]
impl Connector for FakeDaemon {
    async fn open(&self, _url: &str) -> Result<Channel, RpcError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let delay = self.open_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(RpcError::Connect("connection refused".to_string()));
        }

        let (outgoing, mut from_client) = mpsc::unbounded_channel::<String>();
        let (to_client, incoming) = mpsc::unbounded_channel::<String>();
        *self.peer.lock().unwrap() = Some(to_client);

        let responder = Arc::clone(&self.responder);
        let requests = Arc::clone(&self.requests);
        let peer = Arc::clone(&self.peer);
        tokio::spawn(async move {
            while let Some(text) = from_client.recv().await {
                let Ok(request) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                requests.lock().unwrap().push(request.clone());
                if let Some(answer) = responder(&request) {
                    if let Some(tx) = peer.lock().unwrap().as_ref() {
                        let _ = tx.send(answer.to_string());
                    }
                }
            }
        });

        Ok(Channel { outgoing, incoming })
    }
}
