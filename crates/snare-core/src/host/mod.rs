//! Native-messaging host: the process the browser extension talks to.
//!
//! Frames are read on a separate task so the sweep timer can fire between
//! messages without cutting a frame in half. Every request gets exactly one
//! `response` event; captured links are announced after it.
//!
//! Requests that wait on the daemon or the network (sending links, the
//! connection test, the size probe) run as jobs on their own tasks. The
//! loop keeps taking observations while they are in flight and writes their
//! responses when they finish.

mod framing;
mod messages;

pub use framing::{read_frame, write_frame, FrameError, MAX_INCOMING, MAX_OUTGOING};
pub use messages::{HostEvent, HostRequest};

use anyhow::{Context, Result};
use futures_util::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::aggregator::{RequestAggregator, SWEEP_INTERVAL};
use crate::dispatch::{dispatch, DispatchReport};
use crate::dom::{Document, DomCaptureService};
use crate::fetch_head::probe_async;
use crate::link::{now_millis, KeyValueStore, Link, LinkSource, LinkStore};
use crate::rpc::{Connector, RpcClient};
use crate::settings::{SettingsCache, SettingsProvider};
use crate::url_model::{last_path_segment, sanitize_filename};

/// Outcome of one request before it is tagged with the caller's id.
#[derive(Debug)]
struct Reply {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
}

impl Reply {
    fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn dispatched(report: &DispatchReport) -> Result<Self> {
        let error = (!report.is_success())
            .then(|| format!("{} of {} link(s) failed to send", report.failed, report.total));
        Ok(Self {
            success: report.is_success(),
            data: Some(serde_json::to_value(report)?),
            error,
        })
    }

    fn into_event(self, id: Option<u64>) -> HostEvent {
        HostEvent::Response {
            id,
            success: self.success,
            data: self.data,
            error: self.error,
        }
    }
}

/// What handling a request produced: a reply now, or work to finish later.
enum Handled {
    Reply(Reply),
    Deferred(BoxFuture<'static, Finished>),
}

impl From<Reply> for Handled {
    fn from(reply: Reply) -> Self {
        Handled::Reply(reply)
    }
}

/// Output of deferred work, applied back on the event loop.
enum Finished {
    Sent { report: DispatchReport, remove: bool },
    Reply(Result<Reply>),
}

/// Deferred work for one request. `respond` is false for auto-send, which
/// has no caller waiting.
struct Job {
    id: Option<u64>,
    respond: bool,
    work: BoxFuture<'static, Finished>,
}

pub struct Host<S, P> {
    settings: SettingsCache<P>,
    store: LinkStore<S>,
    aggregator: RequestAggregator,
    tabs: HashMap<i64, DomCaptureService>,
    dom_tx: mpsc::UnboundedSender<Vec<Link>>,
    dom_rx: mpsc::UnboundedReceiver<Vec<Link>>,
    captured: Vec<Link>,
    connector: Arc<dyn Connector>,
    rpc: RpcClient,
}

impl<S: KeyValueStore, P: SettingsProvider> Host<S, P> {
    pub async fn new(
        mut settings: SettingsCache<P>,
        store: LinkStore<S>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let rpc = RpcClient::new(&settings.get().await.daemon, Arc::clone(&connector));
        let (dom_tx, dom_rx) = mpsc::unbounded_channel();
        Self {
            settings,
            store,
            aggregator: RequestAggregator::new(),
            tabs: HashMap::new(),
            dom_tx,
            dom_rx,
            captured: Vec::new(),
            connector,
            rpc,
        }
    }

    pub fn store(&self) -> &LinkStore<S> {
        &self.store
    }

    pub fn aggregator(&self) -> &RequestAggregator {
        &self.aggregator
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Serve frames from `reader` until it reaches end of stream and every
    /// job in flight has answered.
    pub async fn run<R, W>(mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (frame_tx, mut frames) = mpsc::channel(16);
        let reader_task = tokio::spawn(read_frames(reader, frame_tx));

        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        sweep.tick().await;

        if self.settings.cached().daemon.auto_connect {
            let rpc = self.rpc.clone();
            tokio::spawn(async move {
                if let Err(e) = rpc.connect().await {
                    tracing::warn!("initial daemon connection failed: {}", e);
                }
            });
        }

        let (done_tx, mut done) = mpsc::unbounded_channel::<(Option<u64>, bool, Finished)>();
        let mut in_flight = 0usize;
        let mut input_open = true;

        tracing::info!("native messaging host started");
        loop {
            tokio::select! {
                frame = frames.recv(), if input_open => {
                    let Some(frame) = frame else {
                        input_open = false;
                        if in_flight == 0 {
                            break;
                        }
                        continue;
                    };
                    let (events, jobs) = match frame {
                        Ok(bytes) => self.receive(&bytes).await,
                        Err(e) => (vec![HostEvent::error(None, e.to_string())], Vec::new()),
                    };
                    for event in events {
                        send_event(&mut writer, event).await?;
                    }
                    for job in jobs {
                        in_flight += 1;
                        let tx = done_tx.clone();
                        tokio::spawn(async move {
                            let finished = job.work.await;
                            let _ = tx.send((job.id, job.respond, finished));
                        });
                    }
                }
                Some((id, respond, finished)) = done.recv() => {
                    in_flight -= 1;
                    if let Some(event) = self.complete(id, respond, finished).await {
                        send_event(&mut writer, event).await?;
                    }
                    if !input_open && in_flight == 0 {
                        break;
                    }
                }
                _ = sweep.tick() => {
                    self.aggregator.sweep();
                }
            }
        }

        self.rpc.disconnect();
        reader_task
            .await
            .context("frame reader task failed")?
            .context("reading native messaging input")?;
        tracing::info!("input closed, host stopping");
        Ok(())
    }

    /// Decode and handle one frame to completion, deferred work included,
    /// returning the events to send back.
    pub async fn process(&mut self, frame: &[u8]) -> Vec<HostEvent> {
        let (mut events, jobs) = self.receive(frame).await;
        for job in jobs {
            let finished = job.work.await;
            events.extend(self.complete(job.id, job.respond, finished).await);
        }
        events
    }

    /// Handle one frame. Returns the events ready now and the jobs still to run.
    async fn receive(&mut self, frame: &[u8]) -> (Vec<HostEvent>, Vec<Job>) {
        let value: Value = match serde_json::from_slice(frame) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("malformed message: {}", e);
                let event = HostEvent::error(None, format!("malformed message: {}", e));
                return (vec![event], Vec::new());
            }
        };
        let id = value.get("id").and_then(Value::as_u64);
        let request = match HostRequest::deserialize(&value) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("invalid request: {}", e);
                let event = HostEvent::error(id, format!("invalid request: {}", e));
                return (vec![event], Vec::new());
            }
        };

        let mut events = Vec::new();
        let mut jobs = Vec::new();
        match self.handle(request).await {
            Ok(Handled::Reply(reply)) => events.push(reply.into_event(id)),
            Ok(Handled::Deferred(work)) => jobs.push(Job {
                id,
                respond: true,
                work,
            }),
            Err(e) => {
                tracing::warn!("request failed: {:#}", e);
                events.push(HostEvent::error(id, format!("{:#}", e)));
            }
        }
        let (announcement, auto_send) = self.flush_captured().await;
        events.extend(announcement);
        jobs.extend(auto_send);
        (events, jobs)
    }

    /// Apply finished work and build its response, if anyone is waiting.
    async fn complete(
        &mut self,
        id: Option<u64>,
        respond: bool,
        finished: Finished,
    ) -> Option<HostEvent> {
        let reply = match finished {
            Finished::Sent { report, remove } => {
                tracing::info!(
                    "sent {} link(s): {} succeeded, {} failed",
                    report.total,
                    report.succeeded,
                    report.failed
                );
                let removed = if remove {
                    self.store.remove_dispatched(&report).await.map(|_| ())
                } else {
                    Ok(())
                };
                removed.and_then(|()| Reply::dispatched(&report))
            }
            Finished::Reply(reply) => reply,
        };
        match reply {
            Ok(reply) => respond.then(|| reply.into_event(id)),
            Err(e) => {
                tracing::warn!("request failed: {:#}", e);
                respond.then(|| HostEvent::error(id, format!("{:#}", e)))
            }
        }
    }

    async fn handle(&mut self, request: HostRequest) -> Result<Handled> {
        match request {
            request @ (HostRequest::RequestStarted { .. }
            | HostRequest::RequestHeadersSent { .. }
            | HostRequest::ResponseHeadersReceived { .. }
            | HostRequest::RequestCompleted { .. }
            | HostRequest::RequestFailed { .. }) => {
                if let Ok(observation) = request.into_observation() {
                    let policy = self.settings.policy().await;
                    if let Some(link) = self.aggregator.observe(observation, policy) {
                        self.captured.push(link);
                    }
                }
                Ok(Reply::empty().into())
            }
            HostRequest::DomStart { tab_id, document } => {
                if !self.settings.get().await.auto_capture {
                    return Ok(Reply::ok(json!({ "started": false })).into());
                }
                self.start_capture(tab_id, &document).await;
                Ok(Reply::ok(json!({ "started": true })).into())
            }
            HostRequest::DomMutations { tab_id, mutations } => {
                let policy = self.settings.policy().await;
                let captured = self
                    .tabs
                    .get_mut(&tab_id)
                    .map(|service| service.observe(&mutations, policy))
                    .unwrap_or(0);
                Ok(Reply::ok(json!({ "captured": captured })).into())
            }
            HostRequest::DomStop { tab_id } => {
                if let Some(mut service) = self.tabs.remove(&tab_id) {
                    service.stop();
                }
                Ok(Reply::empty().into())
            }
            HostRequest::CaptureAllLinks { tab_id, document } => {
                if let Some(service) = self.tabs.get_mut(&tab_id) {
                    service.stop();
                    service.clear();
                }
                self.start_capture(tab_id, &document).await;
                Ok(Reply::ok(json!({ "started": true })).into())
            }
            HostRequest::CaptureLink { url, filename } => {
                let filename = filename
                    .filter(|f| !f.trim().is_empty())
                    .or_else(|| last_path_segment(&url))
                    .map(|f| sanitize_filename(&f))
                    .unwrap_or_else(|| "download".to_string());
                let link = Link::new(
                    format!("menu_{}", now_millis()),
                    url,
                    filename,
                    LinkSource::ContextMenu,
                );
                Ok(Handled::Deferred(self.send_later(vec![link], false).await))
            }
            HostRequest::SendLinks { links } => {
                Ok(Handled::Deferred(self.send_later(links, true).await))
            }
            HostRequest::SendSelected => {
                self.store.load().await?;
                let selected = self.store.selected();
                anyhow::ensure!(!selected.is_empty(), "no links selected");
                Ok(Handled::Deferred(self.send_later(selected, true).await))
            }
            HostRequest::GetLinks => {
                self.store.load().await?;
                let links: Vec<Link> = self.store.links().iter().map(Link::for_storage).collect();
                Ok(Reply::ok(json!({
                    "links": links,
                    "selectedCount": self.store.selected_count(),
                }))
                .into())
            }
            HostRequest::ToggleLink { id } => match self.store.toggle(&id).await? {
                Some(selected) => Ok(Reply::ok(json!({ "selected": selected })).into()),
                None => anyhow::bail!("no link with id {}", id),
            },
            HostRequest::ToggleAll { selected } => {
                self.store.toggle_all(selected).await?;
                Ok(Reply::ok(json!({ "selectedCount": self.store.selected_count() })).into())
            }
            HostRequest::RemoveLink { id } => {
                anyhow::ensure!(self.store.remove(&id).await?, "no link with id {}", id);
                Ok(Reply::empty().into())
            }
            HostRequest::ClearLinks => {
                self.store.clear().await?;
                Ok(Reply::empty().into())
            }
            HostRequest::TestConnection => {
                let rpc = self.rpc.clone();
                let work = async move {
                    let reply = rpc
                        .global_stat()
                        .await
                        .map(|stat| Reply::ok(json!({ "connected": true, "globalStat": stat })))
                        .map_err(anyhow::Error::from);
                    Finished::Reply(reply)
                };
                Ok(Handled::Deferred(work.boxed()))
            }
            HostRequest::GetConnectionStatus => Ok(Reply::ok(json!({
                "connected": self.rpc.is_connected(),
                "state": self.rpc.state(),
            }))
            .into()),
            HostRequest::SettingsChanged { settings } => {
                let previous = self.settings.cached().daemon.clone();
                self.settings.apply_change(settings);
                let daemon = &self.settings.cached().daemon;
                if *daemon != previous {
                    tracing::info!("daemon settings changed, using {}", daemon.url);
                    self.rpc.disconnect();
                    self.rpc = RpcClient::new(daemon, Arc::clone(&self.connector));
                }
                Ok(Reply::empty().into())
            }
            HostRequest::ProbeSize { url } => {
                let work = async move { Finished::Reply(probe_reply(url).await) };
                Ok(Handled::Deferred(work.boxed()))
            }
        }
    }

    async fn start_capture(&mut self, tab_id: i64, document: &Document) {
        let policy = self.settings.policy().await;
        let tx = self.dom_tx.clone();
        let service = self.tabs.entry(tab_id).or_default();
        service.start(
            document,
            policy,
            Box::new(move |links| {
                let _ = tx.send(links);
            }),
        );
    }

    /// Dispatch `links` off the loop; `remove` drops the sent ones from the store.
    async fn send_later(
        &mut self,
        links: Vec<Link>,
        remove: bool,
    ) -> BoxFuture<'static, Finished> {
        let privacy = self.settings.get().await.privacy;
        let rpc = self.rpc.clone();
        async move {
            let report = dispatch(&links, &privacy, &rpc).await;
            Finished::Sent { report, remove }
        }
        .boxed()
    }

    /// Store links captured while handling the last request and build the
    /// announcement for them. With auto-send on, also returns the job that
    /// sends them.
    async fn flush_captured(&mut self) -> (Option<HostEvent>, Option<Job>) {
        let mut links = std::mem::take(&mut self.captured);
        while let Ok(batch) = self.dom_rx.try_recv() {
            links.extend(batch);
        }
        if links.is_empty() {
            return (None, None);
        }

        if let Err(e) = self.store.add_all(links.clone()).await {
            tracing::warn!("failed to store captured links: {:#}", e);
        }
        let settings = self.settings.get().await.clone();
        let announcement = settings
            .show_notifications
            .then(|| HostEvent::links_captured(&links));
        let auto_send = if settings.auto_send {
            Some(Job {
                id: None,
                respond: false,
                work: self.send_later(links, true).await,
            })
        } else {
            None
        };
        (announcement, auto_send)
    }
}

async fn probe_reply(url: String) -> Result<Reply> {
    let probe = probe_async(url, Vec::new()).await?;
    let filename = probe.filename();
    let mut data = serde_json::to_value(&probe)?;
    data["filename"] = Value::String(filename);
    Ok(Reply::ok(data))
}

async fn read_frames<R>(
    mut reader: R,
    tx: mpsc::Sender<Result<Vec<u8>, FrameError>>,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => return Ok(()),
            Err(e @ FrameError::TooLarge { .. }) => Err(e),
            Err(e) => return Err(e),
        };
        if tx.send(frame).await.is_err() {
            return Ok(());
        }
    }
}

/// Write one event. An oversized link announcement is split in halves; an
/// oversized response is replaced by an error response.
async fn send_event<W>(writer: &mut W, event: HostEvent) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut queue = vec![event];
    while let Some(event) = queue.pop() {
        let payload = serde_json::to_vec(&event)?;
        if payload.len() <= MAX_OUTGOING {
            write_frame(writer, &payload).await?;
            continue;
        }
        match event {
            HostEvent::LinksCaptured { mut links } if links.len() > 1 => {
                let tail = links.split_off(links.len() / 2);
                queue.push(HostEvent::LinksCaptured { links: tail });
                queue.push(HostEvent::LinksCaptured { links });
            }
            HostEvent::Response { id, .. } => {
                tracing::warn!("response of {} bytes is too large to send", payload.len());
                let replacement = serde_json::to_vec(&HostEvent::error(
                    id,
                    "response exceeds the native messaging size limit",
                ))?;
                write_frame(writer, &replacement).await?;
            }
            HostEvent::LinksCaptured { .. } => {
                tracing::warn!("dropping link announcement of {} bytes", payload.len());
            }
        }
    }
    Ok(())
}
