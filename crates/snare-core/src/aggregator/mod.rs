//! Network request aggregation.
//!
//! The browser reports each request in phases (start, request headers,
//! response headers, completion or error). Observations are folded into one
//! [`CapturedRequest`] per request id; on completion the request is
//! classified, filtered, and possibly turned into a [`Link`]. Every operation
//! is a single hash-map access.

mod request;

pub use request::{CapturedRequest, Header, Phase};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::classify::{classify, ResourceType, Verdict};
use crate::filter::FilterPolicy;
use crate::link::Link;

/// Entries older than this are dropped by [`RequestAggregator::sweep`].
pub const MAX_REQUEST_AGE: Duration = Duration::from_secs(300);

/// How often the host runs the sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One phase of a network request.
#[derive(Debug, Clone)]
pub enum Observation {
    Started {
        request_id: String,
        tab_id: i64,
        url: String,
        method: String,
        resource_type: ResourceType,
    },
    HeadersSent {
        request_id: String,
        headers: Vec<Header>,
    },
    HeadersReceived {
        request_id: String,
        url: String,
        headers: Vec<Header>,
    },
    Completed {
        request_id: String,
    },
    Errored {
        request_id: String,
    },
}

/// Table of in-flight requests keyed by browser request id.
#[derive(Debug)]
pub struct RequestAggregator {
    requests: HashMap<String, CapturedRequest>,
    max_age: Duration,
}

impl Default for RequestAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestAggregator {
    pub fn new() -> Self {
        Self::with_max_age(MAX_REQUEST_AGE)
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            requests: HashMap::new(),
            max_age,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn get(&self, request_id: &str) -> Option<&CapturedRequest> {
        self.requests.get(request_id)
    }

    /// Fold one observation into the table. Returns a link when a completed
    /// request is a download candidate that passes `policy`.
    ///
    /// Observations for unknown request ids are ignored.
    pub fn observe(&mut self, observation: Observation, policy: &FilterPolicy) -> Option<Link> {
        match observation {
            Observation::Started {
                request_id,
                tab_id,
                url,
                method,
                resource_type,
            } => {
                if tab_id < 0 {
                    return None;
                }
                if ["blob:", "data:", "magnet:"].iter().any(|s| url.starts_with(s)) {
                    let preview: String = url.chars().take(50).collect();
                    tracing::debug!("special scheme request: {}", preview);
                }
                let request =
                    CapturedRequest::new(request_id.clone(), tab_id, url, method, resource_type);
                self.requests.insert(request_id, request);
                None
            }
            Observation::HeadersSent {
                request_id,
                headers,
            } => {
                if let Some(r) = self.requests.get_mut(&request_id) {
                    r.record_request_headers(&headers);
                }
                None
            }
            Observation::HeadersReceived {
                request_id,
                url,
                headers,
            } => {
                if let Some(r) = self.requests.get_mut(&request_id) {
                    r.record_response_headers(&url, &headers);
                }
                None
            }
            Observation::Completed { request_id } => {
                let request = self.requests.remove(&request_id)?;
                finalize(&request, policy)
            }
            Observation::Errored { request_id } => {
                self.requests.remove(&request_id);
                None
            }
        }
    }

    /// Drop entries older than the max age. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.requests.len();
        let max_age = self.max_age;
        self.requests
            .retain(|_, r| now.saturating_duration_since(r.created) <= max_age);
        let dropped = before - self.requests.len();
        if dropped > 0 {
            tracing::debug!("swept {} stale request(s), {} left", dropped, self.requests.len());
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

fn finalize(request: &CapturedRequest, policy: &FilterPolicy) -> Option<Link> {
    let verdict = classify(&request.meta(), policy.min_file_size());
    if let Verdict::Rejected(reason) = verdict {
        tracing::trace!(url = %request.final_url, ?reason, "not a download");
        return None;
    }
    if !policy.allows(
        &request.final_url,
        request.extension.as_deref(),
        request.content_length,
    ) {
        return None;
    }
    let link = request.to_link();
    tracing::info!(
        reason = ?verdict.reason(),
        "captured {} ({})",
        link.filename,
        link.url
    );
    Some(link)
}
