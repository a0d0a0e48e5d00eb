//! Replay of HAR entries as aggregator observations.

use crate::aggregator::{Header, Observation, RequestAggregator};
use crate::filter::FilterPolicy;
use crate::link::Link;

use super::parse::{HarEntry, HarHeader};

const SENSITIVE_HEADERS: &[&str] = &["cookie", "authorization"];

fn headers(raw: &[HarHeader], keep_sensitive: bool) -> Vec<Header> {
    raw.iter()
        .filter(|h| keep_sensitive || !SENSITIVE_HEADERS.contains(&h.name.to_ascii_lowercase().as_str()))
        .map(|h| Header::new(h.name.clone(), h.value.clone()))
        .collect()
}

/// Translate entries into phase observations.
///
/// A 3xx entry whose redirect target is the next entry's URL continues into
/// that entry as one request, so the aggregator sees the redirect hops.
/// Entries with status 0 (aborted) end in an error observation.
/// `Cookie`/`Authorization` request headers are dropped unless `allow_cookies`.
pub fn observations(entries: &[HarEntry], allow_cookies: bool) -> Vec<Observation> {
    let mut out = Vec::with_capacity(entries.len() * 4);
    let mut current: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        let continues = i > 0
            && current.is_some()
            && entries[i - 1].redirect_target() == Some(entry.request.url.as_str());

        let request_id = match (&current, continues) {
            (Some(id), true) => id.clone(),
            _ => {
                let id = format!("har-{}", i);
                out.push(Observation::Started {
                    request_id: id.clone(),
                    tab_id: 0,
                    url: entry.request.url.clone(),
                    method: entry.request.method.clone(),
                    resource_type: entry.resource_type(),
                });
                id
            }
        };

        out.push(Observation::HeadersSent {
            request_id: request_id.clone(),
            headers: headers(&entry.request.headers, allow_cookies),
        });
        out.push(Observation::HeadersReceived {
            request_id: request_id.clone(),
            url: entry.request.url.clone(),
            headers: headers(&entry.response.headers, true),
        });

        let redirects_onward = entry.redirect_target().is_some_and(|target| {
            entries
                .get(i + 1)
                .is_some_and(|next| next.request.url == target)
        });
        if redirects_onward {
            current = Some(request_id);
            continue;
        }

        out.push(if entry.response.status == 0 {
            Observation::Errored { request_id }
        } else {
            Observation::Completed { request_id }
        });
        current = None;
    }

    out
}

/// Feed `entries` through `aggregator`; returns the captured links in order.
pub fn replay(
    entries: &[HarEntry],
    aggregator: &mut RequestAggregator,
    policy: &FilterPolicy,
    allow_cookies: bool,
) -> Vec<Link> {
    observations(entries, allow_cookies)
        .into_iter()
        .filter_map(|obs| aggregator.observe(obs, policy))
        .collect()
}
