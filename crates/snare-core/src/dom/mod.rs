//! Link capture from page markup.
//!
//! The page reports its document once on start and then only mutations.
//! [`DomCaptureService`] scans anchors and media elements, judges them with
//! [`is_download_link`] and the filter policy, and hands each batch of new
//! links to a sink. URLs already reported are remembered, so re-observing an
//! unchanged element produces nothing.

mod document;

pub use document::{Document, DomMutation, Element};

use std::collections::HashSet;
use url::Url;

use crate::classify::is_download_link;
use crate::filter::FilterPolicy;
use crate::link::{now_millis, Link, LinkSource};
use crate::url_model::{
    file_extension, filename_from_query, filename_from_url_path, sanitize_filename,
};

/// Receives each non-empty batch of captured links.
pub type LinkSink = Box<dyn FnMut(Vec<Link>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Anchor,
    Video,
    Audio,
    Source,
}

impl Kind {
    fn prefix(self) -> &'static str {
        match self {
            Kind::Anchor => "link",
            Kind::Video => "video",
            Kind::Audio => "audio",
            Kind::Source => "source",
        }
    }

    fn url_attribute(self) -> &'static str {
        match self {
            Kind::Anchor => "href",
            _ => "src",
        }
    }

    /// `in_media`: the element sits inside a video or audio element.
    fn of(el: &Element, in_media: bool) -> Option<Kind> {
        if el.is("a") {
            Some(Kind::Anchor)
        } else if el.is("video") {
            Some(Kind::Video)
        } else if el.is("audio") {
            Some(Kind::Audio)
        } else if el.is("source") && in_media {
            Some(Kind::Source)
        } else {
            None
        }
    }
}

/// Per-document capture state.
#[derive(Default)]
pub struct DomCaptureService {
    seen: HashSet<String>,
    base: Option<Url>,
    sink: Option<LinkSink>,
    seq: u64,
}

impl DomCaptureService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink is attached; mutations are being processed.
    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    /// Scan `document` and report the initial batch to `sink`, then keep the
    /// sink for later [`observe`](Self::observe) calls.
    pub fn start(&mut self, document: &Document, policy: &FilterPolicy, sink: LinkSink) {
        self.sink = Some(sink);
        let links = self.scan(document, policy);
        tracing::debug!("dom capture started on {}: {} link(s)", document.url, links.len());
        self.emit(links);
    }

    /// Full scan without a sink; returns links not seen before.
    pub fn scan(&mut self, document: &Document, policy: &FilterPolicy) -> Vec<Link> {
        self.base = Url::parse(&document.url).ok();
        let mut links = Vec::new();
        self.walk(&document.root, false, policy, &mut links);
        links
    }

    /// Process mutations incrementally. Ignored unless started.
    /// Returns how many new links were reported.
    pub fn observe(&mut self, mutations: &[DomMutation], policy: &FilterPolicy) -> usize {
        if !self.is_active() {
            return 0;
        }
        let mut links = Vec::new();
        for mutation in mutations {
            match mutation {
                DomMutation::ChildList { added } => {
                    for el in added {
                        // A lone inserted <source> has its media parent outside the subtree.
                        self.walk(el, el.is("source"), policy, &mut links);
                    }
                }
                DomMutation::Attributes { target, attribute } => {
                    let Some(kind) = Kind::of(target, true) else {
                        continue;
                    };
                    if attribute.eq_ignore_ascii_case(kind.url_attribute()) {
                        links.extend(self.process(target, kind, policy));
                    }
                }
            }
        }
        let count = links.len();
        self.emit(links);
        count
    }

    /// Detach the sink; later mutations are ignored.
    pub fn stop(&mut self) {
        if self.sink.take().is_some() {
            tracing::debug!("dom capture stopped");
        }
    }

    /// Forget every URL reported so far.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn captured_urls(&self) -> Vec<String> {
        self.seen.iter().cloned().collect()
    }

    fn emit(&mut self, links: Vec<Link>) {
        if links.is_empty() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink(links);
        }
    }

    fn walk(&mut self, el: &Element, in_media: bool, policy: &FilterPolicy, out: &mut Vec<Link>) {
        if let Some(kind) = Kind::of(el, in_media) {
            out.extend(self.process(el, kind, policy));
        }
        let media = el.is("video") || el.is("audio");
        for child in &el.children {
            self.walk(child, media, policy, out);
        }
    }

    fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') || raw.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref()?.join(raw).ok().map(|u| u.to_string())
            }
            Err(_) => None,
        }
    }

    fn process(&mut self, el: &Element, kind: Kind, policy: &FilterPolicy) -> Option<Link> {
        let url = self.resolve(el.attr(kind.url_attribute())?)?;
        if self.seen.contains(&url) {
            return None;
        }
        if kind == Kind::Anchor && !is_download_link(&url, el.has_attr("download")) {
            return None;
        }

        let filename = sanitize_filename(
            &filename_from_query(&url)
                .or_else(|| filename_from_url_path(&url))
                .unwrap_or_else(|| format!("download_{}", now_millis())),
        );
        let extension = file_extension(&filename);
        if !policy.allows(&url, extension.as_deref(), None) {
            return None;
        }

        self.seen.insert(url.clone());
        self.seq += 1;
        let id = format!("{}_{}_{}", kind.prefix(), now_millis(), self.seq);
        Some(Link::new(id, url, filename, LinkSource::Page))
    }
}
