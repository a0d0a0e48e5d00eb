//! The persisted link list.
//!
//! The list is shared with other writers (the browser UI, another host
//! instance), so every mutation re-reads the stored record first. The record
//! carries a version stamp; when it moved since our last read the stored list
//! is adopted before the mutation is applied, and every save bumps it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{KeyValueStore, Link};
use crate::dispatch::DispatchReport;

pub const LINKS_KEY: &str = "snare_links";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LinkRecord {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    links: Vec<Link>,
}

/// In-memory link list backed by a [`KeyValueStore`].
pub struct LinkStore<S> {
    kv: S,
    links: Vec<Link>,
    version: u64,
}

impl<S: KeyValueStore> LinkStore<S> {
    /// Open the store and load the persisted list.
    pub async fn open(kv: S) -> Result<Self> {
        let mut store = Self {
            kv,
            links: Vec::new(),
            version: 0,
        };
        store.load().await?;
        Ok(store)
    }

    /// Reload from storage, keeping in-memory request context for URLs still present.
    pub async fn load(&mut self) -> Result<()> {
        let record = self.fetch().await?;
        self.adopt(record);
        Ok(())
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn get(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn selected(&self) -> Vec<Link> {
        self.links.iter().filter(|l| l.selected).cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.links.iter().filter(|l| l.selected).count()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Add or merge one link. See [`LinkStore::add_all`].
    pub async fn add(&mut self, link: Link) -> Result<bool> {
        Ok(self.add_all(vec![link]).await? == 1)
    }

    /// Add links, merging by URL: a known URL takes the new metadata but keeps
    /// its id and `selected` flag. Returns how many URLs were new.
    pub async fn add_all(&mut self, incoming: Vec<Link>) -> Result<usize> {
        if incoming.is_empty() {
            return Ok(0);
        }
        self.update(move |links| {
            let mut added = 0;
            for link in incoming {
                match links.iter_mut().find(|l| l.url == link.url) {
                    Some(existing) => {
                        let selected = existing.selected;
                        let id = std::mem::take(&mut existing.id);
                        *existing = Link { id, selected, ..link };
                    }
                    None => {
                        links.push(link);
                        added += 1;
                    }
                }
            }
            added
        })
        .await
    }

    /// Flip one link's `selected` flag. Returns the new value, or None for an unknown id.
    pub async fn toggle(&mut self, id: &str) -> Result<Option<bool>> {
        self.update(|links| {
            links.iter_mut().find(|l| l.id == id).map(|l| {
                l.selected = !l.selected;
                l.selected
            })
        })
        .await
    }

    pub async fn toggle_all(&mut self, selected: bool) -> Result<()> {
        self.update(|links| links.iter_mut().for_each(|l| l.selected = selected))
            .await
    }

    /// Returns false for an unknown id.
    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        self.update(|links| {
            let before = links.len();
            links.retain(|l| l.id != id);
            links.len() != before
        })
        .await
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.update(|links| links.clear()).await
    }

    /// Drop the links that were dispatched successfully; failed ones stay for retry.
    pub async fn remove_dispatched(&mut self, report: &DispatchReport) -> Result<usize> {
        let done: HashSet<&str> = report
            .results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.link.id.as_str())
            .collect();
        if done.is_empty() {
            return Ok(0);
        }
        self.update(|links| {
            let before = links.len();
            links.retain(|l| !done.contains(l.id.as_str()));
            before - links.len()
        })
        .await
    }

    async fn fetch(&self) -> Result<LinkRecord> {
        match self.kv.get(LINKS_KEY).await? {
            None => Ok(LinkRecord::default()),
            // Older records are a bare array.
            Some(serde_json::Value::Array(items)) => Ok(LinkRecord {
                version: 0,
                links: serde_json::from_value(serde_json::Value::Array(items))
                    .context("decode stored links")?,
            }),
            Some(value) => serde_json::from_value(value).context("decode stored links"),
        }
    }

    fn adopt(&mut self, record: LinkRecord) {
        let mut links = record.links;
        for link in &mut links {
            if let Some(mem) = self.links.iter().find(|m| m.url == link.url) {
                link.cookies = link.cookies.take().or_else(|| mem.cookies.clone());
                link.authorization = link
                    .authorization
                    .take()
                    .or_else(|| mem.authorization.clone());
            }
        }
        self.links = links;
        self.version = record.version;
    }

    /// Read-merge-write: re-fetch, adopt a newer stored list, apply `mutate`, save with version + 1.
    async fn update<R>(&mut self, mutate: impl FnOnce(&mut Vec<Link>) -> R) -> Result<R> {
        let stored = self.fetch().await?;
        if stored.version != self.version {
            tracing::debug!(
                "link list changed in storage (v{} -> v{}), merging",
                self.version,
                stored.version
            );
            self.adopt(stored);
        }

        let mut next = self.links.clone();
        let out = mutate(&mut next);

        let record = LinkRecord {
            version: self.version + 1,
            links: next.iter().map(Link::for_storage).collect(),
        };
        self.kv
            .set(LINKS_KEY, serde_json::to_value(&record)?)
            .await
            .context("save link list")?;

        self.links = next;
        self.version = record.version;
        Ok(out)
    }
}
