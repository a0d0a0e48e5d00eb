//! Submitting selected links to the daemon.
//!
//! A batch is processed in order, one job per selected link. A failing item
//! is recorded and the batch moves on; the report says which ones made it so
//! the caller can drop exactly those from the link list.

mod names;

pub use names::FilenameAllocator;

use async_trait::async_trait;
use serde::Serialize;

use crate::link::Link;
use crate::rpc::{RpcClient, RpcError};
use crate::settings::PrivacySettings;
use crate::url_model::sanitize_filename;

/// Per-job options in aria2's `addUri` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOptions {
    /// Output filename.
    pub out: String,
    /// Raw `Name: value` request headers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<String>,
}

/// Something that accepts download jobs and returns a job id.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, url: &str, options: &JobOptions) -> Result<String, RpcError>;
}

#[async_trait]
impl JobSubmitter for RpcClient {
    async fn submit(&self, url: &str, options: &JobOptions) -> Result<String, RpcError> {
        self.add_uri(url, options).await
    }
}

/// Outcome for one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// The link as submitted, without credentials.
    pub link: Link,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub filename: String,
    pub error: String,
}

/// Ordered results of one batch plus counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FailedItem>,
    pub results: Vec<SendResult>,
}

impl DispatchReport {
    /// True only when no item failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn push(&mut self, result: SendResult) {
        self.total += 1;
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.errors.push(FailedItem {
                filename: result.link.filename.clone(),
                error: result.error.clone().unwrap_or_default(),
            });
        }
        self.results.push(result);
    }
}

/// Headers the link carries and the privacy settings allow.
pub fn request_headers(link: &Link, privacy: &PrivacySettings) -> Vec<String> {
    let candidates = [
        ("User-Agent", &link.user_agent, privacy.send_user_agent),
        ("Referer", &link.referer, privacy.send_referer),
        ("Cookie", &link.cookies, privacy.send_cookies),
        ("Authorization", &link.authorization, privacy.send_authorization),
    ];
    candidates
        .into_iter()
        .filter(|(_, _, allowed)| *allowed)
        .filter_map(|(name, value, _)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}: {}", name, v))
        })
        .collect()
}

/// Submit every selected link in order. Unselected links are skipped silently.
pub async fn dispatch<S>(links: &[Link], privacy: &PrivacySettings, submitter: &S) -> DispatchReport
where
    S: JobSubmitter + ?Sized,
{
    let mut report = DispatchReport::default();
    let mut names = FilenameAllocator::new();

    for link in links.iter().filter(|l| l.selected) {
        let out = names.allocate(&sanitize_filename(&link.filename));
        let options = JobOptions {
            out,
            header: request_headers(link, privacy),
        };

        let mut submitted = link.for_storage();
        submitted.filename = options.out.clone();

        match submitter.submit(&link.url, &options).await {
            Ok(job_id) => {
                tracing::info!("added {} (job {})", options.out, job_id);
                report.push(SendResult {
                    link: submitted,
                    success: true,
                    job_id: Some(job_id),
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!("failed to add {}: {}", link.filename, e);
                report.push(SendResult {
                    link: submitted,
                    success: false,
                    job_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    tracing::info!(
        "dispatch finished: {} succeeded, {} failed",
        report.succeeded,
        report.failed
    );
    report
}
