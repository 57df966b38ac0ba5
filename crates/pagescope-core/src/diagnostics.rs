//! Health summary derived from a ledger snapshot.
//!
//! [`summarize`] is a pure function of the exchanges and one reading of the
//! clock. Every list in the report follows exchange creation order, so the
//! same input always serializes to the same bytes.
//!
//! The resource-type buckets are a heuristic for likely symptoms (a stuck
//! script usually means broken behaviour, a stuck stylesheet broken layout),
//! not a causal claim.

use crate::network::{NetworkExchange, Outcome};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default age after which a pending exchange counts as stuck.
pub const DEFAULT_STALE_THRESHOLD_MS: i64 = 5_000;

/// Thresholds used to bucket exchanges.
///
/// The status boundaries are policy, not protocol: the defaults treat
/// redirects (3xx) as successful but not clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPolicy {
    /// Pending exchanges older than this are stuck
    pub stale_threshold_ms: i64,
    /// Completed exchanges at or above this status are failures
    pub failure_status_min: u16,
    /// Successful exchanges below this status are also clean
    pub clean_status_max: u16,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            stale_threshold_ms: DEFAULT_STALE_THRESHOLD_MS,
            failure_status_min: 400,
            clean_status_max: 300,
        }
    }
}

/// Symptom class of a pending resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    /// Scripts: functionality is likely broken
    Script,
    /// Stylesheets: layout is likely broken
    Stylesheet,
    /// Images: imagery is likely broken
    Image,
    /// Everything else
    Other,
}

impl ResourceCategory {
    /// Classifies a browser resource type, case-insensitively.
    #[must_use]
    pub fn from_resource_type(resource_type: &str) -> Self {
        match resource_type.to_ascii_lowercase().as_str() {
            "script" => ResourceCategory::Script,
            "stylesheet" => ResourceCategory::Stylesheet,
            "image" => ResourceCategory::Image,
            _ => ResourceCategory::Other,
        }
    }
}

/// Outcome totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Completed below the failure threshold
    pub successful: usize,
    /// Subset of `successful` below the clean threshold
    pub clean: usize,
    /// Failed, or completed at or above the failure threshold
    pub failed: usize,
    /// No outcome yet
    pub pending: usize,
}

/// A pending exchange as seen at summary time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSummary {
    /// Creation index of the exchange in the snapshot
    pub index: usize,
    /// Request URL
    pub url: String,
    /// Request method
    pub method: String,
    /// Resource type as reported
    pub resource_type: String,
    /// Milliseconds since the request started
    pub age_ms: i64,
}

/// Pending exchanges grouped by symptom class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBuckets {
    /// Pending scripts
    pub script: Vec<PendingSummary>,
    /// Pending stylesheets
    pub stylesheet: Vec<PendingSummary>,
    /// Pending images
    pub image: Vec<PendingSummary>,
    /// Everything else pending
    pub other: Vec<PendingSummary>,
}

impl PendingBuckets {
    fn bucket_mut(&mut self, category: ResourceCategory) -> &mut Vec<PendingSummary> {
        match category {
            ResourceCategory::Script => &mut self.script,
            ResourceCategory::Stylesheet => &mut self.stylesheet,
            ResourceCategory::Image => &mut self.image,
            ResourceCategory::Other => &mut self.other,
        }
    }

    /// Non-empty buckets in a fixed order.
    #[must_use]
    pub fn non_empty(&self) -> Vec<(ResourceCategory, &[PendingSummary])> {
        [
            (ResourceCategory::Script, self.script.as_slice()),
            (ResourceCategory::Stylesheet, self.stylesheet.as_slice()),
            (ResourceCategory::Image, self.image.as_slice()),
            (ResourceCategory::Other, self.other.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }
}

/// Health report for one observation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    /// Outcome totals
    pub counts: StatusCounts,
    /// Pending exchanges by resource category
    pub pending_by_category: PendingBuckets,
    /// Pending exchanges older than the stale threshold
    pub stuck: Vec<PendingSummary>,
    /// Distinct hosts among pending exchanges, first-seen order
    pub pending_hosts: Vec<String>,
    /// Threshold the stuck list was computed with
    pub stale_threshold_ms: i64,
}

impl DiagnosticsReport {
    /// Total number of exchanges summarized.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.successful + self.counts.failed + self.counts.pending
    }

    /// Whether pending requests span more than one host, i.e. the stall
    /// is not isolated to a single origin.
    #[must_use]
    pub fn is_multi_host_stall(&self) -> bool {
        self.pending_hosts.len() > 1
    }

    /// Returns true when nothing failed and nothing is stuck.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.counts.failed == 0 && self.stuck.is_empty()
    }
}

/// Summarizes a snapshot.
///
/// `now` is read exactly once. Empty and all-pending input are fine and
/// produce zero-filled counts where appropriate.
pub fn summarize<F>(exchanges: &[NetworkExchange], now: F, policy: &SummaryPolicy) -> DiagnosticsReport
where
    F: Fn() -> DateTime<Utc>,
{
    let now = now();
    let mut counts = StatusCounts::default();
    let mut buckets = PendingBuckets::default();
    let mut stuck = Vec::new();
    let mut hosts = IndexSet::new();

    for (index, exchange) in exchanges.iter().enumerate() {
        match &exchange.outcome {
            Outcome::Completed { status, .. } => match status.code() {
                Some(code) if code >= policy.failure_status_min => counts.failed += 1,
                Some(code) => {
                    counts.successful += 1;
                    if code < policy.clean_status_max {
                        counts.clean += 1;
                    }
                }
                // Sentinels (a websocket that closed) are clean completions.
                None => {
                    counts.successful += 1;
                    counts.clean += 1;
                }
            },
            Outcome::Failed { .. } => counts.failed += 1,
            Outcome::Pending => {
                counts.pending += 1;

                let summary = PendingSummary {
                    index,
                    url: exchange.url.clone(),
                    method: exchange.method.clone(),
                    resource_type: exchange.request.resource_type.clone(),
                    age_ms: (now - exchange.request.started_at).num_milliseconds().max(0),
                };

                if let Some(host) = host_of(&exchange.url) {
                    hosts.insert(host);
                }
                if summary.age_ms > policy.stale_threshold_ms {
                    stuck.push(summary.clone());
                }
                buckets
                    .bucket_mut(ResourceCategory::from_resource_type(&summary.resource_type))
                    .push(summary);
            }
        }
    }

    DiagnosticsReport {
        counts,
        pending_by_category: buckets,
        stuck,
        pending_hosts: hosts.into_iter().collect(),
        stale_threshold_ms: policy.stale_threshold_ms,
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}
