//! # Capability contract between the engine and the orchestrator.
//!
//! [`OrchestratorClient`] is the seam every component polls through; the
//! production implementation lives in [`crate::aws`], and the test suite
//! substitutes a scripted fake. Implementations stay policy-free: no
//! retries, no logging, and prompt abort of in-flight requests when the
//! cancellation token fires.
//!
//! Listings are paginated. The trait exposes single-page calls with an
//! opaque continuation token, and the `*Pages` wrappers turn them into
//! lazy next-page iterators so a caller can abandon a listing mid-way
//! (the event poller does exactly that once it reaches its frontier).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ClientResult;
use crate::event::StackEvent;
use crate::stack::{StackIdentity, StackStatus};

/// Opaque continuation token for paginated listings.
pub type PageToken = String;

/// One page of a paginated listing.
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Items of this page, in the orchestrator's order.
    pub items: Vec<T>,
    /// Continuation token; `None` on the final page.
    pub next: Option<PageToken>,
}

/// One row of a stack's resource listing.
#[derive(Clone, Debug)]
pub struct ResourceSummary {
    /// Resource name within the stack template.
    pub logical_resource_id: String,
    /// Backend identifier; for a nested stack this is the child identity.
    pub physical_resource_id: Option<String>,
    /// Orchestrator resource type string.
    pub resource_type: String,
}

/// Handle for an asynchronous drift detection started on one stack.
#[derive(Clone, Debug)]
pub struct DetectionTicket {
    /// Stack the detection runs against.
    pub stack: StackIdentity,
    /// Orchestrator-assigned detection id.
    pub detection_id: String,
}

/// Progress state of a drift detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionState {
    InProgress,
    Complete,
    Failed,
}

/// Aggregate drift verdict for a stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftStatus {
    InSync,
    Drifted,
    NotChecked,
    Unknown,
    /// Any verdict this build does not know about.
    Other(String),
}

impl DriftStatus {
    /// Parses the wire representation.
    pub fn parse(s: &str) -> Self {
        match s {
            "IN_SYNC" => DriftStatus::InSync,
            "DRIFTED" => DriftStatus::Drifted,
            "NOT_CHECKED" => DriftStatus::NotChecked,
            "UNKNOWN" => DriftStatus::Unknown,
            other => DriftStatus::Other(other.to_string()),
        }
    }

    /// Wire representation of the verdict.
    pub fn as_str(&self) -> &str {
        match self {
            DriftStatus::InSync => "IN_SYNC",
            DriftStatus::Drifted => "DRIFTED",
            DriftStatus::NotChecked => "NOT_CHECKED",
            DriftStatus::Unknown => "UNKNOWN",
            DriftStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a drift detection's progress.
#[derive(Clone, Debug)]
pub struct DetectionReport {
    /// Whether the detection is still running, done, or failed.
    pub state: DetectionState,
    /// Aggregate verdict; present once the detection completes.
    pub drift_status: Option<DriftStatus>,
    /// Number of resources that diverged from the template.
    pub drifted_resources: Option<u32>,
    /// Failure explanation when the detection failed.
    pub reason: Option<String>,
}

/// Capability set the engine requires from the orchestrator.
///
/// Every operation takes a cancellation token and must abort the
/// in-flight request promptly once it fires, returning
/// [`ClientError::Cancelled`](crate::ClientError::Cancelled).
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Resolves a user-supplied stack name to its canonical identity.
    async fn describe_stack(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<StackIdentity>;

    /// Fetches one newest-first page of a stack's event feed.
    async fn event_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackEvent>>;

    /// Fetches one page of a stack's resource listing.
    async fn resource_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<ResourceSummary>>;

    /// Fetches one page of the account's stacks whose status is in
    /// `filter`.
    async fn stack_page(
        &self,
        filter: &[StackStatus],
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackIdentity>>;

    /// Starts an asynchronous drift detection; returns immediately.
    async fn detect_drift(
        &self,
        stack: &StackIdentity,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionTicket>;

    /// Reports the current status of a drift detection.
    async fn detection_status(
        &self,
        ticket: &DetectionTicket,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionReport>;
}

/// Lazy pager over a stack's event feed (newest-first).
///
/// Dropping the pager mid-sequence abandons the remaining pages; no
/// request is issued for a page nobody asks for.
pub struct EventPages<'a> {
    client: &'a dyn OrchestratorClient,
    stack: &'a StackIdentity,
    cursor: Option<PageToken>,
    started: bool,
}

impl<'a> EventPages<'a> {
    /// Positions a pager at the newest end of the stack's feed.
    pub fn new(client: &'a dyn OrchestratorClient, stack: &'a StackIdentity) -> Self {
        EventPages {
            client,
            stack,
            cursor: None,
            started: false,
        }
    }

    /// Next newest-first page, or `None` once the feed is exhausted.
    pub async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<Vec<StackEvent>>> {
        if self.started && self.cursor.is_none() {
            return Ok(None);
        }
        let page = self
            .client
            .event_page(self.stack, self.cursor.take(), cancel)
            .await?;
        self.started = true;
        self.cursor = page.next;
        Ok(Some(page.items))
    }
}

/// Lazy pager over a stack's resource listing.
pub struct ResourcePages<'a> {
    client: &'a dyn OrchestratorClient,
    stack: &'a StackIdentity,
    cursor: Option<PageToken>,
    started: bool,
}

impl<'a> ResourcePages<'a> {
    /// Positions a pager at the start of the stack's resource listing.
    pub fn new(client: &'a dyn OrchestratorClient, stack: &'a StackIdentity) -> Self {
        ResourcePages {
            client,
            stack,
            cursor: None,
            started: false,
        }
    }

    /// Next page of resource summaries, or `None` once exhausted.
    pub async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<Vec<ResourceSummary>>> {
        if self.started && self.cursor.is_none() {
            return Ok(None);
        }
        let page = self
            .client
            .resource_page(self.stack, self.cursor.take(), cancel)
            .await?;
        self.started = true;
        self.cursor = page.next;
        Ok(Some(page.items))
    }
}

/// Lazy pager over the account's stack listing.
pub struct StackPages<'a> {
    client: &'a dyn OrchestratorClient,
    filter: &'a [StackStatus],
    cursor: Option<PageToken>,
    started: bool,
}

impl<'a> StackPages<'a> {
    /// Positions a pager at the start of the filtered stack listing.
    pub fn new(client: &'a dyn OrchestratorClient, filter: &'a [StackStatus]) -> Self {
        StackPages {
            client,
            filter,
            cursor: None,
            started: false,
        }
    }

    /// Next page of stack identities, or `None` once exhausted.
    pub async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<Vec<StackIdentity>>> {
        if self.started && self.cursor.is_none() {
            return Ok(None);
        }
        let page = self
            .client
            .stack_page(self.filter, self.cursor.take(), cancel)
            .await?;
        self.started = true;
        self.cursor = page.next;
        Ok(Some(page.items))
    }
}
