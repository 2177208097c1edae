#![allow(dead_code)]

//! Scripted in-memory orchestrator shared by the integration tests.
//!
//! Event feeds are modeled as a sequence of newest-first snapshots, one
//! per polling round: every cursor-less fetch advances the stack's feed
//! to the next snapshot (capped at the last), and cursors page within
//! the current snapshot. Drift detections replay a scripted sequence of
//! status reports, one per poll.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use cfnvisor::{
    ClientError, ClientResult, DetectionReport, DetectionState, DetectionTicket, DriftStatus,
    OrchestratorClient, Page, PageToken, ResourceStatus, ResourceSummary, StackEvent,
    StackIdentity, StackStatus, NESTED_STACK_TYPE,
};

#[derive(Default)]
struct Feed {
    snapshots: Vec<Vec<StackEvent>>,
    round: usize,
    started: bool,
    fail: bool,
}

#[derive(Default)]
struct State {
    names: HashMap<String, StackIdentity>,
    feeds: HashMap<StackIdentity, Feed>,
    resources: HashMap<StackIdentity, Vec<ResourceSummary>>,
    stacks: Vec<(StackIdentity, StackStatus)>,
    detect_failures: HashMap<StackIdentity, String>,
    detections: HashMap<StackIdentity, VecDeque<Result<DetectionReport, String>>>,
    detect_calls: Vec<StackIdentity>,
    event_page_calls: HashMap<StackIdentity, usize>,
    status_polls: usize,
}

pub struct FakeClient {
    page_size: usize,
    state: Mutex<State>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        FakeClient {
            page_size,
            state: Mutex::new(State::default()),
        }
    }

    pub fn register_name(&self, name: &str, id: &StackIdentity) {
        self.state
            .lock()
            .unwrap()
            .names
            .insert(name.to_string(), id.clone());
    }

    /// Installs the event feed for one stack: newest-first snapshots, one
    /// per polling round.
    pub fn feed(&self, id: &StackIdentity, snapshots: Vec<Vec<StackEvent>>) {
        self.state.lock().unwrap().feeds.insert(
            id.clone(),
            Feed {
                snapshots,
                ..Feed::default()
            },
        );
    }

    /// Makes every event fetch for `id` fail.
    pub fn fail_events(&self, id: &StackIdentity) {
        self.state.lock().unwrap().feeds.insert(
            id.clone(),
            Feed {
                fail: true,
                ..Feed::default()
            },
        );
    }

    pub fn resources(&self, id: &StackIdentity, resources: Vec<ResourceSummary>) {
        self.state
            .lock()
            .unwrap()
            .resources
            .insert(id.clone(), resources);
    }

    pub fn stack(&self, id: &StackIdentity, status: StackStatus) {
        self.state
            .lock()
            .unwrap()
            .stacks
            .push((id.clone(), status));
    }

    pub fn fail_detect(&self, id: &StackIdentity, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .detect_failures
            .insert(id.clone(), reason.to_string());
    }

    /// Installs the status-poll script for one stack's detection; each
    /// poll consumes one entry, `Err` entries become transient failures.
    pub fn detection_script(
        &self,
        id: &StackIdentity,
        script: Vec<Result<DetectionReport, String>>,
    ) {
        self.state
            .lock()
            .unwrap()
            .detections
            .insert(id.clone(), script.into());
    }

    pub fn event_page_calls(&self, id: &StackIdentity) -> usize {
        self.state
            .lock()
            .unwrap()
            .event_page_calls
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn detect_calls(&self) -> Vec<StackIdentity> {
        self.state.lock().unwrap().detect_calls.clone()
    }

    pub fn status_polls(&self) -> usize {
        self.state.lock().unwrap().status_polls
    }
}

#[async_trait]
impl OrchestratorClient for FakeClient {
    async fn describe_stack(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<StackIdentity> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.state
            .lock()
            .unwrap()
            .names
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::api(format!("stack not found: {name}")))
    }

    async fn event_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackEvent>> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mut state = self.state.lock().unwrap();
        *state.event_page_calls.entry(stack.clone()).or_insert(0) += 1;
        let feed = state
            .feeds
            .get_mut(stack)
            .ok_or_else(|| ClientError::api(format!("stack not found: {stack}")))?;
        if feed.fail {
            return Err(ClientError::api("service unavailable"));
        }
        if cursor.is_none() {
            if feed.started {
                feed.round = (feed.round + 1).min(feed.snapshots.len().saturating_sub(1));
            }
            feed.started = true;
        }
        let snapshot = feed.snapshots.get(feed.round).cloned().unwrap_or_default();
        let start: usize = cursor.as_deref().map_or(0, |c| c.parse().unwrap());
        let end = (start + self.page_size).min(snapshot.len());
        let next = (end < snapshot.len()).then(|| end.to_string());
        Ok(Page {
            items: snapshot[start..end].to_vec(),
            next,
        })
    }

    async fn resource_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<ResourceSummary>> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let state = self.state.lock().unwrap();
        let all = state.resources.get(stack).cloned().unwrap_or_default();
        let start: usize = cursor.as_deref().map_or(0, |c| c.parse().unwrap());
        let end = (start + self.page_size).min(all.len());
        let next = (end < all.len()).then(|| end.to_string());
        Ok(Page {
            items: all[start..end].to_vec(),
            next,
        })
    }

    async fn stack_page(
        &self,
        filter: &[StackStatus],
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackIdentity>> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let state = self.state.lock().unwrap();
        let matching: Vec<StackIdentity> = state
            .stacks
            .iter()
            .filter(|(_, status)| filter.contains(status))
            .map(|(id, _)| id.clone())
            .collect();
        let start: usize = cursor.as_deref().map_or(0, |c| c.parse().unwrap());
        let end = (start + self.page_size).min(matching.len());
        let next = (end < matching.len()).then(|| end.to_string());
        Ok(Page {
            items: matching[start..end].to_vec(),
            next,
        })
    }

    async fn detect_drift(
        &self,
        stack: &StackIdentity,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionTicket> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.detect_failures.get(stack) {
            return Err(ClientError::api(reason.clone()));
        }
        state.detect_calls.push(stack.clone());
        Ok(DetectionTicket {
            stack: stack.clone(),
            detection_id: format!("det:{stack}"),
        })
    }

    async fn detection_status(
        &self,
        ticket: &DetectionTicket,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionReport> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mut state = self.state.lock().unwrap();
        state.status_polls += 1;
        let script = state
            .detections
            .get_mut(&ticket.stack)
            .ok_or_else(|| ClientError::api("unknown detection"))?;
        match script.pop_front() {
            Some(Ok(report)) => Ok(report),
            Some(Err(message)) => Err(ClientError::api(message)),
            None => Err(ClientError::api("status script exhausted")),
        }
    }
}

// ---- Event and report constructors ----

fn base_event(id: &str, stack: &StackIdentity) -> StackEvent {
    StackEvent {
        event_id: id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        stack_name: stack.as_str().trim_start_matches("arn:").to_string(),
        stack_id: stack.clone(),
        logical_resource_id: String::new(),
        physical_resource_id: String::new(),
        resource_type: String::new(),
        resource_status: ResourceStatus::UpdateInProgress,
        resource_status_reason: None,
    }
}

/// Event for an ordinary resource inside `stack`.
pub fn resource_event(
    id: &str,
    stack: &StackIdentity,
    logical: &str,
    status: ResourceStatus,
) -> StackEvent {
    StackEvent {
        logical_resource_id: logical.to_string(),
        physical_resource_id: format!("phys-{logical}"),
        resource_type: "AWS::S3::Bucket".to_string(),
        resource_status: status,
        ..base_event(id, stack)
    }
}

/// Event the stack reports about itself; terminal statuses here end the
/// running operation.
pub fn stack_event(id: &str, stack: &StackIdentity, status: ResourceStatus) -> StackEvent {
    StackEvent {
        logical_resource_id: stack.as_str().trim_start_matches("arn:").to_string(),
        physical_resource_id: stack.as_str().to_string(),
        resource_type: NESTED_STACK_TYPE.to_string(),
        resource_status: status,
        ..base_event(id, stack)
    }
}

/// Parent-stack event marking a nested child's lifecycle transition.
pub fn nested_event(
    id: &str,
    parent: &StackIdentity,
    child: &StackIdentity,
    status: ResourceStatus,
) -> StackEvent {
    StackEvent {
        logical_resource_id: "Nested".to_string(),
        physical_resource_id: child.as_str().to_string(),
        resource_type: NESTED_STACK_TYPE.to_string(),
        resource_status: status,
        ..base_event(id, parent)
    }
}

/// Resource-listing row for a nested stack.
pub fn nested_resource(logical: &str, child: &StackIdentity) -> ResourceSummary {
    ResourceSummary {
        logical_resource_id: logical.to_string(),
        physical_resource_id: Some(child.as_str().to_string()),
        resource_type: NESTED_STACK_TYPE.to_string(),
    }
}

/// Resource-listing row for an ordinary resource.
pub fn plain_resource(logical: &str) -> ResourceSummary {
    ResourceSummary {
        logical_resource_id: logical.to_string(),
        physical_resource_id: Some(format!("phys-{logical}")),
        resource_type: "AWS::S3::Bucket".to_string(),
    }
}

pub fn complete(status: DriftStatus, drifted: u32) -> DetectionReport {
    DetectionReport {
        state: DetectionState::Complete,
        drift_status: Some(status),
        drifted_resources: Some(drifted),
        reason: None,
    }
}

pub fn in_progress() -> DetectionReport {
    DetectionReport {
        state: DetectionState::InProgress,
        drift_status: None,
        drifted_resources: None,
        reason: None,
    }
}

pub fn detection_failed(reason: &str) -> DetectionReport {
    DetectionReport {
        state: DetectionState::Failed,
        drift_status: None,
        drifted_resources: None,
        reason: Some(reason.to_string()),
    }
}
