//! # CloudFormation-backed implementation of the orchestrator contract.
//!
//! A thin adapter over the official SDK: every call maps one-to-one onto
//! a CloudFormation API operation, failures are surfaced as
//! [`ClientError`] values, and cancellation is honored by racing the
//! in-flight request against the token (dropping the request future
//! aborts the underlying HTTP call). No retries, no logging; policy
//! belongs to the engine.

use std::future::Future;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudformation::error::{DisplayErrorContext, SdkError};
use aws_sdk_cloudformation::Client;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::client::{
    DetectionReport, DetectionState, DetectionTicket, DriftStatus, OrchestratorClient, Page,
    PageToken, ResourceSummary,
};
use crate::error::{ClientError, ClientResult};
use crate::event::{ResourceStatus, StackEvent};
use crate::stack::{StackIdentity, StackStatus};

/// Orchestrator client backed by the CloudFormation API.
pub struct CloudFormationClient {
    inner: Client,
}

impl CloudFormationClient {
    /// Builds a client from the ambient credential and region chain.
    pub async fn from_env() -> Self {
        let cfg = aws_config::load_defaults(BehaviorVersion::latest()).await;
        CloudFormationClient {
            inner: Client::new(&cfg),
        }
    }
}

/// Races an SDK call against the cancellation token.
async fn guarded<T, E>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, SdkError<E>>>,
) -> ClientResult<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = call => {
            result.map_err(|e| ClientError::api(DisplayErrorContext(e).to_string()))
        }
    }
}

fn convert_timestamp(
    ts: Option<&aws_sdk_cloudformation::primitives::DateTime>,
) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn convert_event(
    event: &aws_sdk_cloudformation::types::StackEvent,
) -> ClientResult<StackEvent> {
    let event_id = event
        .event_id()
        .ok_or(ClientError::Malformed { field: "EventId" })?;
    let stack_id = event
        .stack_id()
        .ok_or(ClientError::Malformed { field: "StackId" })?;

    Ok(StackEvent {
        event_id: event_id.to_string(),
        timestamp: convert_timestamp(event.timestamp()),
        stack_name: event.stack_name().unwrap_or_default().to_string(),
        stack_id: StackIdentity::new(stack_id),
        logical_resource_id: event.logical_resource_id().unwrap_or_default().to_string(),
        physical_resource_id: event.physical_resource_id().unwrap_or_default().to_string(),
        resource_type: event.resource_type().unwrap_or_default().to_string(),
        resource_status: event
            .resource_status()
            .map(|s| ResourceStatus::parse(s.as_str()))
            .unwrap_or(ResourceStatus::Other(String::new())),
        resource_status_reason: event.resource_status_reason().map(str::to_string),
    })
}

#[async_trait]
impl OrchestratorClient for CloudFormationClient {
    async fn describe_stack(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<StackIdentity> {
        let out = guarded(
            cancel,
            self.inner.describe_stacks().stack_name(name).send(),
        )
        .await?;
        let stack = out
            .stacks()
            .first()
            .ok_or(ClientError::Malformed { field: "Stacks" })?;
        let id = stack
            .stack_id()
            .ok_or(ClientError::Malformed { field: "StackId" })?;
        Ok(StackIdentity::new(id))
    }

    async fn event_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackEvent>> {
        let out = guarded(
            cancel,
            self.inner
                .describe_stack_events()
                .stack_name(stack.as_str())
                .set_next_token(cursor)
                .send(),
        )
        .await?;
        let items = out
            .stack_events()
            .iter()
            .map(convert_event)
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }

    async fn resource_page(
        &self,
        stack: &StackIdentity,
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<ResourceSummary>> {
        let out = guarded(
            cancel,
            self.inner
                .list_stack_resources()
                .stack_name(stack.as_str())
                .set_next_token(cursor)
                .send(),
        )
        .await?;
        let items = out
            .stack_resource_summaries()
            .iter()
            .map(|summary| ResourceSummary {
                logical_resource_id: summary.logical_resource_id().unwrap_or_default().to_string(),
                physical_resource_id: summary.physical_resource_id().map(str::to_string),
                resource_type: summary.resource_type().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }

    async fn stack_page(
        &self,
        filter: &[StackStatus],
        cursor: Option<PageToken>,
        cancel: &CancellationToken,
    ) -> ClientResult<Page<StackIdentity>> {
        let statuses = filter
            .iter()
            .map(|s| aws_sdk_cloudformation::types::StackStatus::from(s.as_str()))
            .collect();
        let out = guarded(
            cancel,
            self.inner
                .list_stacks()
                .set_stack_status_filter(Some(statuses))
                .set_next_token(cursor)
                .send(),
        )
        .await?;
        let items = out
            .stack_summaries()
            .iter()
            .map(|summary| {
                summary
                    .stack_id()
                    .map(StackIdentity::new)
                    .ok_or(ClientError::Malformed { field: "StackId" })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }

    async fn detect_drift(
        &self,
        stack: &StackIdentity,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionTicket> {
        let out = guarded(
            cancel,
            self.inner
                .detect_stack_drift()
                .stack_name(stack.as_str())
                .send(),
        )
        .await?;
        let detection_id = out.stack_drift_detection_id().ok_or(ClientError::Malformed {
            field: "StackDriftDetectionId",
        })?;
        Ok(DetectionTicket {
            stack: stack.clone(),
            detection_id: detection_id.to_string(),
        })
    }

    async fn detection_status(
        &self,
        ticket: &DetectionTicket,
        cancel: &CancellationToken,
    ) -> ClientResult<DetectionReport> {
        let out = guarded(
            cancel,
            self.inner
                .describe_stack_drift_detection_status()
                .stack_drift_detection_id(&ticket.detection_id)
                .send(),
        )
        .await?;
        let state = match out.detection_status().map(|s| s.as_str()) {
            Some("DETECTION_COMPLETE") => DetectionState::Complete,
            Some("DETECTION_FAILED") => DetectionState::Failed,
            // Unknown states are treated as still running; the next poll
            // will see the terminal one.
            _ => DetectionState::InProgress,
        };
        Ok(DetectionReport {
            state,
            drift_status: out
                .stack_drift_status()
                .map(|s| DriftStatus::parse(s.as_str())),
            drifted_resources: out
                .drifted_stack_resource_count()
                .and_then(|n| u32::try_from(n).ok()),
            reason: out.detection_status_reason().map(str::to_string),
        })
    }
}
