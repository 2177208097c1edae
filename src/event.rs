//! # Stack lifecycle events and resource statuses.
//!
//! [`StackEvent`] mirrors the orchestrator's append-only event record:
//! one immutable row per lifecycle transition of one resource within a
//! stack. [`ResourceStatus`] classifies the lifecycle states the engine
//! and the renderer care about; unrecognized statuses pass through as
//! [`ResourceStatus::Other`] so newer orchestrator versions degrade
//! gracefully instead of failing to parse.

use chrono::{DateTime, Utc};

use crate::stack::StackIdentity;

/// Resource type that marks a nested stack inside its parent's template.
pub const NESTED_STACK_TYPE: &str = "AWS::CloudFormation::Stack";

/// One lifecycle event emitted by the orchestrator.
#[derive(Clone, Debug)]
pub struct StackEvent {
    /// Opaque id, unique within the stack, monotonic in emission order.
    pub event_id: String,
    /// Wall-clock instant of emission.
    pub timestamp: DateTime<Utc>,
    /// Display name of the owning stack.
    pub stack_name: String,
    /// Identity of the owning stack.
    pub stack_id: StackIdentity,
    /// Resource name within the stack template.
    pub logical_resource_id: String,
    /// Backend identifier of the resource; for a nested stack this is the
    /// child's identity.
    pub physical_resource_id: String,
    /// Orchestrator resource type string.
    pub resource_type: String,
    /// Lifecycle state reported by this event.
    pub resource_status: ResourceStatus,
    /// Optional free-text explanation.
    pub resource_status_reason: Option<String>,
}

impl StackEvent {
    /// True when the event describes the stack itself rather than one of
    /// its resources; top-level operations finish on such events.
    pub fn concerns_self(&self) -> bool {
        self.physical_resource_id == self.stack_id.as_str()
    }

    /// Child identity when this event marks a nested stack entering an
    /// operation; the physical resource id is used directly, never parsed.
    pub fn nested_child(&self) -> Option<StackIdentity> {
        if self.resource_type != NESTED_STACK_TYPE || self.physical_resource_id.is_empty() {
            return None;
        }
        match self.resource_status {
            ResourceStatus::CreateInProgress
            | ResourceStatus::UpdateInProgress
            | ResourceStatus::DeleteInProgress => {
                Some(StackIdentity::new(self.physical_resource_id.clone()))
            }
            _ => None,
        }
    }
}

/// Lifecycle state of a resource or stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateFailed,
    UpdateComplete,
    UpdateCompleteCleanupInProgress,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    /// Any status this build does not know about.
    Other(String),
}

impl ResourceStatus {
    /// Parses the wire representation.
    pub fn parse(s: &str) -> Self {
        match s {
            "CREATE_IN_PROGRESS" => ResourceStatus::CreateInProgress,
            "CREATE_FAILED" => ResourceStatus::CreateFailed,
            "CREATE_COMPLETE" => ResourceStatus::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => ResourceStatus::RollbackInProgress,
            "ROLLBACK_FAILED" => ResourceStatus::RollbackFailed,
            "ROLLBACK_COMPLETE" => ResourceStatus::RollbackComplete,
            "DELETE_IN_PROGRESS" => ResourceStatus::DeleteInProgress,
            "DELETE_FAILED" => ResourceStatus::DeleteFailed,
            "DELETE_COMPLETE" => ResourceStatus::DeleteComplete,
            "UPDATE_IN_PROGRESS" => ResourceStatus::UpdateInProgress,
            "UPDATE_FAILED" => ResourceStatus::UpdateFailed,
            "UPDATE_COMPLETE" => ResourceStatus::UpdateComplete,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => {
                ResourceStatus::UpdateCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_IN_PROGRESS" => ResourceStatus::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => ResourceStatus::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                ResourceStatus::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => ResourceStatus::UpdateRollbackComplete,
            other => ResourceStatus::Other(other.to_string()),
        }
    }

    /// Wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            ResourceStatus::CreateFailed => "CREATE_FAILED",
            ResourceStatus::CreateComplete => "CREATE_COMPLETE",
            ResourceStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            ResourceStatus::RollbackFailed => "ROLLBACK_FAILED",
            ResourceStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            ResourceStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            ResourceStatus::DeleteFailed => "DELETE_FAILED",
            ResourceStatus::DeleteComplete => "DELETE_COMPLETE",
            ResourceStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            ResourceStatus::UpdateFailed => "UPDATE_FAILED",
            ResourceStatus::UpdateComplete => "UPDATE_COMPLETE",
            ResourceStatus::UpdateCompleteCleanupInProgress => {
                "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            ResourceStatus::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            ResourceStatus::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            ResourceStatus::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            ResourceStatus::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            ResourceStatus::Other(s) => s,
        }
    }

    /// True for the statuses that finish the running top-level operation
    /// when reported for the stack itself.
    ///
    /// `UPDATE_FAILED` is deliberately absent: an update that fails on a
    /// resource rolls back, and the tail follows the rollback to its end.
    pub fn ends_operation(&self) -> bool {
        matches!(
            self,
            ResourceStatus::CreateFailed
                | ResourceStatus::CreateComplete
                | ResourceStatus::RollbackFailed
                | ResourceStatus::RollbackComplete
                | ResourceStatus::DeleteFailed
                | ResourceStatus::DeleteComplete
                | ResourceStatus::UpdateComplete
                | ResourceStatus::UpdateRollbackFailed
                | ResourceStatus::UpdateRollbackComplete
        )
    }

    /// True for transitional statuses (rendered dim).
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            ResourceStatus::CreateInProgress
                | ResourceStatus::DeleteInProgress
                | ResourceStatus::UpdateInProgress
                | ResourceStatus::RollbackInProgress
                | ResourceStatus::UpdateCompleteCleanupInProgress
                | ResourceStatus::UpdateRollbackInProgress
                | ResourceStatus::UpdateRollbackCompleteCleanupInProgress
        )
    }

    /// True for successful terminal statuses (rendered green).
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            ResourceStatus::CreateComplete
                | ResourceStatus::UpdateComplete
                | ResourceStatus::UpdateRollbackComplete
                | ResourceStatus::RollbackComplete
                | ResourceStatus::DeleteComplete
        )
    }

    /// True for failed terminal statuses (rendered red).
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            ResourceStatus::CreateFailed
                | ResourceStatus::DeleteFailed
                | ResourceStatus::RollbackFailed
                | ResourceStatus::UpdateFailed
                | ResourceStatus::UpdateRollbackFailed
        )
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
