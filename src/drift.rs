//! # Drift detection across one or more stacks.
//!
//! [`DriftCoordinator`] drives every requested stack through an
//! asynchronous drift detection to a terminal status. Detections are
//! started serially up front; a single loop then polls all outstanding
//! tickets per tick and drops each as it reaches a terminal state, so
//! every stack is reported exactly once.
//!
//! Transient status-poll failures are not fatal: the ticket stays
//! enqueued and is asked again on the next tick.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cadence::sleep_unless_cancelled;
use crate::children;
use crate::client::{DetectionState, DriftStatus, OrchestratorClient, StackPages};
use crate::config::Config;
use crate::error::ClientResult;
use crate::stack::{StackIdentity, StackStatus};

/// Stack statuses eligible for drift detection; stacks outside this set
/// are skipped by `--all`.
pub const DRIFT_ELIGIBLE: [StackStatus; 4] = [
    StackStatus::CreateComplete,
    StackStatus::UpdateComplete,
    StackStatus::UpdateRollbackComplete,
    StackStatus::RollbackComplete,
];

/// Final report for one stack's drift detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftOutcome {
    /// The detection finished and produced a verdict.
    Completed {
        stack: StackIdentity,
        status: DriftStatus,
        drifted: u32,
    },
    /// The detection could not be started or failed while running.
    Failed { stack: StackIdentity, reason: String },
}

impl DriftOutcome {
    /// Stack this outcome belongs to.
    pub fn stack(&self) -> &StackIdentity {
        match self {
            DriftOutcome::Completed { stack, .. } => stack,
            DriftOutcome::Failed { stack, .. } => stack,
        }
    }
}

/// Drives drift detections to their terminal status and reports each
/// stack exactly once.
pub struct DriftCoordinator {
    client: Arc<dyn OrchestratorClient>,
    cfg: Config,
}

impl DriftCoordinator {
    pub fn new(client: Arc<dyn OrchestratorClient>, cfg: Config) -> Self {
        DriftCoordinator { client, cfg }
    }

    /// Detects drift for the named stacks, optionally expanded with their
    /// nested descendants.
    ///
    /// Names are resolved to canonical identities first; duplicates
    /// (however they arise) are detected only once. A name that cannot be
    /// resolved is reported as failed without blocking the rest of the
    /// batch.
    pub async fn run(
        &self,
        names: &[String],
        recursive: bool,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<DriftOutcome>> {
        let mut stacks = Vec::with_capacity(names.len());
        let mut outcomes = Vec::new();
        for name in names {
            match self.canonical(name, cancel).await {
                Ok(id) => stacks.push(id),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(stack = %name, error = %e, "cannot resolve stack");
                    outcomes.push(DriftOutcome::Failed {
                        stack: StackIdentity::new(name.as_str()),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if recursive {
            let roots = stacks.clone();
            for root in &roots {
                stacks.extend(children::descendants(self.client.as_ref(), root, cancel).await?);
            }
        }

        let mut seen = HashSet::new();
        stacks.retain(|stack| seen.insert(stack.clone()));

        outcomes.extend(self.detect_all(stacks, cancel).await);
        Ok(outcomes)
    }

    /// Detects drift for every stack of the account that is in a
    /// drift-eligible status.
    pub async fn run_all(&self, cancel: &CancellationToken) -> ClientResult<Vec<DriftOutcome>> {
        let mut stacks = Vec::new();
        let mut pages = StackPages::new(self.client.as_ref(), &DRIFT_ELIGIBLE);
        while let Some(page) = pages.next_page(cancel).await? {
            stacks.extend(page);
        }
        Ok(self.detect_all(stacks, cancel).await)
    }

    /// Resolves a user-supplied name unless it already is an identity.
    async fn canonical(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<StackIdentity> {
        if StackIdentity::is_identity(name) {
            return Ok(StackIdentity::new(name));
        }
        self.client.describe_stack(name, cancel).await
    }

    /// Starts every detection, then polls the outstanding tickets until
    /// all have reported or cancellation fires.
    async fn detect_all(
        &self,
        stacks: Vec<StackIdentity>,
        cancel: &CancellationToken,
    ) -> Vec<DriftOutcome> {
        let mut outcomes = Vec::with_capacity(stacks.len());
        let mut pending = Vec::new();

        for stack in stacks {
            info!(stack = %stack, "starting drift detection");
            match self.client.detect_drift(&stack, cancel).await {
                Ok(ticket) => pending.push(ticket),
                Err(e) if e.is_cancelled() => return outcomes,
                Err(e) => {
                    warn!(stack = %stack, error = %e, "failed to start drift detection");
                    outcomes.push(DriftOutcome::Failed {
                        stack,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let cadence = self.cfg.drift_cadence();
        while !pending.is_empty() {
            if !sleep_unless_cancelled(cadence.next(), cancel).await {
                break;
            }

            let mut still_pending = Vec::with_capacity(pending.len());
            for ticket in pending {
                match self.client.detection_status(&ticket, cancel).await {
                    Ok(report) => match report.state {
                        DetectionState::InProgress => still_pending.push(ticket),
                        DetectionState::Complete => {
                            let status = report.drift_status.unwrap_or(DriftStatus::Unknown);
                            let drifted = report.drifted_resources.unwrap_or(0);
                            info!(
                                stack = %ticket.stack,
                                status = %status,
                                drifted,
                                "drift detection completed"
                            );
                            outcomes.push(DriftOutcome::Completed {
                                stack: ticket.stack,
                                status,
                                drifted,
                            });
                        }
                        DetectionState::Failed => {
                            let reason = report
                                .reason
                                .unwrap_or_else(|| "no reason reported".to_string());
                            warn!(
                                stack = %ticket.stack,
                                reason = %reason,
                                "drift detection failed"
                            );
                            outcomes.push(DriftOutcome::Failed {
                                stack: ticket.stack,
                                reason,
                            });
                        }
                    },
                    Err(e) if e.is_cancelled() => return outcomes,
                    Err(e) => {
                        // Transient; ask again next tick.
                        warn!(stack = %ticket.stack, error = %e, "status poll failed, will retry");
                        still_pending.push(ticket);
                    }
                }
            }
            pending = still_pending;
        }

        outcomes
    }
}
