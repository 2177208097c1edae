//! # Per-stack event poller.
//!
//! One poller runs per stack identity. It bootstraps a frontier from the
//! newest pre-existing event (the tail starts from now, not from
//! history), then repeatedly scans the newest-first feed down to that
//! frontier, forwards the fresh events oldest-first, and requests child
//! pollers for every nested-stack activation it sees along the way.
//!
//! The poller exits when the stack's own top-level operation reaches a
//! terminal status, when the feed errors out, or when cancellation
//! fires. All suspension points (the jittered sleep, each page fetch,
//! each sink send) observe the cancellation token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cadence::{sleep_unless_cancelled, Cadence};
use crate::client::{EventPages, OrchestratorClient};
use crate::error::ClientResult;
use crate::event::StackEvent;
use crate::stack::StackIdentity;
use crate::supervisor::TailHandle;

/// Newest event already delivered downstream for one stack.
///
/// Anything at or behind the frontier is suppressed; the frontier only
/// moves forward. An empty frontier (brand-new stack with no events at
/// bootstrap) suppresses nothing, so everything that appears later is
/// emitted.
#[derive(Clone, Debug, Default)]
pub(crate) struct Frontier {
    newest: Option<String>,
}

impl Frontier {
    pub(crate) fn from_newest(newest: Option<String>) -> Self {
        Frontier { newest }
    }

    /// True when scanning has caught up with the already-emitted events.
    pub(crate) fn reached(&self, event_id: &str) -> bool {
        self.newest.as_deref() == Some(event_id)
    }

    pub(crate) fn advance(&mut self, event_id: String) {
        self.newest = Some(event_id);
    }
}

/// Polls one stack's event feed and forwards fresh events downstream.
pub(crate) struct StackPoller {
    stack: StackIdentity,
    client: Arc<dyn OrchestratorClient>,
    handle: TailHandle,
    cadence: Cadence,
}

impl StackPoller {
    pub(crate) fn new(
        stack: StackIdentity,
        client: Arc<dyn OrchestratorClient>,
        handle: TailHandle,
        cadence: Cadence,
    ) -> Self {
        StackPoller {
            stack,
            client,
            handle,
            cadence,
        }
    }

    /// Runs until the stack's operation finishes, the feed errors out, or
    /// cancellation fires.
    pub(crate) async fn run(self, cancel: CancellationToken) {
        let mut frontier = match self.bootstrap(&cancel).await {
            Ok(frontier) => frontier,
            Err(e) => {
                if !e.is_cancelled() {
                    warn!(stack = %self.stack, error = %e, "failed to read initial events");
                }
                return;
            }
        };

        loop {
            if !sleep_unless_cancelled(self.cadence.next(), &cancel).await {
                return;
            }

            let fresh = match self.fetch_fresh(&frontier, &cancel).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    if !e.is_cancelled() {
                        warn!(stack = %self.stack, error = %e, "event poll failed");
                    }
                    return;
                }
            };

            // Newest-first buffer; nothing fresh means nothing to do.
            let Some(newest) = fresh.first().cloned() else {
                continue;
            };

            for event in fresh.into_iter().rev() {
                if !self.emit(event, &cancel).await {
                    return;
                }
            }

            frontier.advance(newest.event_id.clone());

            // The operation is over once the stack reports a terminal
            // status for itself (not for one of its resources).
            if newest.concerns_self() && newest.resource_status.ends_operation() {
                return;
            }
        }
    }

    /// Records the newest pre-existing event as the frontier without
    /// emitting it.
    async fn bootstrap(&self, cancel: &CancellationToken) -> ClientResult<Frontier> {
        let page = self.client.event_page(&self.stack, None, cancel).await?;
        Ok(Frontier::from_newest(
            page.items.first().map(|e| e.event_id.clone()),
        ))
    }

    /// Scans newest-first pages until the frontier, requesting child
    /// pollers for nested-stack activations seen on the way.
    ///
    /// Stopping at the frontier abandons the pager, so pages behind it
    /// are never fetched.
    async fn fetch_fresh(
        &self,
        frontier: &Frontier,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<StackEvent>> {
        let mut pages = EventPages::new(self.client.as_ref(), &self.stack);
        let mut fresh = Vec::new();
        'feed: while let Some(page) = pages.next_page(cancel).await? {
            for event in page {
                if frontier.reached(&event.event_id) {
                    break 'feed;
                }
                if let Some(child) = event.nested_child() {
                    self.handle.spawn(child).await;
                }
                fresh.push(event);
            }
        }
        Ok(fresh)
    }

    /// Delivers one event downstream; `false` when the consumer is gone
    /// or cancellation fired first.
    async fn emit(&self, event: StackEvent, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            delivered = self.handle.deliver(event) => delivered,
        }
    }
}
