//! # Tail supervision: admission, poller lifecycle, merged event stream.
//!
//! [`TailSupervisor`] follows one root stack and, transitively, every
//! nested stack activated while the root's operation runs. Each stack
//! gets exactly one poller; all pollers feed one bounded sink whose
//! receiver is handed to the caller.
//!
//! # High-level architecture
//!
//! ```text
//!   start(root) ──► resolve name ──► launch(root)
//!                                       │ admission (active set)
//!                                       ▼
//!                                 ┌────────────┐  spawn(child)
//!                                 │ StackPoller│ ───────────────┐
//!                                 └─────┬──────┘                │
//!                                  emits│            launch(child) (dedup)
//!                                       ▼                       │
//!                                 bounded sink ◄────────────────┘
//!                                       │
//!                                  events() consumer
//! ```
//!
//! Each poller owns one clone of the sink's sender; the supervisor keeps
//! none. The merged stream therefore closes exactly when the last poller
//! exits, never earlier and never twice.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::client::OrchestratorClient;
use crate::config::Config;
use crate::event::StackEvent;
use crate::exit;
use crate::poller::StackPoller;
use crate::stack::StackIdentity;

/// Follows a root stack and every nested stack it activates, merging
/// their event feeds into a single stream.
pub struct TailSupervisor {
    client: Arc<dyn OrchestratorClient>,
    cfg: Config,
}

/// State shared by one tail run: the client, the cancellation root, and
/// the set of identities currently being polled.
struct Shared {
    client: Arc<dyn OrchestratorClient>,
    cfg: Config,
    cancel: CancellationToken,
    active: Mutex<HashSet<StackIdentity>>,
}

/// Capability handed to each poller: request child pollers and deliver
/// events into the merged sink.
///
/// Holding the sender here keeps the sink accounting honest: when a
/// poller's handle drops, its sender drops with it.
#[derive(Clone)]
pub(crate) struct TailHandle {
    shared: Arc<Shared>,
    sink: mpsc::Sender<StackEvent>,
}

impl TailHandle {
    /// Requests a poller for `stack`; a no-op when one is already active.
    pub(crate) async fn spawn(&self, stack: StackIdentity) {
        Shared::launch(&self.shared, stack, self.sink.clone()).await;
    }

    /// Sends one event downstream, blocking while the sink is full.
    ///
    /// Returns `false` once the consumer is gone.
    pub(crate) async fn deliver(&self, event: StackEvent) -> bool {
        self.sink.send(event).await.is_ok()
    }
}

impl TailSupervisor {
    pub fn new(client: Arc<dyn OrchestratorClient>, cfg: Config) -> Self {
        TailSupervisor { client, cfg }
    }

    /// Resolves `root` and launches its poller; returns the merged event
    /// stream immediately.
    ///
    /// The stream yields events oldest-first per stack (streams of
    /// different stacks interleave without a global order) and closes
    /// once the root poller and every transitively spawned child have
    /// exited. A failed resolution logs the error, raises the process
    /// exit status, and closes the stream without launching anything.
    pub fn start(
        &self,
        root: impl Into<String>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StackEvent> {
        let (sink, stream) = mpsc::channel(self.cfg.sink_capacity);
        let shared = Arc::new(Shared {
            client: self.client.clone(),
            cfg: self.cfg.clone(),
            cancel,
            active: Mutex::new(HashSet::new()),
        });
        let root = root.into();

        tokio::spawn(async move {
            let root_id = if StackIdentity::is_identity(&root) {
                StackIdentity::new(root)
            } else {
                match shared.client.describe_stack(&root, &shared.cancel).await {
                    Ok(id) => id,
                    Err(e) => {
                        if !e.is_cancelled() {
                            error!(stack = %root, error = %e, "cannot resolve stack");
                            exit::raise(1);
                        }
                        return;
                    }
                }
            };
            Shared::launch(&shared, root_id, sink).await;
        });

        stream
    }
}

impl Shared {
    /// Admits `stack` into the active set and spawns its poller.
    ///
    /// Admission is the dedupe gate: check-and-insert happens atomically
    /// before the poller task exists, removal after its future completes,
    /// so at most one poller per identity is ever live. The lock is never
    /// held across I/O.
    fn launch(
        shared: &Arc<Shared>,
        stack: StackIdentity,
        sink: mpsc::Sender<StackEvent>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        let shared = shared.clone();
        Box::pin(async move {
            {
                let mut active = shared.active.lock().await;
                if !active.insert(stack.clone()) {
                    debug!(stack = %stack, "already tailing, skip");
                    return;
                }
            }

            let handle = TailHandle {
                shared: shared.clone(),
                sink,
            };
            let poller = StackPoller::new(
                stack.clone(),
                shared.client.clone(),
                handle,
                shared.cfg.tail_cadence(),
            );
            let cancel = shared.cancel.child_token();
            let shared = shared.clone();

            let task: std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> =
                Box::pin(async move {
                    poller.run(cancel).await;
                    shared.active.lock().await.remove(&stack);
                });
            tokio::spawn(task);
        })
    }
}
