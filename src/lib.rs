//! # cfnvisor
//!
//! **cfnvisor** follows CloudFormation stack operations live and drives
//! drift detections to completion, across arbitrarily nested stacks.
//!
//! ## Features
//!
//! | Area | Description | Key types / traits |
//! |---|---|---|
//! | **Tailing** | Follow a stack's lifecycle events and, transitively, every nested stack activated while the operation runs. | [`TailSupervisor`], [`StackEvent`] |
//! | **Drift** | Start drift detections, poll them to a terminal status, report each stack exactly once. | [`DriftCoordinator`], [`DriftOutcome`] |
//! | **Client** | Capability contract over the orchestrator; the production client is SDK-backed, tests inject fakes. | [`OrchestratorClient`], [`CloudFormationClient`] |
//! | **Events** | Typed lifecycle events with status classification. | [`StackEvent`], [`ResourceStatus`] |
//! | **Rendering** | Colorized fixed-width event lines. | [`format_event`] |
//! | **Configuration** | Poll cadences and sink tuning. | [`Config`] |
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use cfnvisor::{CloudFormationClient, Config, TailSupervisor, format_event};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(CloudFormationClient::from_env().await);
//!     let supervisor = TailSupervisor::new(client, Config::default());
//!
//!     let mut events = supervisor.start("my-stack", CancellationToken::new());
//!     while let Some(event) = events.recv().await {
//!         println!("{}", format_event(&event));
//!     }
//! }
//! ```

mod aws;
mod cadence;
mod children;
mod client;
mod config;
mod drift;
mod error;
mod event;
pub mod exit;
mod poller;
mod render;
mod stack;
mod supervisor;

// ---- Public re-exports ----

pub use aws::CloudFormationClient;
pub use children::descendants;
pub use client::{
    DetectionReport, DetectionState, DetectionTicket, DriftStatus, EventPages,
    OrchestratorClient, Page, PageToken, ResourcePages, ResourceSummary, StackPages,
};
pub use config::Config;
pub use drift::{DriftCoordinator, DriftOutcome, DRIFT_ELIGIBLE};
pub use error::{ClientError, ClientResult};
pub use event::{ResourceStatus, StackEvent, NESTED_STACK_TYPE};
pub use render::format_event;
pub use stack::{StackIdentity, StackStatus};
pub use supervisor::TailSupervisor;
