//! # Stack identities and stack-summary statuses.
//!
//! A [`StackIdentity`] is the canonical identifier the orchestrator
//! assigns to a stack. User-supplied names are *not* identities; they are
//! resolved through
//! [`OrchestratorClient::describe_stack`](crate::OrchestratorClient::describe_stack)
//! before any poller is keyed on them. Nested stacks skip resolution
//! entirely: the parent event's physical resource id already *is* the
//! child identity.

use std::fmt;

/// Canonical, globally unique stack identifier.
///
/// Distinguished from display names by the `arn:` prefix. Equality is
/// byte-exact string equality; every poller and detection is keyed by
/// this type, never by a display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackIdentity(String);

impl StackIdentity {
    const PREFIX: &'static str = "arn:";

    /// Wraps a raw identifier string.
    pub fn new(raw: impl Into<String>) -> Self {
        StackIdentity(raw.into())
    }

    /// True when `s` already carries the identity prefix and needs no
    /// resolution.
    pub fn is_identity(s: &str) -> bool {
        s.starts_with(Self::PREFIX)
    }

    /// Raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StackIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Top-level status of a stack as reported by the account-wide listing.
///
/// Only the statuses the tool filters on are named; everything else is
/// carried through [`StackStatus::Other`] untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackStatus {
    CreateComplete,
    UpdateComplete,
    UpdateRollbackComplete,
    RollbackComplete,
    /// Any status the tool never filters on.
    Other(String),
}

impl StackStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::UpdateComplete => "UPDATE_COMPLETE",
            StackStatus::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            StackStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            StackStatus::Other(s) => s,
        }
    }

    /// Parses the wire representation.
    pub fn parse(s: &str) -> Self {
        match s {
            "CREATE_COMPLETE" => StackStatus::CreateComplete,
            "UPDATE_COMPLETE" => StackStatus::UpdateComplete,
            "UPDATE_ROLLBACK_COMPLETE" => StackStatus::UpdateRollbackComplete,
            "ROLLBACK_COMPLETE" => StackStatus::RollbackComplete,
            other => StackStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
