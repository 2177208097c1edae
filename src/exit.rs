//! # Process-global exit status with max-write semantics.
//!
//! Components raise the exit code from wherever they detect a failure;
//! once raised to `n`, a later lower write never decreases it. The CLI
//! reads the final value just before terminating.

use std::sync::atomic::{AtomicI32, Ordering};

static STATUS: AtomicI32 = AtomicI32::new(0);

/// Raises the process exit status to `code` if it is higher than the
/// current value.
pub fn raise(code: i32) {
    STATUS.fetch_max(code, Ordering::SeqCst);
}

/// Current process exit status.
pub fn status() -> i32 {
    STATUS.load(Ordering::SeqCst)
}
