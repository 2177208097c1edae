//! # Poll cadence with uniform jitter and cancellable sleeps.
//!
//! Every poller sleeps a jittered interval between fetches; the jitter
//! desynchronizes sibling pollers so their requests do not land on the
//! orchestrator in lockstep. Sleeps race against the cancellation token
//! and abort immediately when it fires.

use std::time::Duration;

use rand::Rng;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Repeating poll interval: a fixed base plus a uniform random jitter.
#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    /// Fixed part of the delay.
    pub base: Duration,
    /// Upper bound of the uniform jitter added on top.
    pub jitter: Duration,
}

impl Cadence {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Cadence { base, jitter }
    }

    /// Next delay: `base` plus a uniform draw from `[0, jitter)`.
    pub fn next(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let scale: f64 = rand::rng().random_range(0.0..1.0);
        self.base + self.jitter.mul_f64(scale)
    }
}

/// Sleeps for `delay`, waking early when the token fires.
///
/// Returns `false` when the sleep was interrupted by cancellation.
pub async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    let sleep = time::sleep(delay);
    tokio::pin!(sleep);
    tokio::select! {
        _ = &mut sleep => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jittered_delay_stays_in_bounds() {
        let cadence = Cadence::new(Duration::from_secs(2), Duration::from_secs(1));
        for _ in 0..100 {
            let d = cadence.next();
            assert!(d >= Duration::from_secs(2));
            assert!(d < Duration::from_secs(3));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let cadence = Cadence::new(Duration::from_secs(5), Duration::ZERO);
        assert_eq!(cadence.next(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_uncancelled() {
        let token = CancellationToken::new();
        assert!(sleep_unless_cancelled(Duration::from_secs(2), &token).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_aborts_on_cancellation() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { sleep_unless_cancelled(Duration::from_secs(60), &token).await })
        };
        token.cancel();
        assert!(!waiter.await.unwrap());
    }
}
