//! # Runtime configuration.
//!
//! [`Config`] centralizes the poll cadences and the merged sink size.
//! The defaults match the orchestrator's rate expectations: event feeds
//! are polled every 2 s, drift detections every 5 s, both with up to one
//! second of uniform jitter.

use std::time::Duration;

use crate::cadence::Cadence;

/// Tuning knobs for the tail and drift engines.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base delay between event-feed polls.
    pub poll_interval: Duration,
    /// Upper bound of the uniform jitter added to each event poll delay.
    pub poll_jitter: Duration,
    /// Base delay between drift detection status polls.
    pub drift_interval: Duration,
    /// Upper bound of the uniform jitter added to each status poll delay.
    pub drift_jitter: Duration,
    /// Capacity of the merged event sink; a full sink backpressures the
    /// pollers feeding it.
    pub sink_capacity: usize,
}

impl Default for Config {
    /// Provides the default configuration:
    /// - `poll_interval = 2s`, `poll_jitter = 1s`
    /// - `drift_interval = 5s`, `drift_jitter = 1s`
    /// - `sink_capacity = 8`
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            poll_jitter: Duration::from_secs(1),
            drift_interval: Duration::from_secs(5),
            drift_jitter: Duration::from_secs(1),
            sink_capacity: 8,
        }
    }
}

impl Config {
    /// Cadence of the event-feed pollers.
    pub(crate) fn tail_cadence(&self) -> Cadence {
        Cadence::new(self.poll_interval, self.poll_jitter)
    }

    /// Cadence of the drift status poll loop.
    pub(crate) fn drift_cadence(&self) -> Cadence {
        Cadence::new(self.drift_interval, self.drift_jitter)
    }
}
