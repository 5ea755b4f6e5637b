use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing policy for the readiness gate.
///
/// The bus poll is capped rather than unbounded, and capability waits may
/// carry an optional upper bound.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Interval between polls for the vendor bus handle.
    pub poll_interval_ms: u64,
    /// Polls before the bus is declared unavailable.
    pub max_polls: u32,
    /// Upper bound on a capability wait; `None` waits indefinitely.
    pub max_wait_ms: Option<u64>,
}

impl GatePolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_polls: 60,
            max_wait_ms: None,
        }
    }
}
