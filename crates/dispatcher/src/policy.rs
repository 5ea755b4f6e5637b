use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Consolidated dispatch timing.
///
/// `settle_delay_ms` is the vendor workaround between the context-set and
/// open commands: the bus offers no completion signal for either, and
/// opening too early races its internal async setup. It is an ordering
/// contract, not polish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// Backoff before re-checking the readiness precondition.
    pub not_ready_backoff_ms: u64,
    /// Attempt cap across the not-ready loop and emission retries.
    pub max_attempts: u32,
    /// Settle delay between context-set and open.
    pub settle_delay_ms: u64,
    /// Prefer `Launcher.open` when the launcher capability is up.
    pub open_via_launcher: bool,
}

impl DispatchPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.not_ready_backoff_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            not_ready_backoff_ms: 1000,
            max_attempts: 8,
            settle_delay_ms: 500,
            open_via_launcher: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = DispatchPolicy::default();
        assert_eq!(policy.backoff(), Duration::from_millis(1000));
        assert_eq!(policy.settle_delay(), Duration::from_millis(500));
        assert!(policy.open_via_launcher);
    }
}
