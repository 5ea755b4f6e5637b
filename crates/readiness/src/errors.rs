use thiserror::Error;

use chatbridge_core_types::BridgeError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("vendor bus unavailable after {attempts} polls")]
    BusUnavailable { attempts: u32 },
    #[error("readiness wait timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },
    #[error("readiness gate shut down")]
    Cancelled,
}

impl From<ReadinessError> for BridgeError {
    fn from(err: ReadinessError) -> Self {
        BridgeError::new(err.to_string())
    }
}
