use thiserror::Error;

use chatbridge_core_types::BridgeError;
use chatbridge_readiness::ReadinessError;

#[derive(Debug, Error, Clone)]
pub enum DispatchError {
    #[error("vendor bus unavailable after {attempts} polls")]
    BusUnavailable { attempts: u32 },
    #[error("integration never became ready after {attempts} attempts")]
    NeverReady { attempts: u32 },
    #[error("command emission failed: {0}")]
    CommandEmission(BridgeError),
    #[error("dispatch cancelled")]
    Cancelled,
}

impl From<ReadinessError> for DispatchError {
    fn from(err: ReadinessError) -> Self {
        match err {
            ReadinessError::BusUnavailable { attempts } => {
                DispatchError::BusUnavailable { attempts }
            }
            ReadinessError::Timeout { .. } => DispatchError::NeverReady { attempts: 0 },
            ReadinessError::Cancelled => DispatchError::Cancelled,
        }
    }
}

impl From<DispatchError> for BridgeError {
    fn from(err: DispatchError) -> Self {
        BridgeError::new(err.to_string())
    }
}
