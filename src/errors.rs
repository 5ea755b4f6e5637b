use thiserror::Error;

use chatbridge_core_types::BridgeError;
use chatbridge_dispatcher::DispatchError;
use chatbridge_readiness::ReadinessError;

/// Top-level error for the facade and CLI.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("readiness: {0}")]
    Readiness(#[from] ReadinessError),
    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
