pub mod commands;
pub mod runtime;

pub use commands::{cmd_config, cmd_simulate, SimulateArgs};
pub use runtime::init_logging;
