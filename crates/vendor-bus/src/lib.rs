pub mod bus;
pub mod deployment;
pub mod loader;
pub mod protocol;

pub use bus::{InMemoryBus, VendorBus};
pub use deployment::DeploymentConfig;
pub use loader::{BusLoader, DelayedLoader, NeverLoader, StaticLoader};
pub use protocol::{BusCommand, BusEvent};
