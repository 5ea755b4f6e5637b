pub mod binder;
pub mod memory;
pub mod policy;
pub mod registry;
pub mod surface;

pub use binder::EnhancementBinder;
pub use memory::{ElementSpec, MemoryPage};
pub use policy::BindPolicy;
pub use registry::BindRegistry;
pub use surface::{ClickHandler, ElementId, ElementInfo, ElementKind, PageSurface, TriggerSink};
