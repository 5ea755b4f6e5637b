use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::VendorBus;

/// Models the fire-and-forget bootstrap script injection: the bus handle is
/// absent until the vendor script has finished downloading.
#[async_trait]
pub trait BusLoader: Send + Sync {
    /// `None` while the script is still downloading.
    async fn load(&self) -> Option<Arc<dyn VendorBus>>;
}

/// Loader whose bus is available immediately.
pub struct StaticLoader {
    bus: Arc<dyn VendorBus>,
}

impl StaticLoader {
    pub fn new(bus: Arc<dyn VendorBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl BusLoader for StaticLoader {
    async fn load(&self) -> Option<Arc<dyn VendorBus>> {
        Some(Arc::clone(&self.bus))
    }
}

/// Loader that materialises the bus only after a number of polls, modelling
/// a slow script download.
pub struct DelayedLoader {
    bus: Arc<dyn VendorBus>,
    polls_remaining: AtomicUsize,
}

impl DelayedLoader {
    pub fn new(bus: Arc<dyn VendorBus>, polls_until_ready: usize) -> Self {
        Self {
            bus,
            polls_remaining: AtomicUsize::new(polls_until_ready),
        }
    }
}

#[async_trait]
impl BusLoader for DelayedLoader {
    async fn load(&self) -> Option<Arc<dyn VendorBus>> {
        let remaining = self.polls_remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            return Some(Arc::clone(&self.bus));
        }
        self.polls_remaining.store(remaining - 1, Ordering::SeqCst);
        None
    }
}

/// Loader for a bus that never materialises (blocked script, network down).
pub struct NeverLoader;

#[async_trait]
impl BusLoader for NeverLoader {
    async fn load(&self) -> Option<Arc<dyn VendorBus>> {
        None
    }
}
