use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use chatbridge_core_types::Capability;
use chatbridge_vendor_bus::{BusLoader, VendorBus};

use crate::errors::ReadinessError;
use crate::policy::GatePolicy;
use crate::state::{ReadinessState, StatusSnapshot};

/// Waits for the vendor bus to exist and for named capabilities to come up.
///
/// The gate owns the readiness flags, the bus-presence poll and a single
/// event pump; callers get `await_ready` plus diagnostics queries. Every
/// wait is tied to the gate's cancellation token, so shutdown withdraws
/// pending polls instead of leaking timers.
pub struct ReadinessGate {
    loader: Arc<dyn BusLoader>,
    policy: GatePolicy,
    state: Arc<ReadinessState>,
    bus: Mutex<Option<Arc<dyn VendorBus>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ReadinessGate {
    pub fn new(loader: Arc<dyn BusLoader>, policy: GatePolicy, cancel: CancellationToken) -> Self {
        Self {
            loader,
            policy,
            state: ReadinessState::new(),
            bus: Mutex::new(None),
            pump: Mutex::new(None),
            cancel,
        }
    }

    pub fn state(&self) -> Arc<ReadinessState> {
        Arc::clone(&self.state)
    }

    pub fn status(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    pub fn integration_ready(&self) -> bool {
        self.state.integration_ready()
    }

    /// Latch the overall integration-ready flag once enhancement completes.
    pub fn mark_integration_ready(&self) {
        self.state.mark_integration_ready();
    }

    /// Resolve the bus handle, polling while the vendor script is still
    /// downloading. After `max_polls` misses the failure latches and is
    /// reported once; later calls fail fast without re-logging.
    pub async fn bus(&self) -> Result<Arc<dyn VendorBus>, ReadinessError> {
        if let Some(bus) = self.bus.lock().clone() {
            return Ok(bus);
        }
        if self.state.bus_failed() {
            return Err(ReadinessError::BusUnavailable {
                attempts: self.policy.max_polls,
            });
        }

        let mut attempts = 0u32;
        loop {
            if let Some(bus) = self.loader.load().await {
                self.adopt_bus(Arc::clone(&bus));
                return Ok(bus);
            }
            attempts += 1;
            if attempts >= self.policy.max_polls {
                if !self.state.mark_bus_failed() {
                    error!(
                        attempts,
                        "vendor bus never materialised; giving up on integration"
                    );
                }
                return Err(ReadinessError::BusUnavailable { attempts });
            }
            debug!(attempts, "vendor bus not present yet; re-polling");
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ReadinessError::Cancelled),
                _ = sleep(self.policy.poll_interval()) => {}
            }
        }
    }

    fn adopt_bus(&self, bus: Arc<dyn VendorBus>) {
        {
            let mut guard = self.bus.lock();
            if guard.is_some() {
                return;
            }
            *guard = Some(Arc::clone(&bus));
        }
        self.state.set(Capability::SdkLoaded);
        self.spawn_pump(bus);
        info!("vendor bus loaded");
    }

    /// Single shared subscription: one pump sets flags for every capability
    /// event, so repeated `await_ready` calls never re-subscribe.
    fn spawn_pump(&self, bus: Arc<dyn VendorBus>) {
        let mut guard = self.pump.lock();
        if guard.is_some() {
            return;
        }
        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        let mut events = bus.subscribe();
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            if let Some(capability) = event.capability() {
                                if state.set(capability) {
                                    debug!(capability = %capability, "capability ready");
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "readiness pump lagged behind vendor events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }));
    }

    /// Resolve once every required capability has been signaled.
    ///
    /// Completion fires exactly once per call regardless of event arrival
    /// order; duplicate vendor events are absorbed by the monotonic flags.
    /// Concurrent calls with overlapping capability sets each get their own
    /// completion over the shared flags.
    pub async fn await_ready(&self, required: &[Capability]) -> Result<(), ReadinessError> {
        let started = Instant::now();
        self.bus().await?;

        let mut changes = self.state.subscribe_changes();
        loop {
            if self.state.all_set(required) {
                return Ok(());
            }
            match self.policy.max_wait() {
                None => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(ReadinessError::Cancelled),
                        changed = changes.changed() => {
                            if changed.is_err() {
                                return Err(ReadinessError::Cancelled);
                            }
                        }
                    }
                }
                Some(max_wait) => {
                    let elapsed = started.elapsed();
                    let Some(remaining) = max_wait.checked_sub(elapsed) else {
                        return Err(ReadinessError::Timeout {
                            waited_ms: elapsed.as_millis() as u64,
                        });
                    };
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(ReadinessError::Cancelled),
                        outcome = tokio::time::timeout(remaining, changes.changed()) => match outcome {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => return Err(ReadinessError::Cancelled),
                            Err(_) => {
                                return Err(ReadinessError::Timeout {
                                    waited_ms: started.elapsed().as_millis() as u64,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    /// Cancel the poll and the event pump.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReadinessGate {
    fn drop(&mut self) {
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }
}
