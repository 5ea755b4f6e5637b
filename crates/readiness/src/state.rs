use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use chatbridge_core_types::Capability;

#[derive(Clone, Copy, Debug, Default)]
struct Flags {
    sdk_loaded: bool,
    messenger_ready: bool,
    journey_ready: bool,
    launcher_ready: bool,
}

impl Flags {
    fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::SdkLoaded => self.sdk_loaded,
            Capability::MessengerReady => self.messenger_ready,
            Capability::JourneyReady => self.journey_ready,
            Capability::LauncherReady => self.launcher_ready,
        }
    }

    fn set(&mut self, capability: Capability) -> bool {
        let slot = match capability {
            Capability::SdkLoaded => &mut self.sdk_loaded,
            Capability::MessengerReady => &mut self.messenger_ready,
            Capability::JourneyReady => &mut self.journey_ready,
            Capability::LauncherReady => &mut self.launcher_ready,
        };
        let transitioned = !*slot;
        *slot = true;
        transitioned
    }
}

/// Diagnostics snapshot exposed to callers.
#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    pub bus_loaded: bool,
    pub integration_ready: bool,
    pub capabilities_ready: BTreeMap<String, bool>,
}

/// Owned set of monotonic capability flags.
///
/// A flag transitions false→true at most once per process lifetime and
/// never resets. Mutation happens only inside this crate; callers get
/// queries and change notifications.
pub struct ReadinessState {
    flags: Mutex<Flags>,
    integration_ready: AtomicBool,
    bus_failed: AtomicBool,
    changed: watch::Sender<u64>,
}

impl ReadinessState {
    pub fn new() -> Arc<Self> {
        let (changed, _) = watch::channel(0);
        Arc::new(Self {
            flags: Mutex::new(Flags::default()),
            integration_ready: AtomicBool::new(false),
            bus_failed: AtomicBool::new(false),
            changed,
        })
    }

    pub fn is_set(&self, capability: Capability) -> bool {
        self.flags.lock().get(capability)
    }

    pub fn all_set(&self, required: &[Capability]) -> bool {
        let flags = self.flags.lock();
        required.iter().all(|cap| flags.get(*cap))
    }

    /// Set a flag; returns whether this call performed the transition.
    pub(crate) fn set(&self, capability: Capability) -> bool {
        let transitioned = self.flags.lock().set(capability);
        if transitioned {
            self.changed.send_modify(|rev| *rev += 1);
        }
        transitioned
    }

    pub(crate) fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    pub fn integration_ready(&self) -> bool {
        self.integration_ready.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_integration_ready(&self) {
        self.integration_ready.store(true, Ordering::SeqCst);
        self.changed.send_modify(|rev| *rev += 1);
    }

    pub fn bus_failed(&self) -> bool {
        self.bus_failed.load(Ordering::SeqCst)
    }

    /// Latch the terminal bus failure; returns the previous value so the
    /// caller can report it exactly once.
    pub(crate) fn mark_bus_failed(&self) -> bool {
        self.bus_failed.swap(true, Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let flags = *self.flags.lock();
        let mut capabilities_ready = BTreeMap::new();
        for capability in [
            Capability::MessengerReady,
            Capability::JourneyReady,
            Capability::LauncherReady,
        ] {
            capabilities_ready.insert(capability.as_str().to_string(), flags.get(capability));
        }
        StatusSnapshot {
            bus_loaded: flags.sdk_loaded,
            integration_ready: self.integration_ready(),
            capabilities_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_monotonic() {
        let state = ReadinessState::new();
        assert!(!state.is_set(Capability::MessengerReady));
        assert!(state.set(Capability::MessengerReady));
        assert!(!state.set(Capability::MessengerReady));
        assert!(state.is_set(Capability::MessengerReady));
    }

    #[test]
    fn all_set_over_required_subset() {
        let state = ReadinessState::new();
        state.set(Capability::MessengerReady);
        assert!(!state.all_set(&[Capability::MessengerReady, Capability::JourneyReady]));
        state.set(Capability::JourneyReady);
        assert!(state.all_set(&[Capability::MessengerReady, Capability::JourneyReady]));
        assert!(state.all_set(&[]));
    }

    #[test]
    fn snapshot_reflects_flags() {
        let state = ReadinessState::new();
        state.set(Capability::SdkLoaded);
        state.set(Capability::LauncherReady);
        state.mark_integration_ready();

        let snapshot = state.snapshot();
        assert!(snapshot.bus_loaded);
        assert!(snapshot.integration_ready);
        assert_eq!(snapshot.capabilities_ready["launcher-ready"], true);
        assert_eq!(snapshot.capabilities_ready["messenger-ready"], false);
    }

    #[test]
    fn transitions_bump_the_revision() {
        let state = ReadinessState::new();
        let rx = state.subscribe_changes();
        assert_eq!(*rx.borrow(), 0);
        state.set(Capability::JourneyReady);
        assert_eq!(*rx.borrow(), 1);
        state.set(Capability::JourneyReady);
        assert_eq!(*rx.borrow(), 1);
    }
}
