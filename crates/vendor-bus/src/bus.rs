use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use chatbridge_core_types::BridgeError;

use crate::protocol::{BusCommand, BusEvent};

/// The vendor's command/event surface, consumed as a black box.
#[async_trait]
pub trait VendorBus: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<BusEvent>;
    async fn command(&self, command: BusCommand) -> Result<(), BridgeError>;
}

/// In-memory bus for unit tests, the demo CLI, and early integration.
///
/// Records every accepted command so tests can assert on emission order,
/// and can be told to reject commands to exercise failure paths.
pub struct InMemoryBus {
    sender: broadcast::Sender<BusEvent>,
    commands: Mutex<Vec<BusCommand>>,
    reject_commands: AtomicBool,
    reject_named: Mutex<Option<&'static str>>,
}

impl InMemoryBus {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            sender,
            commands: Mutex::new(Vec::new()),
            reject_commands: AtomicBool::new(false),
            reject_named: Mutex::new(None),
        })
    }

    /// Script a vendor-side event. Lagging or absent receivers are fine.
    pub fn emit(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }

    /// Commands accepted so far, in emission order.
    pub fn commands(&self) -> Vec<BusCommand> {
        self.commands.lock().clone()
    }

    /// Active subscriptions. Scripted vendors use this to hold their ready
    /// events until someone is listening, the way the real SDK only calls
    /// back into registered handlers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Wire names of the accepted commands, in emission order.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.lock().iter().map(|c| c.name()).collect()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    /// Toggle command rejection to exercise emission-failure handling.
    pub fn reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::SeqCst);
    }

    /// Reject only commands with the given wire name (`None` clears it).
    pub fn reject_named(&self, name: Option<&'static str>) {
        *self.reject_named.lock() = name;
    }

    fn rejects(&self, command: &BusCommand) -> bool {
        self.reject_commands.load(Ordering::SeqCst)
            || self.reject_named.lock().is_some_and(|name| name == command.name())
    }
}

#[async_trait]
impl VendorBus for InMemoryBus {
    fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    async fn command(&self, command: BusCommand) -> Result<(), BridgeError> {
        if self.rejects(&command) {
            return Err(BridgeError::new(format!(
                "vendor bus rejected command {}",
                command.name()
            )));
        }
        debug!(command = command.name(), "vendor bus command accepted");
        self.commands.lock().push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core_types::ActionContext;

    #[tokio::test]
    async fn records_commands_in_order() {
        let bus = InMemoryBus::new(8);
        bus.command(BusCommand::SetDatabase {
            attributes: ActionContext::new().with("trigger", "manual"),
        })
        .await
        .unwrap();
        bus.command(BusCommand::OpenMessenger).await.unwrap();

        assert_eq!(bus.command_names(), vec!["Database.set", "Messenger.open"]);
    }

    #[tokio::test]
    async fn rejection_surfaces_as_error() {
        let bus = InMemoryBus::new(8);
        bus.reject_commands(true);
        let err = bus.command(BusCommand::OpenMessenger).await.unwrap_err();
        assert!(err.to_string().contains("Messenger.open"));
        assert!(bus.commands().is_empty());

        bus.reject_commands(false);
        bus.command(BusCommand::OpenMessenger).await.unwrap();
        assert_eq!(bus.commands().len(), 1);
    }

    #[tokio::test]
    async fn emitted_events_reach_subscribers() {
        let bus = InMemoryBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(BusEvent::MessengerReady);
        bus.emit(BusEvent::JourneyReady);

        assert_eq!(rx.recv().await.unwrap(), BusEvent::MessengerReady);
        assert_eq!(rx.recv().await.unwrap(), BusEvent::JourneyReady);
    }

    #[tokio::test]
    async fn named_rejection_targets_one_command() {
        let bus = InMemoryBus::new(8);
        bus.reject_named(Some("Journey.record"));

        bus.command(BusCommand::OpenMessenger).await.unwrap();
        let err = bus
            .command(BusCommand::RecordEvent {
                event_name: "messenger-opened".into(),
                attributes: ActionContext::new(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Journey.record"));

        bus.reject_named(None);
        assert_eq!(bus.command_names(), vec!["Messenger.open"]);
    }

    #[test]
    fn emit_without_subscribers_is_a_noop() {
        let bus = InMemoryBus::new(8);
        bus.emit(BusEvent::LauncherReady);
    }
}
