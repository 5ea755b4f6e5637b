use chatbridge_core_types::{ActionContext, Capability};
use serde_json::json;

/// Events published by the vendor bus once its hosted SDK has booted.
#[derive(Clone, Debug, PartialEq)]
pub enum BusEvent {
    MessengerReady,
    MessengerOpened,
    MessengerClosed,
    JourneyReady,
    LauncherReady,
    ConversationStarted { conversation_id: String },
    ConversationMessage,
}

impl BusEvent {
    /// Wire name used on the vendor's subscribe verb.
    pub fn name(&self) -> &'static str {
        match self {
            BusEvent::MessengerReady => "Messenger.ready",
            BusEvent::MessengerOpened => "Messenger.opened",
            BusEvent::MessengerClosed => "Messenger.closed",
            BusEvent::JourneyReady => "Journey.ready",
            BusEvent::LauncherReady => "Launcher.ready",
            BusEvent::ConversationStarted { .. } => "Conversations.started",
            BusEvent::ConversationMessage => "Conversations.message",
        }
    }

    /// The readiness capability this event signals, if any.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            BusEvent::MessengerReady => Some(Capability::MessengerReady),
            BusEvent::JourneyReady => Some(Capability::JourneyReady),
            BusEvent::LauncherReady => Some(Capability::LauncherReady),
            _ => None,
        }
    }
}

/// Commands issued to the vendor bus.
///
/// Context payloads keep their insertion order; the bus is assumed
/// idempotent for open-when-already-open.
#[derive(Clone, Debug, PartialEq)]
pub enum BusCommand {
    SetDatabase {
        attributes: ActionContext,
    },
    OpenMessenger,
    CloseMessenger,
    OpenLauncher,
    RecordEvent {
        event_name: String,
        attributes: ActionContext,
    },
    Pageview {
        page_title: String,
        page_url: String,
        attributes: ActionContext,
    },
}

impl BusCommand {
    /// Wire name used on the vendor's command verb.
    pub fn name(&self) -> &'static str {
        match self {
            BusCommand::SetDatabase { .. } => "Database.set",
            BusCommand::OpenMessenger => "Messenger.open",
            BusCommand::CloseMessenger => "Messenger.close",
            BusCommand::OpenLauncher => "Launcher.open",
            BusCommand::RecordEvent { .. } => "Journey.record",
            BusCommand::Pageview { .. } => "Journey.pageview",
        }
    }

    /// Wire payload, shaped the way the vendor expects it.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            BusCommand::SetDatabase { attributes } => Some(json!({
                "messaging": { "customAttributes": attributes }
            })),
            BusCommand::RecordEvent {
                event_name,
                attributes,
            } => Some(json!({
                "eventName": event_name,
                "customAttributes": attributes,
            })),
            BusCommand::Pageview {
                page_title,
                page_url,
                attributes,
            } => Some(json!({
                "pageTitle": page_title,
                "pageUrl": page_url,
                "customAttributes": attributes,
            })),
            BusCommand::OpenMessenger
            | BusCommand::CloseMessenger
            | BusCommand::OpenLauncher => None,
        }
    }

    /// Whether this command opens the widget (launcher or messenger path).
    pub fn is_open(&self) -> bool {
        matches!(self, BusCommand::OpenMessenger | BusCommand::OpenLauncher)
    }
}
