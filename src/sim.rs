//! Scripted vendor bus and demo page for the simulate command and tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use chatbridge_binder::{ElementKind, ElementSpec, MemoryPage};
use chatbridge_vendor_bus::{BusEvent, BusLoader, DelayedLoader, InMemoryBus};

/// When, relative to bus load, the scripted vendor signals each capability.
#[derive(Clone, Debug)]
pub struct SimScript {
    /// Loader polls before the bus handle materialises.
    pub loader_polls: usize,
    pub messenger_ready_ms: u64,
    pub journey_ready_ms: u64,
    pub launcher_ready_ms: Option<u64>,
    /// Emit a conversation-start this long after the messenger opens.
    pub conversation_after_ms: Option<u64>,
}

impl Default for SimScript {
    fn default() -> Self {
        Self {
            loader_polls: 1,
            messenger_ready_ms: 300,
            journey_ready_ms: 450,
            launcher_ready_ms: Some(600),
            conversation_after_ms: None,
        }
    }
}

impl SimScript {
    /// Millisecond-scale timings for tests.
    pub fn fast() -> Self {
        Self {
            loader_polls: 1,
            messenger_ready_ms: 5,
            journey_ready_ms: 8,
            launcher_ready_ms: Some(12),
            conversation_after_ms: None,
        }
    }
}

/// Build a scripted bus plus a loader that delays its appearance, and spawn
/// the timeline that replays the vendor's ready events.
pub fn scripted_bus(script: &SimScript) -> (Arc<InMemoryBus>, Arc<dyn BusLoader>) {
    let bus = InMemoryBus::new(64);
    let loader: Arc<dyn BusLoader> =
        Arc::new(DelayedLoader::new(bus.clone(), script.loader_polls));

    let timeline = script.clone();
    let scripted = bus.clone();
    tokio::spawn(async move {
        // Ready events only fire once a handler is registered, like the
        // real SDK calling back into subscribers.
        while scripted.receiver_count() == 0 {
            sleep(Duration::from_millis(1)).await;
        }

        let mut marks = vec![
            (timeline.messenger_ready_ms, BusEvent::MessengerReady),
            (timeline.journey_ready_ms, BusEvent::JourneyReady),
        ];
        if let Some(at) = timeline.launcher_ready_ms {
            marks.push((at, BusEvent::LauncherReady));
        }
        marks.sort_by_key(|(at, _)| *at);

        let mut elapsed = 0u64;
        for (at, event) in marks {
            if at > elapsed {
                sleep(Duration::from_millis(at - elapsed)).await;
                elapsed = at;
            }
            debug!(event = event.name(), "scripted vendor event");
            scripted.emit(event);
        }

        if let Some(after) = timeline.conversation_after_ms {
            sleep(Duration::from_millis(after)).await;
            scripted.emit(BusEvent::ConversationStarted {
                conversation_id: "sim-conversation-1".to_string(),
            });
        }
    });

    (bus, loader)
}

/// The demo page: the contact surface of a small claims portal.
pub fn demo_page() -> MemoryPage {
    let page = MemoryPage::new();
    page.add(ElementSpec {
        kind: ElementKind::Anchor,
        label: "Contact Us".into(),
        selectors: vec!["a[href*='contact']".into()],
        href: Some("contact.html".into()),
        inline_trigger: Some("contactSupport()".into()),
    });
    page.add(ElementSpec {
        kind: ElementKind::Button,
        label: "Start Chat".into(),
        selectors: vec![".start-chat".into()],
        href: None,
        inline_trigger: None,
    });
    page.add(ElementSpec {
        kind: ElementKind::Button,
        label: "Contact Support".into(),
        selectors: vec![".contact-support".into()],
        href: None,
        inline_trigger: Some("startLiveChat()".into()),
    });
    page.add(ElementSpec {
        kind: ElementKind::Button,
        label: "Submit Claim".into(),
        selectors: vec![".submit-claim".into()],
        href: None,
        inline_trigger: None,
    });
    page
}
