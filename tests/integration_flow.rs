//! End-to-end flow over the scripted vendor bus and the demo page.

use std::sync::Arc;
use std::time::Duration;

use chatbridge_binder::ElementId;
use chatbridge_cli::config::AppConfig;
use chatbridge_cli::integration::Integration;
use chatbridge_cli::sim::{demo_page, scripted_bus, SimScript};
use chatbridge_core_types::ActionContext;
use chatbridge_dispatcher::{DispatchPolicy, NavigationPort, StaticNav};
use chatbridge_readiness::GatePolicy;
use chatbridge_vendor_bus::{BusCommand, InMemoryBus, NeverLoader};

fn fast_config() -> AppConfig {
    AppConfig {
        gate: GatePolicy {
            poll_interval_ms: 1,
            max_polls: 20,
            max_wait_ms: Some(2_000),
        },
        dispatch: DispatchPolicy {
            not_ready_backoff_ms: 5,
            max_attempts: 20,
            settle_delay_ms: 1,
            open_via_launcher: true,
        },
        ..AppConfig::default()
    }
}

struct Harness {
    bus: Arc<InMemoryBus>,
    page: Arc<chatbridge_binder::MemoryPage>,
    nav: Arc<StaticNav>,
    integration: Arc<Integration>,
}

fn harness() -> Harness {
    let (bus, loader) = scripted_bus(&SimScript::fast());
    let page = Arc::new(demo_page());
    let nav = Arc::new(StaticNav::new("/home", "Homepage"));
    let integration = Integration::new(
        fast_config(),
        loader,
        Arc::clone(&nav) as Arc<dyn NavigationPort>,
        Arc::clone(&page) as _,
    );
    Harness {
        bus,
        page,
        nav,
        integration,
    }
}

fn count(names: &[&'static str], needle: &str) -> usize {
    names.iter().filter(|name| **name == needle).count()
}

fn opens(names: &[&'static str]) -> usize {
    count(names, "Messenger.open") + count(names, "Launcher.open")
}

#[tokio::test]
async fn bootstrap_enhances_the_page_and_reports_ready() {
    let fx = harness();
    fx.integration.init().await.unwrap();

    let status = fx.integration.status();
    assert!(status.bus_loaded);
    assert!(status.integration_ready);
    assert!(status.capabilities_ready["messenger-ready"]);
    assert!(status.capabilities_ready["journey-ready"]);

    // Three contact elements enhanced, the claims button left alone.
    assert_eq!(fx.integration.bind_all(), 0);
    assert_eq!(fx.page.handler_attach_count(ElementId(0)), 1);
    assert_eq!(fx.page.handler_attach_count(ElementId(3)), 0);

    // The bootstrap records the landing pageview.
    assert!(fx.bus.command_names().contains(&"Journey.pageview"));
}

#[tokio::test]
async fn click_emits_context_before_open() {
    let fx = harness();
    fx.integration.init().await.unwrap();
    fx.bus.clear_commands();

    fx.page.click(ElementId(1)).await;

    let commands = fx.bus.commands();
    let set = commands
        .iter()
        .position(|c| matches!(c, BusCommand::SetDatabase { .. }))
        .expect("context-set emitted");
    let open = commands
        .iter()
        .position(|c| c.is_open())
        .expect("open emitted");
    assert!(set < open, "context-set must precede open");

    // The bound click carries element context.
    let BusCommand::SetDatabase { attributes } = &commands[set] else {
        unreachable!()
    };
    assert_eq!(attributes.get("elementKind"), Some(&"button".into()));
    assert_eq!(attributes.get("trigger"), Some(&"contact-button-2".into()));
    assert!(attributes.contains_key("timestamp"));
}

#[tokio::test]
async fn double_click_yields_two_pairs_without_error() {
    let fx = harness();
    fx.integration.init().await.unwrap();
    fx.bus.clear_commands();

    let first = fx.page.click(ElementId(1));
    let second = fx.page.click(ElementId(1));
    tokio::join!(first, second);

    let names = fx.bus.command_names();
    assert_eq!(count(&names, "Database.set"), 2);
    assert_eq!(opens(&names), 2);
    // Still exactly one handler on the element.
    assert_eq!(fx.page.handler_attach_count(ElementId(1)), 1);
}

#[tokio::test]
async fn triggers_queued_before_readiness_all_emit_after_it() {
    let fx = harness();

    let mut pending = Vec::new();
    for _ in 0..3 {
        let integration = Arc::clone(&fx.integration);
        pending.push(tokio::spawn(async move {
            integration.trigger(ActionContext::new()).await
        }));
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(opens(&fx.bus.command_names()), 0);

    fx.integration.init().await.unwrap();
    for handle in pending {
        handle.await.unwrap().unwrap();
    }

    let names = fx.bus.command_names();
    assert_eq!(opens(&names), 3);
    assert!(count(&names, "Database.set") >= 3);
}

#[tokio::test]
async fn form_submission_sets_context_and_records() {
    let fx = harness();
    fx.integration.init().await.unwrap();
    fx.nav.navigate("/submit-claim", "Submit a Claim");
    fx.bus.clear_commands();

    let form = ActionContext::new().with("claimId", "CLM-2024-000001");
    fx.integration
        .send_form_context("claim-submission", &form)
        .await
        .unwrap();

    let commands = fx.bus.commands();
    let BusCommand::SetDatabase { attributes } = &commands[0] else {
        panic!("expected Database.set first, got {:?}", commands[0]);
    };
    assert_eq!(attributes.get("formType"), Some(&"claim-submission".into()));
    assert_eq!(attributes.get("claimId"), Some(&"CLM-2024-000001".into()));

    let BusCommand::RecordEvent { event_name, .. } = &commands[1] else {
        panic!("expected Journey.record second, got {:?}", commands[1]);
    };
    assert_eq!(event_name, "form-submitted");
}

#[tokio::test]
async fn opened_event_is_recorded_as_telemetry() {
    let fx = harness();
    fx.integration.init().await.unwrap();
    fx.bus.clear_commands();

    fx.bus.emit(chatbridge_vendor_bus::BusEvent::MessengerOpened);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let recorded = fx.bus.commands().iter().any(|c| {
        matches!(c, BusCommand::RecordEvent { event_name, .. } if event_name == "messenger-opened")
    });
    assert!(recorded);
}

#[tokio::test]
async fn missing_bus_fails_bootstrap_terminally() {
    let config = AppConfig {
        gate: GatePolicy {
            poll_interval_ms: 1,
            max_polls: 3,
            max_wait_ms: None,
        },
        ..fast_config()
    };
    let page = Arc::new(demo_page());
    let nav = Arc::new(StaticNav::new("/home", "Homepage"));
    let integration = Integration::new(
        config,
        Arc::new(NeverLoader),
        nav as Arc<dyn NavigationPort>,
        page as _,
    );

    assert!(integration.init().await.is_err());
    let status = integration.status();
    assert!(!status.bus_loaded);
    assert!(!status.integration_ready);
}

#[tokio::test]
async fn shutdown_cancels_deferred_triggers() {
    let fx = harness();

    let integration = Arc::clone(&fx.integration);
    let deferred =
        tokio::spawn(async move { integration.trigger(ActionContext::new()).await });
    tokio::time::sleep(Duration::from_millis(5)).await;
    fx.integration.shutdown();

    assert!(deferred.await.unwrap().is_err());
    assert_eq!(opens(&fx.bus.command_names()), 0);
}
