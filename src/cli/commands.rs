use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use chatbridge_binder::ElementId;
use chatbridge_core_types::ActionContext;
use chatbridge_dispatcher::{NavigationPort, StaticNav};

use crate::config::AppConfig;
use crate::integration::Integration;
use crate::sim::{demo_page, scripted_bus, SimScript};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Clicks to fire at the first enhanced element.
    #[arg(long, default_value_t = 1)]
    pub clicks: usize,

    /// Submit a demo claim form after the clicks.
    #[arg(long)]
    pub form: bool,

    /// Millisecond-scale vendor timings instead of the realistic defaults.
    #[arg(long)]
    pub fast: bool,
}

/// Drive the whole runtime against a scripted vendor bus and the demo page,
/// then print the command log the vendor would have received.
pub async fn cmd_simulate(config: AppConfig, args: SimulateArgs) -> Result<()> {
    let script = if args.fast {
        SimScript::fast()
    } else {
        SimScript::default()
    };
    let (bus, loader) = scripted_bus(&script);
    let page = Arc::new(demo_page());
    let nav = Arc::new(StaticNav::new("/home", "Homepage - SecureLife Insurance"));

    let integration = Integration::new(
        config,
        loader,
        Arc::clone(&nav) as Arc<dyn NavigationPort>,
        Arc::clone(&page) as _,
    );
    integration.init().await?;

    for _ in 0..args.clicks.max(1) {
        page.click(ElementId(0)).await;
    }

    if args.form {
        nav.navigate("/submit-claim", "Submit a Claim - SecureLife Insurance");
        integration.record_pageview().await?;
        let form = ActionContext::new()
            .with("claimId", "CLM-2024-000001")
            .with("policyNumber", "POL-778-1204");
        integration
            .send_form_context("claim-submission", &form)
            .await?;
    }

    let status = integration.status();
    info!(
        bus_loaded = status.bus_loaded,
        integration_ready = status.integration_ready,
        "simulation finished"
    );

    println!("status: {}", serde_json::to_string_pretty(&status)?);
    println!("vendor commands ({}):", bus.commands().len());
    for command in bus.commands() {
        match command.payload() {
            Some(payload) => println!("  {:<18} {payload}", command.name()),
            None => println!("  {}", command.name()),
        }
    }

    integration.shutdown();
    Ok(())
}

/// Print the effective configuration after file lookup and defaults.
pub fn cmd_config(config: &AppConfig, source: Option<&std::path::Path>) -> Result<()> {
    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults (no config file found)"),
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
