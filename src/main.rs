use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use chatbridge_cli::cli::{cmd_config, cmd_simulate, init_logging, SimulateArgs};
use chatbridge_cli::config::load_config;

#[derive(Parser)]
#[command(
    name = "chatbridge",
    version,
    about = "Messenger widget integration runtime",
    propagate_version = true
)]
struct Cli {
    /// Path to a configuration file (default: config/chatbridge.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Force debug logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the integration against a scripted vendor bus and demo page.
    Simulate(SimulateArgs),
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_ref())?;
    let level = cli
        .log_level
        .unwrap_or_else(|| loaded.config.log_level.clone());
    init_logging(&level, cli.debug)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        build = env!("BUILD_DATE"),
        git = env!("GIT_HASH"),
        "chatbridge starting"
    );

    match cli.command {
        Commands::Simulate(args) => cmd_simulate(loaded.config, args).await,
        Commands::Config => cmd_config(&loaded.config, loaded.path.as_deref()),
    }
}
