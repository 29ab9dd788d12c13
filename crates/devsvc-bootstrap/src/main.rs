use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use devsvc_bootstrap::server::{self, ServerState};
use devsvc_bootstrap::{BootstrapContext, telemetry};
use devsvc_config::{Config, active_env_overrides};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "devsvc-bootstrap",
    about = "Device service bootstrap: waits for core services, then builds their clients"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(
        long,
        global = true,
        env = "DEVSVC_CONFIG",
        default_value = "res/configuration.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration JSON schema to stdout.
    Schema,
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Schema) = cli.command {
        let schema = schemars::schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = Config::load(&cli.config)?;

    if let Some(Commands::CheckConfig) = cli.command {
        println!(
            "configuration OK: discovery={}, dependencies={}",
            config.discovery,
            config.clients.len()
        );
        return Ok(());
    }

    let _log_guard = telemetry::init(&config.logging)?;
    info!(
        service = %config.service.name,
        config = %cli.config.display(),
        "starting device service bootstrap"
    );
    for (name, value) in active_env_overrides() {
        info!(variable = name, %value, "configuration overridden from environment");
    }

    let status_port = config.service.status_port;
    let ctx = BootstrapContext::new(config)?;
    let state = ServerState::new(
        ctx.config.service.name.as_str(),
        ctx.dependencies.iter().map(|d| d.key.as_str()),
    );

    // The status server runs for the whole process; if it exits, shut down.
    tokio::select! {
        res = server::run(status_port, state.clone()) => {
            error!("status server exited: {res:?}");
            res
        }
        res = run(ctx, state) => {
            res
        }
    }
}

async fn run(ctx: BootstrapContext, state: ServerState) -> Result<()> {
    let clients = devsvc_bootstrap::bootstrap(&ctx).await?;
    state.set_ready();
    info!(clients = clients.all().len(), "device service ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    Ok(())
}
