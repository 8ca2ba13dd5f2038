//! Agent sidecar (v1)
//!
//! Supervises the telemetry agent and reconfigures it whenever the manager
//! reports that workload metrics definitions changed.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     SIDECAR                          │
//!   Manager       │  ┌──────────┐  events  ┌─────────────┐                │
//!   notification ─┼─▶│   http   │─────────▶│   control   │──fetch──▶ Manager
//!   / probe       │  │ endpoint │◀─reply───│    loop     │                │
//!                 │  └──────────┘          └──┬───────┬──┘                │
//!                 │                 regenerate│       │kill / start       │
//!                 │                           ▼       ▼                   │
//!                 │                    ┌────────┐ ┌────────┐   exit       │
//!                 │                    │ synth  │ │ agent  │──────────┐   │
//!                 │                    │ writer │ │ runner │          │   │
//!                 │                    └────────┘ └────────┘          │   │
//!                 │  ┌──────────────┐    outcome                      │   │
//!                 │  │ subscription │──────────────▶ control loop ◀───┘   │
//!                 │  └──────────────┘                                     │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use agent_sidecar::config::loader::{load_config, process_env};
use agent_sidecar::lifecycle;
use agent_sidecar::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "agent-sidecar", version)]
#[command(about = "Keeps the telemetry agent configured and running", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "SIDECAR_CONFIG")]
    config: Option<PathBuf>,

    /// Load and validate the configuration, print it, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), process_env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        return match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                println!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Cannot render configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "agent-sidecar starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        manager = %config.manager.base_url,
        agent = %config.agent.executable,
        config_file = %config.agent.config_file,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Sidecar terminated");
            ExitCode::FAILURE
        }
    }
}
