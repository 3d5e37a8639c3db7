//! pon-budget - PON link power-budget solver
//!
//! Serves the calculator over HTTP or solves a single link from the command
//! line.
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API (default subcommand)
//! pon-budget serve --addr 127.0.0.1:8080
//!
//! # Solve for the blank field (here: maximum fiber reach)
//! pon-budget solve --tx 5 --rx -28 --attenuation 0,25 \
//!     --connector-loss 0.5 --connectors 4 --splitter-loss 14.1 --margin 3
//! ```
//!
//! # Environment Variables
//!
//! - `PON_BUDGET_CONFIG`: Path to the TOML config (default: ./pon_budget.toml)
//! - `PON_BUDGET_ADDR`: HTTP bind address (default: 0.0.0.0:8080)
//! - `PON_BUDGET_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pon_budget::api::form::RawLinkForm;
use pon_budget::api::{create_app, ApiState};
use pon_budget::budget;
use pon_budget::config::{self, defaults, CalculatorConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pon-budget")]
#[command(about = "PON link power-budget solver")]
#[command(version)]
struct CliArgs {
    /// Load this config file instead of searching the default locations
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP API
    Serve {
        /// Override the server address (default: "0.0.0.0:8080")
        #[arg(short, long, env = defaults::SERVER_ADDR_ENV_VAR)]
        addr: Option<String>,
    },

    /// Solve one link; leave exactly one quantity out to solve for it.
    ///
    /// Values accept a comma as decimal separator.
    Solve(SolveArgs),
}

#[derive(clap::Args, Debug)]
struct SolveArgs {
    /// Transmit power (dBm)
    #[arg(long, allow_hyphen_values = true)]
    tx: Option<String>,
    /// Receiver sensitivity (dBm)
    #[arg(long, allow_hyphen_values = true)]
    rx: Option<String>,
    /// Fiber length (km)
    #[arg(long, allow_hyphen_values = true)]
    length: Option<String>,
    /// Fiber attenuation (dB/km)
    #[arg(long, allow_hyphen_values = true)]
    attenuation: Option<String>,
    /// Loss per connector (dB)
    #[arg(long, allow_hyphen_values = true)]
    connector_loss: Option<String>,
    /// Number of connectors
    #[arg(long, allow_hyphen_values = true)]
    connectors: Option<String>,
    /// Splitter loss (dB)
    #[arg(long, allow_hyphen_values = true)]
    splitter_loss: Option<String>,
    /// Safety margin (dB)
    #[arg(long, allow_hyphen_values = true)]
    margin: Option<String>,
}

impl From<SolveArgs> for RawLinkForm {
    fn from(args: SolveArgs) -> Self {
        Self {
            p_tx_dbm: args.tx,
            s_rx_dbm: args.rx,
            fiber_length_km: args.length,
            fiber_attenuation_db_km: args.attenuation,
            connector_loss_db: args.connector_loss,
            connector_count: args.connectors,
            splitter_loss_db: args.splitter_loss,
            safety_margin_db: args.margin,
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<CalculatorConfig> {
    match path {
        Some(p) => CalculatorConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(CalculatorConfig::load()),
    }
}

/// Print advisories and the report. Hard solver errors become the exit error.
fn run_solve(args: SolveArgs) -> Result<()> {
    let config = config::get();
    let params = RawLinkForm::from(args).to_parameters()?;

    let eval = budget::evaluate(&config.solver(), &config.typical_ranges(), &params);
    for advisory in &eval.advisories {
        println!("{advisory}");
    }
    if !eval.advisories.is_empty() {
        println!();
    }

    let solution = eval.outcome?;
    println!("{}", budget::report::render(&solution));
    Ok(())
}

async fn run_server(addr: Option<String>) -> Result<()> {
    let config = config::get();
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());

    let app = create_app(ApiState::from_config(config));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;

    info!("HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let calculator_config = load_config(args.config.as_ref())?;
    info!(
        splitters = calculator_config.splitters.len(),
        low_margin_db = calculator_config.margin.low_warning_db,
        "Calculator configuration ready"
    );
    config::init(calculator_config);

    match args.command {
        Some(SubCommand::Solve(solve)) => run_solve(solve),
        Some(SubCommand::Serve { addr }) => run_server(addr).await,
        None => run_server(std::env::var(defaults::SERVER_ADDR_ENV_VAR).ok()).await,
    }
}
