//! ARGOS Oracle service entry point.
//!
//! Loads configuration from the environment, initializes tracing, builds the
//! router around an explicit application state, and serves it until a shutdown
//! signal arrives.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use argos_oracle::config::{self, AppConfig, LogFormat};
use argos_oracle::{create_router, http, AppState, StartupError};

/// ARGOS Oracle: service status endpoint
#[derive(Parser, Debug)]
#[command(name = "argos-oracle", version, about)]
struct Args {
    /// Dotenv file to read (default: .env in the working directory, if present)
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    /// Log level filter (e.g., "argos_oracle=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_config() => {
            // Logging is configured from this same source, so it is not up yet
            eprintln!("argos-oracle: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let env = config::env_snapshot(args.env_file.as_deref())?;
    let config = AppConfig::from_env(&env)?;

    // Priority: CLI > RUST_LOG > default
    let log_filter = args
        .log_level
        .unwrap_or_else(|| config.logging.filter.clone());
    init_tracing(&log_filter, config.logging.format);

    tracing::info!(
        title = %config.app.title,
        addr = %config.http.socket_addr(),
        log_format = %config.logging.format,
        "Loaded configuration"
    );

    let state = AppState::new(config);
    let app = create_router(state.clone());

    http::start_server(app, &state.config).await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
