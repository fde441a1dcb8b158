//! Player discovery HTTP server (scout-server)
//!
//! Serves the search API: start/stop a discovery session, poll its progress
//! and logs, stream logs over SSE, and manage saved result files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use scout_common::config::{load_toml_config, resolve};
use scout_discover::models::Region;
use scout_discover::services::ugg_source::DEFAULT_REQUEST_DELAY_MS;
use scout_discover::services::{ProfileSource, UggSource};
use scout_discover::{build_router, AppState, ServerSettings, SourceFactory, DEFAULT_HTTP_MAX_RESULTS};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

/// Command-line arguments for scout-server
#[derive(Parser, Debug)]
#[command(name = "scout-server")]
#[command(about = "HTTP interface for League of Legends player discovery")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SCOUT_PORT")]
    port: Option<u16>,

    /// Directory for search result files
    #[arg(long, env = "SCOUT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Default region for searches that do not name one
    #[arg(long, env = "SCOUT_REGION")]
    region: Option<String>,

    /// Minimum spacing between requests in milliseconds
    #[arg(long, env = "SCOUT_DELAY_MS")]
    delay: Option<u64>,

    /// Default result cap for searches that do not set one
    #[arg(long)]
    max_results: Option<usize>,

    /// Config file (default: <config dir>/scout/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scout_discover=info,scout_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config")?;

    let port = resolve(args.port, toml.port, DEFAULT_PORT);
    let output_dir = resolve(args.output_dir, toml.output_dir, PathBuf::from("."));
    let default_region: Region = resolve(args.region, toml.region, "na".to_string())
        .parse()
        .context("Invalid default region")?;
    let delay = Duration::from_millis(resolve(
        args.delay,
        toml.request_delay_ms,
        DEFAULT_REQUEST_DELAY_MS,
    ));
    let default_max_results = resolve(args.max_results, toml.max_results, DEFAULT_HTTP_MAX_RESULTS);

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    info!("Output directory: {}", output_dir.display());
    info!("Request delay: {:?}", delay);

    let source_factory: SourceFactory =
        Arc::new(move || Arc::new(UggSource::new(delay)) as Arc<dyn ProfileSource>);
    let state = AppState::new(
        ServerSettings {
            output_dir,
            default_region,
            default_max_results,
        },
        source_factory,
    );

    let app = build_router(state.clone()).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Resolves only after SSE streams are told to close and a running search
/// has saved what it found, so open connections cannot hold the save back.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }

    state.begin_shutdown().await;
}
