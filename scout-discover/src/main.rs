//! Player discovery CLI (scout-discover)
//!
//! Expands a seed account's recent co-participants, fetches their profiles,
//! and writes the ones passing the filters to a JSON file.
//!
//! Settings resolve CLI argument → environment variable → config file →
//! compiled default. Invalid input exits with status 1 before any request
//! is made. Ctrl+C saves progress and exits 0.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use scout_common::config::{load_toml_config, resolve};
use scout_common::human_time::parse_max_age;
use scout_common::{Error, Identity, LogSink, RankBound};
use scout_discover::models::{FilterOptions, GameTypeFilter, Region};
use scout_discover::services::ugg_source::DEFAULT_REQUEST_DELAY_MS;
use scout_discover::services::{DiscoveryConfig, DiscoveryEngine, UggSource, DEFAULT_OUTPUT};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_MAX_RESULTS: usize = 100;

/// Command-line arguments for scout-discover
#[derive(Parser, Debug)]
#[command(name = "scout-discover")]
#[command(about = "Find recently active League of Legends players")]
#[command(version)]
struct Args {
    /// Starting player Riot ID (format: Name#Tag)
    #[arg(long)]
    seed: String,

    /// Server region (na, euw, eune, kr, br, lan, las, oce, tr, ru, jp)
    #[arg(long, env = "SCOUT_REGION")]
    region: Option<String>,

    /// Filter by game type: ranked, normal, aram, all
    #[arg(long, default_value = "all")]
    game_type: String,

    /// Minimum rank tier, optionally with division (e.g. gold, gold-ii)
    #[arg(long)]
    min_rank: Option<String>,

    /// Maximum rank tier, optionally with division
    #[arg(long)]
    max_rank: Option<String>,

    /// Max time since last game (e.g. 1h, 30m, 2d, 1w)
    #[arg(long)]
    max_age: Option<String>,

    /// Maximum number of players to find
    #[arg(long)]
    max_results: Option<usize>,

    /// Maximum search duration (e.g. 5m, 10m, 1h)
    #[arg(long)]
    max_time: Option<String>,

    /// Minimum spacing between requests in milliseconds
    #[arg(long, env = "SCOUT_DELAY_MS")]
    delay: Option<u64>,

    /// Output JSON file path
    #[arg(long, env = "SCOUT_OUTPUT")]
    output: Option<PathBuf>,

    /// Config file (default: <config dir>/scout/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Everything needed to start a session, validated
#[derive(Debug)]
struct Plan {
    seed: Identity,
    config: DiscoveryConfig,
    request_delay: Duration,
}

fn plan(args: &Args) -> scout_common::Result<Plan> {
    let seed: Identity = args.seed.parse().map_err(|_| {
        Error::InvalidInput("Seed must be in format Name#Tag (e.g., Faker#T1)".to_string())
    })?;

    let toml = load_toml_config(args.config.as_deref())?;

    let region: Region = resolve(args.region.clone(), toml.region, "na".to_string()).parse()?;
    let game_type: GameTypeFilter = args.game_type.parse()?;
    let min_rank = args
        .min_rank
        .as_deref()
        .map(str::parse::<RankBound>)
        .transpose()?;
    let max_rank = args
        .max_rank
        .as_deref()
        .map(str::parse::<RankBound>)
        .transpose()?;

    let max_age_ms = args.max_age.as_deref().map(parse_max_age).transpose()?;
    let max_duration = args
        .max_time
        .as_deref()
        .map(|s| parse_max_age(s).map(Duration::from_millis))
        .transpose()?;

    let result_cap = resolve(args.max_results, toml.max_results, DEFAULT_MAX_RESULTS);
    if result_cap == 0 {
        return Err(Error::InvalidInput(
            "max-results must be greater than 0".to_string(),
        ));
    }

    let delay_ms = resolve(args.delay, toml.request_delay_ms, DEFAULT_REQUEST_DELAY_MS);
    let output_path = resolve(args.output.clone(), toml.output, PathBuf::from(DEFAULT_OUTPUT));

    Ok(Plan {
        seed,
        config: DiscoveryConfig {
            region,
            filters: FilterOptions {
                game_type,
                min_rank,
                max_rank,
                max_age_ms,
            },
            result_cap,
            max_duration,
            output_path,
        },
        request_delay: Duration::from_millis(delay_ms),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scout_discover=info,scout_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let plan = match plan(&args) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("═══════════════════════════════════════════════════════");
    println!("  League of Legends Recently Active Player Finder");
    println!("═══════════════════════════════════════════════════════");

    info!(
        seed = %plan.seed,
        delay_ms = plan.request_delay.as_millis() as u64,
        output = %plan.config.output_path.display(),
        "Starting discovery"
    );

    let source = Arc::new(UggSource::new(plan.request_delay));
    let engine = Arc::new(DiscoveryEngine::new(plan.config, source, LogSink::default()));

    // Ctrl+C: stop, which returns once progress is saved, then exit 0
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupt_handler = {
        let engine = Arc::clone(&engine);
        let interrupted = Arc::clone(&interrupted);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                eprintln!("\n\nInterrupted! Saving progress...");
                interrupted.store(true, Ordering::SeqCst);
                engine.stop().await;
            }
        })
    };

    let outcome = engine.discover(&plan.seed).await;
    if interrupted.load(Ordering::SeqCst) {
        // The final save must finish before the process goes away
        if let Err(e) = interrupt_handler.await {
            tracing::warn!("Interrupt handler failed: {}", e);
        }
        std::process::exit(0);
    }

    if let Err(e) = outcome {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
