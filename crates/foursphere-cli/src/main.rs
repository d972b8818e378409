//! Foursphere - find nearby restaurants from the terminal.
//!
//! Each refresh resolves a position, checks connectivity, and either fetches
//! fresh venues (mirroring them into the local store) or ranks whatever the
//! store already holds.

mod display;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use foursphere_core::api::FoursquareClient;
use foursphere_core::cache::age::is_stale;
use foursphere_core::cache::{age_display, SqliteVenueStore, VenueStore};
use foursphere_core::connectivity::{
    ConnectivityGate, HttpProbe, StaticConnectivity, DEFAULT_PROBE_TIMEOUT_SECS,
};
use foursphere_core::location::{FixedLocation, LocationProvider, LocationTracker};
use foursphere_core::models::Coordinate;
use foursphere_core::pipeline::{Orchestrator, PipelineError, RefreshOutcome};
use foursphere_core::ranking::RankedVenues;
use foursphere_core::Config;

#[derive(Debug, Parser)]
#[command(name = "foursphere")]
#[command(about = "Find nearby restaurants, online or from the offline cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh once and print venues ranked by distance
    Nearby {
        #[command(flatten)]
        position: PositionArgs,
        /// Skip the network and read the local cache
        #[arg(long)]
        offline: bool,
        /// Category searched for (defaults to the configured query)
        #[arg(long)]
        query: Option<String>,
    },
    /// Read "lat,lng" fixes from stdin and refresh on each one
    Follow {
        #[arg(long)]
        offline: bool,
    },
    /// Show the map focus for a cached venue
    Select {
        venue_id: String,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Save a default position used when --lat/--lng are omitted
    SetHome {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Show how many venues are cached and how old they are
    CacheInfo,
    /// Delete the local venue database
    ClearCache,
}

#[derive(Debug, clap::Args)]
struct PositionArgs {
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,
}

impl PositionArgs {
    /// Explicit coordinates win over the configured home position.
    fn resolve(&self, config: &Config) -> Result<Coordinate> {
        let coordinate = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => config
                .home
                .context("No position given: pass --lat/--lng or set \"home\" in the config file")?,
        };
        if !coordinate.is_valid() {
            anyhow::bail!("Invalid coordinate: {}", coordinate);
        }
        Ok(coordinate)
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Returns the file writer guard when file logging is enabled; it must be
/// held until exit so buffered lines are flushed.
fn init_tracing(config: &Config) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if config.log_to_file {
        let appender = tracing_appender::rolling::daily(config.log_dir()?, "foursphere.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn connectivity(config: &Config, offline: bool) -> Result<Arc<dyn ConnectivityGate>> {
    if offline {
        return Ok(Arc::new(StaticConnectivity::offline()));
    }
    let probe = HttpProbe::new(
        config.api_base_url.clone(),
        Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
    )?;
    Ok(Arc::new(probe))
}

fn build_orchestrator(
    config: &Config,
    location: Arc<dyn LocationProvider>,
    offline: bool,
) -> Result<Orchestrator<SqliteVenueStore>> {
    let db_path = config.database_path()?;
    let store = SqliteVenueStore::open(&db_path)
        .with_context(|| format!("Failed to open venue store at {}", db_path.display()))?;
    let client = FoursquareClient::new(config.client_settings())?;

    Ok(Orchestrator::new(
        store,
        Arc::new(client),
        location,
        connectivity(config, offline)?,
        config.pipeline_settings(),
    ))
}

/// Print the outcome of one cycle. A failure re-shows `previous` when there
/// is one.
fn report(result: &Result<RefreshOutcome, PipelineError>, previous: Option<&RankedVenues>) {
    let lines = match result {
        Ok(outcome) => display::render(outcome),
        Err(e) => {
            error!(error = %e, "Refresh failed");
            display::render_failure(&e.to_string(), previous)
        }
    };
    for line in lines {
        println!("{}", line);
    }
}

async fn nearby(config: Config, position: PositionArgs, offline: bool) -> Result<()> {
    let here = position.resolve(&config)?;
    let orchestrator = build_orchestrator(&config, Arc::new(FixedLocation::new(here)), offline)?;

    let result = orchestrator.refresh().await;
    report(&result, orchestrator.last_list().as_ref());
    result.map(|_| ()).context("Refresh failed")
}

async fn follow(config: Config, offline: bool) -> Result<()> {
    let tracker = LocationTracker::new();
    let orchestrator = build_orchestrator(&config, Arc::new(tracker.clone()), offline)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(fix) = Coordinate::parse_pair(line) else {
            warn!(input = line, "Ignoring unparseable location fix");
            eprintln!("Expected \"lat,lng\", got {:?}", line);
            continue;
        };
        tracker.publish(fix);
        info!(%fix, "Location changed, refreshing");
        let result = orchestrator.refresh().await;
        report(&result, orchestrator.last_list().as_ref());
        println!();
    }
    Ok(())
}

async fn select(config: Config, venue_id: String, position: PositionArgs) -> Result<()> {
    let here = position.resolve(&config)?;
    let orchestrator = build_orchestrator(&config, Arc::new(FixedLocation::new(here)), true)?;

    if let RefreshOutcome::NoData = orchestrator.refresh().await? {
        anyhow::bail!("The venue cache is empty");
    }
    let focus = orchestrator
        .select(&venue_id, here)
        .with_context(|| format!("Venue {} is not in the cache", venue_id))?;
    println!("{}", serde_json::to_string_pretty(&focus)?);
    Ok(())
}

fn set_home(lat: f64, lng: f64) -> Result<()> {
    let home = Coordinate::new(lat, lng);
    if !home.is_valid() {
        anyhow::bail!("Invalid coordinate: {}", home);
    }
    let mut stored = Config::load_stored()?;
    stored.home = Some(home);
    let path = stored.save()?;
    info!(%home, "Home position saved");
    println!("Home set to {} in {}", home, path.display());
    Ok(())
}

fn cache_info(config: &Config) -> Result<()> {
    let db_path = config.database_path()?;
    if !db_path.exists() {
        println!("No cache at {}", db_path.display());
        return Ok(());
    }
    let store = SqliteVenueStore::open(&db_path)?;
    println!("Cache:     {}", db_path.display());
    println!("Venues:    {}", store.count()?);
    match store.last_refreshed()? {
        Some(at) => {
            let now = Utc::now();
            let stale = if is_stale(at, now) { " (stale)" } else { "" };
            println!("Refreshed: {}{}", age_display(at, now), stale);
        }
        None => println!("Refreshed: never"),
    }
    Ok(())
}

fn clear_cache(config: &Config) -> Result<()> {
    let db_path = config.database_path()?;
    if db_path.exists() {
        std::fs::remove_file(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        info!(path = %db_path.display(), "Venue cache cleared");
        println!("Removed {}", db_path.display());
    } else {
        println!("Nothing to clear");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;
    let _log_guard = init_tracing(&config)?;
    info!("Foursphere starting");

    match cli.command {
        Commands::Nearby {
            position,
            offline,
            query,
        } => {
            let mut config = config;
            if let Some(query) = query {
                config.query = query;
            }
            nearby(config, position, offline).await
        }
        Commands::Follow { offline } => follow(config, offline).await,
        Commands::Select { venue_id, position } => select(config, venue_id, position).await,
        Commands::SetHome { lat, lng } => set_home(lat, lng),
        Commands::CacheInfo => cache_info(&config),
        Commands::ClearCache => clear_cache(&config),
    }
}
