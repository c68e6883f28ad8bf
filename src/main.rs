use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tripfuel::config::TripFuelConfig;
use tripfuel::logging::init_logging;
use tripfuel::maps::{CachedMapsProvider, GoogleMapsClient, MapsProvider};
use tripfuel::{PersistentCache, StationCatalog, TripPlanner, web};

#[derive(Parser, Debug)]
#[command(name = "tripfuel")]
#[command(about = "Trip distance, fuel stop and fuel cost planner", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "TRIPFUEL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging for tripfuel
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Plan one trip and print it as JSON
    Plan {
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        finish: String,
    },
    /// List the cities covered by the fuel price table
    Locations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TripFuelConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    init_logging(&config.logging, cli.verbose);

    let catalog = Arc::new(
        StationCatalog::from_path(&config.stations.csv_path)
            .context("Failed to load fuel station table")?,
    );
    if let Some(source) = catalog.source() {
        info!(
            "{} fuel stations loaded from {}",
            catalog.len(),
            source.display()
        );
    }

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let planner = Arc::new(build_planner(&config, catalog)?);
            web::run(&config.server, planner).await?;
        }
        Commands::Plan { start, finish } => {
            let planner = build_planner(&config, catalog)?;
            let plan = planner
                .plan(&start, &finish)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Failed to plan trip from '{start}' to '{finish}'"))?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Locations => {
            for location in catalog.available_locations() {
                println!("{location}");
            }
        }
    }

    Ok(())
}

fn build_planner(config: &TripFuelConfig, catalog: Arc<StationCatalog>) -> Result<TripPlanner> {
    let google = GoogleMapsClient::new(&config.google).context("Failed to create maps client")?;

    let maps: Arc<dyn MapsProvider> = if config.cache.enabled {
        match PersistentCache::open(&config.cache.location) {
            Ok(cache) => {
                info!("Using maps cache at {}", config.cache.location);
                let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
                Arc::new(CachedMapsProvider::new(google, Arc::new(cache), ttl))
            }
            Err(e) => {
                warn!("Maps cache unavailable, continuing without it: {}", e);
                Arc::new(google)
            }
        }
    } else {
        Arc::new(google)
    };

    Ok(TripPlanner::new(
        maps,
        catalog,
        &config.vehicle,
        &config.planner,
    ))
}
