//! Offline load check and GeoJSON export.
//!
//! Runs the same load pipeline as the server, so any fatal load error shows
//! up here first, then writes the normalized neighborhood collection.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barrios::config::Config;
use barrios::geometry::{round_trip_deviation, WktParser};
use barrios::summary::Summary;
use barrios::Dataset;

/// Coordinate drift tolerated by the WKT round-trip check
const ROUND_TRIP_TOLERANCE: f64 = 1e-9;

#[derive(Parser, Debug)]
#[command(name = "normalize")]
#[command(about = "Validate the listings snapshot and export neighborhood GeoJSON")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listings CSV (overrides config)
    #[arg(long)]
    listings: Option<PathBuf>,

    /// Neighborhood polygons CSV (overrides config)
    #[arg(long)]
    neighborhoods: Option<PathBuf>,

    /// Pre-clustered listings CSV (overrides config)
    #[arg(long)]
    clustered: Option<PathBuf>,

    /// Where to write the FeatureCollection
    #[arg(short, long, default_value = "neighborhoods.geojson")]
    output: PathBuf,

    /// Re-serialize every shape to WKT and verify it parses back unchanged
    #[arg(long)]
    check_round_trip: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(path) = args.listings {
        config.data.listings = path;
    }
    if let Some(path) = args.neighborhoods {
        config.data.neighborhoods = path;
    }
    if args.clustered.is_some() {
        config.data.clustered = args.clustered;
    }

    let dataset = Dataset::load_from_paths(&config.data).context("Failed to load dataset")?;

    let summary = Summary::compute(&dataset, config.snapshot_year);
    info!(
        "{} listings, {} new construction",
        summary.total_listings, summary.new_construction_listings
    );
    if let Some(clustered) = dataset.clustered() {
        info!("{} pre-clustered listings", clustered.len());
    }
    if let Some(name) = &summary.busiest_neighborhood {
        info!("Most listings: {}", name);
    }
    if let Some(name) = &summary.priciest_neighborhood {
        info!("Highest mean price: {}", name);
    }

    if args.check_round_trip {
        let mut failures = 0;
        for neighborhood in dataset.neighborhoods() {
            let deviation = round_trip_deviation(&WktParser, &neighborhood.geometry)
                .with_context(|| format!("Re-parsing shape of '{}'", neighborhood.id))?;
            if deviation > ROUND_TRIP_TOLERANCE {
                warn!(
                    "Round trip of '{}' drifted by {}",
                    neighborhood.id, deviation
                );
                failures += 1;
            }
        }
        if failures > 0 {
            anyhow::bail!("{} neighborhood shapes failed the WKT round trip", failures);
        }
        info!(
            "All {} shapes survive the WKT round trip",
            dataset.neighborhoods().len()
        );
    }

    let body = serde_json::to_string(dataset.features())?;
    fs::write(&args.output, body)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        "Wrote {} features to {}",
        dataset.features().features.len(),
        args.output.display()
    );

    Ok(())
}
