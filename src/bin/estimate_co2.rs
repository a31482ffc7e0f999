//! Estimate tree CO2 stock from the command line
//!
//! Usage:
//!   cargo run --bin estimate_co2 -- tree --dbh 20 --height 10 --species "Grevillea robusta" --lat -0.42 --lon 36.95
//!   cargo run --bin estimate_co2 -- --format json batch monitoring_export.csv
//!
//! Reference data paths come from `--config <file.json>` or the
//! DATA_DIR / ZONES_PATH / ZONE_NAME_FIELD / SPECIES_COEFFICIENTS_PATH
//! environment variables.

use anyhow::Context;
use carbon_estimator_rust::explanation::{JsonFormatter, MarkdownFormatter};
use carbon_estimator_rust::{load_measurements, BiomassEstimator, EstimatorConfig, MeasurementInput};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "estimate_co2")]
#[command(version)]
#[command(about = "Estimate the CO2 stock of trees from field measurements", long_about = None)]
struct Cli {
    /// JSON configuration file with reference data paths
    #[arg(long, global = true, env = "ESTIMATOR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a single tree
    Tree {
        /// Diameter at breast height (cm)
        #[arg(long)]
        dbh: Option<f64>,

        /// Root collar diameter (cm), used when DBH is not given
        #[arg(long)]
        rcd: Option<f64>,

        /// Tree height (m)
        #[arg(long)]
        height: f64,

        /// Species name as recorded in the field
        #[arg(long)]
        species: Option<String>,

        /// Latitude (WGS84)
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude (WGS84)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Estimate every tree in a measurement CSV
    Batch {
        /// CSV with columns tree_id, dbh_cm, rcd_cm, height_m, species, latitude, longitude
        #[arg(value_name = "CSV")]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_estimator_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::from_env(),
    };
    tracing::debug!("Configuration: {:?}", config);

    let estimator = BiomassEstimator::from_config(&config);

    match cli.command {
        Commands::Tree {
            dbh,
            rcd,
            height,
            species,
            lat,
            lon,
        } => {
            let input = MeasurementInput {
                dbh_cm: dbh,
                height_m: height,
                rcd_cm: rcd,
                species,
                latitude: lat,
                longitude: lon,
            };
            let result = estimator.estimate(&input)?;

            match cli.format {
                OutputFormat::Markdown => {
                    print!("{}", MarkdownFormatter::format(&result, input.species.as_deref()))
                }
                OutputFormat::Json => println!("{}", JsonFormatter::format(&result)?),
            }
        }
        Commands::Batch { input } => {
            let records = load_measurements(&input)
                .with_context(|| format!("Failed to read measurement batch {:?}", input))?;
            let report = estimator.estimate_batch(&records);

            match cli.format {
                OutputFormat::Markdown => {
                    for entry in &report.entries {
                        let id = entry.tree_id.as_deref().unwrap_or("(no id)");
                        match (&entry.result, &entry.error) {
                            (Some(result), _) => println!("- {}: {:.2} kg CO₂", id, result.co2_kg),
                            (None, Some(error)) => println!("- {}: rejected ({})", id, error),
                            (None, None) => println!("- {}: rejected", id),
                        }
                    }
                    println!();
                    print!("{}", MarkdownFormatter::format_summary(&report.summary));
                }
                OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
            }
        }
    }

    Ok(())
}
