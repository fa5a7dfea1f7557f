//! `riskmap`: import feeds, compute per-date risk artifacts, and serve them.
//!
//! # Usage
//!
//! ```text
//! riskmap import --regions regions.csv --facilities facilities.csv \
//!                --cases us-states.csv --vaccinations vaccines.csv
//! riskmap batch
//! riskmap append --date 2021-09-01
//! riskmap classify --cases-7d 12.5 --deaths-7d 0.2 --first-dose-pct 70 --full-pct 55
//! riskmap serve
//! ```
//!
//! Settings come from `riskmap.toml` (or `--config`) and `RISKMAP_*`
//! environment variables.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "riskmap", version, about = "Daily regional COVID risk tiers")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "riskmap.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load catalog and series feeds into the store.
  Import {
    /// Region catalog CSV.
    #[arg(long, value_name = "FILE")]
    regions:      Option<PathBuf>,
    /// Facility CSV.
    #[arg(long, value_name = "FILE")]
    facilities:   Option<PathBuf>,
    /// Cumulative case/death feed.
    #[arg(long, value_name = "FILE")]
    cases:        Option<PathBuf>,
    /// Cumulative vaccination feed; joined onto the case feed.
    #[arg(long, value_name = "FILE", requires = "cases")]
    vaccinations: Option<PathBuf>,
  },

  /// Recompute every date from full history.
  Batch,

  /// Compute one date incrementally from the previous six artifacts.
  Append {
    /// Target date; defaults to the day after the latest artifact.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,
  },

  /// Classify a set of windowed values and print the breakdown as JSON.
  Classify {
    #[arg(long = "cases-7d")]
    cases_7d:       f64,
    #[arg(long = "deaths-7d")]
    deaths_7d:      f64,
    #[arg(long = "first-dose-pct")]
    first_dose_pct: f64,
    #[arg(long = "full-pct")]
    full_pct:       f64,
  },

  /// Serve the JSON query API over the artifact directory.
  Serve,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
  riskmap_core::series::parse_date(s).map_err(|e| e.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = || Settings::load(&args.config);

  match args.command {
    Command::Import { regions, facilities, cases, vaccinations } => {
      let paths = commands::ImportPaths { regions, facilities, cases, vaccinations };
      commands::import(&settings()?, paths).await
    }
    Command::Batch => commands::batch(&settings()?).await,
    Command::Append { date } => commands::append(&settings()?, date).await,
    Command::Classify { cases_7d, deaths_7d, first_dose_pct, full_pct } => {
      commands::classify(cases_7d, deaths_7d, first_dose_pct, full_pct)
    }
    Command::Serve => commands::serve(&settings()?).await,
  }
}
