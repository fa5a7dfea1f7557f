//! Subcommand implementations.

use std::{
  fs::File,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use riskmap_artifact::ArtifactDir;
use riskmap_core::{
  classify::{ClassifyInput, breakdown},
  pipeline::{Pipeline, RunReport},
  region::RegionCatalog,
  store::SeriesStore,
};
use riskmap_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::settings::Settings;

async fn open_store(settings: &Settings) -> Result<SqliteStore> {
  SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))
}

fn open_feed(path: &Path) -> Result<File> {
  File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

// ─── Import ───────────────────────────────────────────────────────────────────

pub struct ImportPaths {
  pub regions:      Option<PathBuf>,
  pub facilities:   Option<PathBuf>,
  pub cases:        Option<PathBuf>,
  pub vaccinations: Option<PathBuf>,
}

pub async fn import(settings: &Settings, paths: ImportPaths) -> Result<()> {
  let store = open_store(settings).await?;

  if let Some(path) = &paths.regions {
    let regions = riskmap_feeds::read_regions(open_feed(path)?)
      .with_context(|| format!("failed to read regions from {}", path.display()))?;
    let count = regions.len();
    for region in regions {
      store.upsert_region(region).await?;
    }
    info!(count, "regions imported");
  }

  if let Some(path) = &paths.facilities {
    let facilities = riskmap_feeds::read_facilities(open_feed(path)?)
      .with_context(|| format!("failed to read facilities from {}", path.display()))?;
    let count = facilities.len();
    for facility in facilities {
      store.upsert_facility(facility).await?;
    }
    info!(count, "facilities imported");
  }

  if let Some(path) = &paths.cases {
    let cases = riskmap_feeds::read_cases(open_feed(path)?)
      .with_context(|| format!("failed to read cases from {}", path.display()))?;
    let vaccinations = match &paths.vaccinations {
      Some(path) => riskmap_feeds::read_vaccinations(open_feed(path)?)
        .with_context(|| format!("failed to read vaccinations from {}", path.display()))?,
      None => Vec::new(),
    };

    let catalog = RegionCatalog::new(store.list_regions().await?, []);
    if catalog.is_empty() {
      warn!("region catalog is empty; every series row will be skipped");
    }
    let merged = riskmap_feeds::merge(&catalog, &cases, &vaccinations);
    let skipped = merged.skipped_rows();
    let written = store.record_counters(merged.records).await?;
    info!(written, skipped, "series imported");
  }

  Ok(())
}

// ─── Runs ─────────────────────────────────────────────────────────────────────

/// Log every written date and failure; fail the process if any region failed.
fn finish(report: RunReport) -> Result<()> {
  for written in &report.written {
    info!(
      date = %written.date,
      regions = written.regions,
      facilities = written.facilities,
      digest = %written.digest,
      "wrote artifact"
    );
  }
  for failure in &report.failures {
    error!(region = %failure.region_id, error = %failure.error, "region failed");
  }
  if !report.is_clean() {
    bail!("{} region(s) failed; see log for details", report.failures.len());
  }
  Ok(())
}

pub async fn batch(settings: &Settings) -> Result<()> {
  let store = open_store(settings).await?;
  let artifacts = ArtifactDir::new(&settings.artifact_dir);
  let report = Pipeline::new(&store, &artifacts, settings.run_config())
    .batch()
    .await
    .context("batch run failed")?;
  finish(report)
}

pub async fn append(settings: &Settings, date: Option<NaiveDate>) -> Result<()> {
  let store = open_store(settings).await?;
  let artifacts = ArtifactDir::new(&settings.artifact_dir);
  let report = Pipeline::new(&store, &artifacts, settings.run_config())
    .append(date)
    .await
    .context("append run failed")?;
  finish(report)
}

// ─── Classify ─────────────────────────────────────────────────────────────────

pub fn classify(
  cases_7d: f64,
  deaths_7d: f64,
  first_dose_pct: f64,
  full_pct: f64,
) -> Result<()> {
  let result = breakdown(&ClassifyInput {
    rolling7_cases_per_100k:  cases_7d,
    rolling7_deaths_per_100k: deaths_7d,
    pct_at_least_one_dose:    first_dose_pct,
    pct_fully_vaccinated:     full_pct,
  });
  println!("{}", serde_json::to_string_pretty(&result)?);
  Ok(())
}

// ─── Serve ────────────────────────────────────────────────────────────────────

pub async fn serve(settings: &Settings) -> Result<()> {
  let artifacts = Arc::new(ArtifactDir::new(&settings.artifact_dir));
  let app = riskmap_api::api_router(artifacts);
  let address = settings.address();

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
