//! Batch and incremental runs.
//!
//! [`run_batch`] and [`run_incremental`] are pure: they take already-loaded
//! inputs and return artifacts plus per-region failures. [`Pipeline`] wires
//! them to a [`SeriesStore`] and an [`ArtifactStore`].
//!
//! A failing region never stops the others. Its error is reported in
//! [`RegionFailure`] and it gets no freshly computed row; nothing is
//! zero-filled in its place. When persisting, a failed region's previously
//! written row for the date is carried over unchanged, and an append refuses
//! to write a date on which some failed region would be left without a row.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  config::RunConfig,
  delta::derive_delta,
  error::storage,
  frame::FeatureFrame,
  project::{DateArtifact, RegionRiskRow},
  region::{Region, RegionCatalog, RegionId},
  rolling::{DailyRates, FeatureRecord, PriorRates, PriorWindow, incremental, prior_dates},
  series::DailyCounterRecord,
  store::{ArtifactStore, SeriesStore},
};

/// A region whose unit of work was aborted.
#[derive(Debug)]
pub struct RegionFailure {
  pub region_id: RegionId,
  pub error:     Error,
}

// ─── Batch ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BatchOutput {
  /// One artifact per date observed by at least one region, ascending.
  pub artifacts: Vec<DateArtifact>,
  pub failures:  Vec<RegionFailure>,
}

/// Full-history batch run over every catalog region.
///
/// `histories` holds each region's records sorted by date. Regions without an
/// entry produce no rows; histories for ids not in the catalog are ignored.
pub fn run_batch(
  catalog: &RegionCatalog,
  histories: &BTreeMap<RegionId, Vec<DailyCounterRecord>>,
  config: &RunConfig,
) -> BatchOutput {
  let mut by_date: BTreeMap<NaiveDate, Vec<RegionRiskRow>> = BTreeMap::new();
  let mut failures = Vec::new();

  for region in catalog.regions() {
    let history = histories
      .get(&region.region_id)
      .map(Vec::as_slice)
      .unwrap_or_default();
    match FeatureFrame::build(region, config, history) {
      Ok(frame) => {
        for (date, features) in frame.features() {
          by_date
            .entry(date)
            .or_default()
            .push(RegionRiskRow::new(region, frame.population(), &features));
        }
      }
      Err(error) => failures.push(RegionFailure {
        region_id: region.region_id.clone(),
        error,
      }),
    }
  }

  let artifacts = by_date
    .into_iter()
    .map(|(date, rows)| DateArtifact::assemble(date, catalog, rows))
    .collect();
  BatchOutput { artifacts, failures }
}

/// Batch-mode row for a single date, computed from the region's full history.
/// `Ok(None)` if the region did not observe `date`.
pub fn batch_row(
  region: &Region,
  history: &[DailyCounterRecord],
  date: NaiveDate,
  config: &RunConfig,
) -> Result<Option<RegionRiskRow>> {
  let frame = FeatureFrame::build(region, config, history)?;
  Ok(
    frame
      .feature_on(date)
      .map(|f| RegionRiskRow::new(region, frame.population(), &f)),
  )
}

// ─── Incremental ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct IncrementalOutput {
  pub artifact: DateArtifact,
  pub failures: Vec<RegionFailure>,
  /// Regions with no counters for the target date.
  pub absent:   Vec<RegionId>,
}

/// Incremental row for `date`.
///
/// `tail` is the region's raw history through `date`, ascending; only its
/// last two records are read. `Ok(None)` if the region has no record for
/// `date`.
pub fn incremental_row(
  region: &Region,
  tail: &[DailyCounterRecord],
  date: NaiveDate,
  prior: &impl PriorRates,
  config: &RunConfig,
) -> Result<Option<RegionRiskRow>> {
  let Some((current, rest)) = tail.split_last() else {
    return Ok(None);
  };
  if current.date != date {
    return Ok(None);
  }

  let population = region.population(config.population_basis)?;
  let delta = derive_delta(
    &region.region_id,
    rest.last().map(|p| (p.date, &p.counters)),
    (current.date, &current.counters),
    config.delta_policy,
  )?;
  let rates = DailyRates::compute(&delta, &current.counters, population);
  let rolling = incremental(&region.region_id, date, &rates, prior)?;
  let features = FeatureRecord::new(&rates, rolling);
  Ok(Some(RegionRiskRow::new(region, population, &features)))
}

/// Incremental run for one date over every catalog region.
pub fn run_incremental(
  catalog: &RegionCatalog,
  date: NaiveDate,
  tails: &BTreeMap<RegionId, Vec<DailyCounterRecord>>,
  prior: &impl PriorRates,
  config: &RunConfig,
) -> IncrementalOutput {
  let mut rows = Vec::new();
  let mut failures = Vec::new();
  let mut absent = Vec::new();

  for region in catalog.regions() {
    let tail = tails
      .get(&region.region_id)
      .map(Vec::as_slice)
      .unwrap_or_default();
    match incremental_row(region, tail, date, prior, config) {
      Ok(Some(row)) => rows.push(row),
      Ok(None) => absent.push(region.region_id.clone()),
      Err(error) => failures.push(RegionFailure {
        region_id: region.region_id.clone(),
        error,
      }),
    }
  }

  IncrementalOutput {
    artifact: DateArtifact::assemble(date, catalog, rows),
    failures,
    absent,
  }
}

// ─── Async pipeline ──────────────────────────────────────────────────────────

/// What a run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDate {
  pub date:       NaiveDate,
  pub digest:     String,
  pub regions:    usize,
  pub facilities: usize,
}

#[derive(Debug, Default)]
pub struct RunReport {
  pub written:  Vec<WrittenDate>,
  pub failures: Vec<RegionFailure>,
}

impl RunReport {
  pub fn is_clean(&self) -> bool { self.failures.is_empty() }
}

/// Connects the pure runs to concrete stores.
pub struct Pipeline<'a, S, A> {
  series:    &'a S,
  artifacts: &'a A,
  config:    RunConfig,
}

impl<'a, S, A> Pipeline<'a, S, A>
where
  S: SeriesStore,
  A: ArtifactStore,
{
  pub fn new(series: &'a S, artifacts: &'a A, config: RunConfig) -> Self {
    Self { series, artifacts, config }
  }

  pub async fn load_catalog(&self) -> Result<RegionCatalog> {
    let regions = self.series.list_regions().await.map_err(storage)?;
    let facilities = self.series.list_facilities().await.map_err(storage)?;
    Ok(RegionCatalog::new(regions, facilities))
  }

  async fn write(&self, artifact: &DateArtifact) -> Result<WrittenDate> {
    let digest = self
      .artifacts
      .write_artifact(artifact)
      .await
      .map_err(storage)?;
    debug!(date = %artifact.date, %digest, "artifact written");
    Ok(WrittenDate {
      date: artifact.date,
      digest,
      regions: artifact.regions.len(),
      facilities: artifact.facilities.len(),
    })
  }

  /// Recompute and rewrite every date from full history.
  pub async fn batch(&self) -> Result<RunReport> {
    let catalog = self.load_catalog().await?;
    let mut histories = BTreeMap::new();
    for region in catalog.regions() {
      let history = self
        .series
        .region_history(&region.region_id)
        .await
        .map_err(storage)?;
      histories.insert(region.region_id.clone(), history);
    }
    info!(regions = catalog.len(), "running batch");

    let output = run_batch(&catalog, &histories, &self.config);

    let mut report = RunReport { written: Vec::new(), failures: output.failures };
    for artifact in output.artifacts {
      let artifact = if report.failures.is_empty() {
        artifact
      } else {
        let kept = self.persisted_rows(artifact.date, &report.failures).await?;
        if !kept.is_empty() {
          debug!(date = %artifact.date, kept = kept.len(), "keeping persisted rows of failed regions");
        }
        let mut rows = artifact.regions;
        rows.extend(kept);
        DateArtifact::assemble(artifact.date, &catalog, rows)
      };
      report.written.push(self.write(&artifact).await?);
    }
    info!(dates = report.written.len(), "batch complete");
    Ok(report)
  }

  /// The date an append run targets when none is given: the day after the
  /// latest artifact.
  pub async fn next_date(&self) -> Result<NaiveDate> {
    let latest = self
      .artifacts
      .latest_date()
      .await
      .map_err(storage)?
      .ok_or(Error::NoArtifacts)?;
    latest
      .checked_add_days(Days::new(1))
      .ok_or_else(|| Error::InvalidDate(latest.to_string()))
  }

  /// Per-day rates for the six calendar days before `date`, read back from
  /// persisted artifacts.
  pub async fn prior_window(&self, date: NaiveDate) -> Result<PriorWindow> {
    let mut window = PriorWindow::new();
    for day in prior_dates(date) {
      let Some(rows) = self.artifacts.region_rows(day).await.map_err(storage)?
      else {
        debug!(%day, "no artifact for prior day");
        continue;
      };
      for row in rows {
        let rates = row.daily_rates();
        window.insert(row.region_id, day, rates);
      }
    }
    Ok(window)
  }

  /// Rows already persisted for `date` that belong to a failed region.
  async fn persisted_rows(
    &self,
    date: NaiveDate,
    failures: &[RegionFailure],
  ) -> Result<Vec<RegionRiskRow>> {
    let persisted = self
      .artifacts
      .region_rows(date)
      .await
      .map_err(storage)?
      .unwrap_or_default();
    Ok(
      persisted
        .into_iter()
        .filter(|row| failures.iter().any(|f| f.region_id == row.region_id))
        .collect(),
    )
  }

  /// Append a single date using incremental mode.
  ///
  /// Nothing is written when a region fails and has no persisted row for
  /// `date`, so the latest artifact date only moves past fully covered days.
  pub async fn append(&self, date: Option<NaiveDate>) -> Result<RunReport> {
    let date = match date {
      Some(d) => d,
      None => self.next_date().await?,
    };
    let catalog = self.load_catalog().await?;
    let prior = self.prior_window(date).await?;

    let mut tails = BTreeMap::new();
    for region in catalog.regions() {
      let tail = self
        .series
        .region_history_through(&region.region_id, date, 2)
        .await
        .map_err(storage)?;
      tails.insert(region.region_id.clone(), tail);
    }
    info!(%date, regions = catalog.len(), prior = prior.len(), "running append");

    let output = run_incremental(&catalog, date, &tails, &prior, &self.config);
    for id in &output.absent {
      debug!(region = %id, %date, "no counters for date");
    }

    let mut rows = output.artifact.regions;
    let mut failures = Vec::new();
    for failure in output.failures {
      let window_gap = matches!(failure.error, Error::IncompletePriorWindow { .. });
      let region = catalog.region(&failure.region_id);
      match (window_gap && self.config.fallback_to_batch, region) {
        (true, Some(region)) => {
          info!(region = %region.region_id, %date, "prior window incomplete; using batch mode");
          let history = self
            .series
            .region_history(&region.region_id)
            .await
            .map_err(storage)?;
          match batch_row(region, &history, date, &self.config) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(error) => failures.push(RegionFailure {
              region_id: region.region_id.clone(),
              error,
            }),
          }
        }
        _ => failures.push(failure),
      }
    }
    if !failures.is_empty() {
      let kept = self.persisted_rows(date, &failures).await?;
      let uncovered = failures
        .iter()
        .filter(|f| !kept.iter().any(|r| r.region_id == f.region_id))
        .count();
      if uncovered > 0 {
        warn!(%date, uncovered, "failed regions have no persisted row; date not written");
        return Ok(RunReport { written: Vec::new(), failures });
      }
      rows.extend(kept);
    }

    let artifact = DateArtifact::assemble(date, &catalog, rows);
    let written = self.write(&artifact).await?;
    info!(%date, regions = written.regions, "append complete");
    Ok(RunReport { written: vec![written], failures })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::{
    classify::Tier,
    project::FacilityRiskRow,
    region::{
      Facility,
      tests::{facility, region},
    },
    series::DailyCounters,
  };

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 8, d).unwrap() }

  fn records(region_id: &str, cumulative: &[(u64, u64)]) -> Vec<DailyCounterRecord> {
    cumulative
      .iter()
      .enumerate()
      .map(|(i, (cases, deaths))| {
        DailyCounterRecord::new(
          RegionId::new(region_id),
          day(i as u32 + 1),
          DailyCounters {
            cases:            *cases,
            deaths:           *deaths,
            first_dose:       400 + i as u64,
            fully_vaccinated: 200 + i as u64,
          },
        )
      })
      .collect()
  }

  fn ten_days() -> Vec<(u64, u64)> {
    [3, 10, 12, 30, 31, 55, 60, 61, 90, 104]
      .into_iter()
      .zip([0, 0, 1, 1, 1, 2, 2, 4, 4, 5])
      .collect()
  }

  fn histories(
    entries: &[(&str, Vec<DailyCounterRecord>)],
  ) -> BTreeMap<RegionId, Vec<DailyCounterRecord>> {
    entries
      .iter()
      .map(|(id, h)| (RegionId::new(*id), h.clone()))
      .collect()
  }

  // ── Pure runs ───────────────────────────────────────────────────────────

  #[test]
  fn batch_emits_one_artifact_per_observed_date() {
    let catalog = RegionCatalog::new(
      [region("1", 1_000), region("2", 5_000)],
      [facility("f1", "1"), facility("f9", "404")],
    );
    let h = histories(&[
      ("1", records("1", &ten_days())),
      ("2", records("2", &ten_days()[..4])),
    ]);
    let out = run_batch(&catalog, &h, &RunConfig::default());
    assert!(out.failures.is_empty());
    assert_eq!(out.artifacts.len(), 10);
    assert_eq!(out.artifacts[0].regions.len(), 2);
    assert_eq!(out.artifacts[9].regions.len(), 1);
    assert!(out.artifacts[9].facilities[1].tier.is_none());
  }

  #[test]
  fn batch_isolates_failing_region() {
    let catalog = RegionCatalog::new([region("1", 1_000), region("2", 0)], []);
    let h = histories(&[
      ("1", records("1", &ten_days())),
      ("2", records("2", &ten_days())),
    ]);
    let out = run_batch(&catalog, &h, &RunConfig::default());
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].region_id.as_str(), "2");
    assert!(out.artifacts.iter().all(|a| a.regions.len() == 1));
  }

  #[test]
  fn batch_is_idempotent() {
    let catalog = RegionCatalog::new([region("1", 1_000)], [facility("f1", "1")]);
    let h = histories(&[("1", records("1", &ten_days()))]);
    let a = run_batch(&catalog, &h, &RunConfig::default());
    let b = run_batch(&catalog, &h, &RunConfig::default());
    assert_eq!(a.artifacts, b.artifacts);
  }

  #[test]
  fn incremental_agrees_with_batch() {
    let catalog = RegionCatalog::new([region("1", 2_500)], []);
    let full = records("1", &ten_days());
    let batch = run_batch(&catalog, &histories(&[("1", full.clone())]), &RunConfig::default());

    let mut prior = PriorWindow::new();
    for artifact in &batch.artifacts[3..9] {
      let row = &artifact.regions[0];
      prior.insert(row.region_id.clone(), artifact.date, row.daily_rates());
    }
    let tails = histories(&[("1", full[8..10].to_vec())]);
    let inc = run_incremental(&catalog, day(10), &tails, &prior, &RunConfig::default());
    assert!(inc.failures.is_empty());

    let expected = &batch.artifacts[9].regions[0];
    let got = &inc.artifact.regions[0];
    assert!((got.rolling7_cases_per_100k - expected.rolling7_cases_per_100k).abs() <= 1e-9);
    assert!((got.rolling7_deaths_per_100k - expected.rolling7_deaths_per_100k).abs() <= 1e-9);
    assert_eq!(got.cases_per_100k, expected.cases_per_100k);
    assert_eq!(got.tier, expected.tier);
  }

  #[test]
  fn incremental_reports_gap_and_absence() {
    let catalog = RegionCatalog::new([region("1", 1_000), region("2", 1_000)], []);
    let tails = histories(&[("1", records("1", &ten_days()[..2]))]);
    let out = run_incremental(
      &catalog,
      day(2),
      &tails,
      &PriorWindow::new(),
      &RunConfig::default(),
    );
    assert_eq!(out.failures.len(), 1);
    assert!(matches!(out.failures[0].error, Error::IncompletePriorWindow { .. }));
    assert_eq!(out.absent, [RegionId::new("2")]);
    assert!(out.artifact.regions.is_empty());
  }

  // ── Async pipeline over in-memory stores ────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("memory store error")]
  struct MemoryError;

  #[derive(Default)]
  struct MemorySeries {
    regions:    Mutex<Vec<Region>>,
    facilities: Mutex<Vec<Facility>>,
    counters:   Mutex<Vec<DailyCounterRecord>>,
  }

  impl SeriesStore for MemorySeries {
    type Error = MemoryError;

    async fn upsert_region(&self, region: Region) -> Result<(), MemoryError> {
      self.regions.lock().unwrap().push(region);
      Ok(())
    }

    async fn upsert_facility(&self, facility: Facility) -> Result<(), MemoryError> {
      self.facilities.lock().unwrap().push(facility);
      Ok(())
    }

    async fn list_regions(&self) -> Result<Vec<Region>, MemoryError> {
      Ok(self.regions.lock().unwrap().clone())
    }

    async fn list_facilities(&self) -> Result<Vec<Facility>, MemoryError> {
      Ok(self.facilities.lock().unwrap().clone())
    }

    async fn record_counters(
      &self,
      records: Vec<DailyCounterRecord>,
    ) -> Result<usize, MemoryError> {
      let n = records.len();
      self.counters.lock().unwrap().extend(records);
      Ok(n)
    }

    async fn region_history<'a>(
      &'a self,
      region: &'a RegionId,
    ) -> Result<Vec<DailyCounterRecord>, MemoryError> {
      let mut out: Vec<_> = self
        .counters
        .lock()
        .unwrap()
        .iter()
        .filter(|r| &r.region_id == region)
        .cloned()
        .collect();
      out.sort_by_key(|r| r.date);
      Ok(out)
    }

    async fn region_history_through<'a>(
      &'a self,
      region: &'a RegionId,
      through: NaiveDate,
      limit: usize,
    ) -> Result<Vec<DailyCounterRecord>, MemoryError> {
      let mut out = self.region_history(region).await?;
      out.retain(|r| r.date <= through);
      let skip = out.len().saturating_sub(limit);
      Ok(out.split_off(skip))
    }
  }

  #[derive(Default)]
  struct MemoryArtifacts {
    dates: Mutex<BTreeMap<NaiveDate, DateArtifact>>,
  }

  impl ArtifactStore for MemoryArtifacts {
    type Error = MemoryError;

    async fn write_artifact<'a>(
      &'a self,
      artifact: &'a DateArtifact,
    ) -> Result<String, MemoryError> {
      self.dates.lock().unwrap().insert(artifact.date, artifact.clone());
      Ok(format!("{}:{}", artifact.date, artifact.regions.len()))
    }

    async fn region_rows(
      &self,
      date: NaiveDate,
    ) -> Result<Option<Vec<RegionRiskRow>>, MemoryError> {
      Ok(self.dates.lock().unwrap().get(&date).map(|a| a.regions.clone()))
    }

    async fn facility_rows(
      &self,
      date: NaiveDate,
    ) -> Result<Option<Vec<FacilityRiskRow>>, MemoryError> {
      Ok(self.dates.lock().unwrap().get(&date).map(|a| a.facilities.clone()))
    }

    async fn digest(&self, date: NaiveDate) -> Result<Option<String>, MemoryError> {
      Ok(
        self
          .dates
          .lock()
          .unwrap()
          .get(&date)
          .map(|a| format!("{}:{}", a.date, a.regions.len())),
      )
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, MemoryError> {
      Ok(self.dates.lock().unwrap().keys().copied().collect())
    }

    async fn latest_date(&self) -> Result<Option<NaiveDate>, MemoryError> {
      Ok(self.dates.lock().unwrap().keys().next_back().copied())
    }
  }

  async fn seeded(days: usize) -> MemorySeries {
    let series = MemorySeries::default();
    series.upsert_region(region("1", 10_000)).await.unwrap();
    series.upsert_facility(facility("f1", "1")).await.unwrap();
    series
      .record_counters(records("1", &ten_days()[..days]))
      .await
      .unwrap();
    series
  }

  #[tokio::test]
  async fn append_extends_batch_output() {
    let series = seeded(9).await;
    let artifacts = MemoryArtifacts::default();
    let pipeline = Pipeline::new(&series, &artifacts, RunConfig::default());

    let report = pipeline.batch().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.written.len(), 9);

    series
      .record_counters(records("1", &ten_days())[9..].to_vec())
      .await
      .unwrap();
    assert_eq!(pipeline.next_date().await.unwrap(), day(10));

    let report = pipeline.append(None).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.written[0].date, day(10));

    let appended = artifacts.region_rows(day(10)).await.unwrap().unwrap();
    let expected = {
      let full = MemoryArtifacts::default();
      let full_series = seeded(10).await;
      Pipeline::new(&full_series, &full, RunConfig::default())
        .batch()
        .await
        .unwrap();
      full.region_rows(day(10)).await.unwrap().unwrap()
    };
    assert!(
      (appended[0].rolling7_cases_per_100k - expected[0].rolling7_cases_per_100k).abs()
        <= 1e-9
    );
    let facilities = artifacts.facility_rows(day(10)).await.unwrap().unwrap();
    assert_eq!(facilities[0].tier, Some(appended[0].tier));
  }

  #[tokio::test]
  async fn append_without_window_fails_or_falls_back() {
    let series = seeded(4).await;
    let artifacts = MemoryArtifacts::default();

    let strict = Pipeline::new(&series, &artifacts, RunConfig::default());
    let report = strict.append(Some(day(4))).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.written.is_empty());
    assert!(artifacts.latest_date().await.unwrap().is_none());

    let config = RunConfig { fallback_to_batch: true, ..RunConfig::default() };
    let lenient = Pipeline::new(&series, &artifacts, config);
    let report = lenient.append(Some(day(4))).await.unwrap();
    assert!(report.is_clean());
    let rows = artifacts.region_rows(day(4)).await.unwrap().unwrap();
    assert_eq!(rows.len(), 1);
    // Ordinal position 3: no averaging yet.
    assert_eq!(rows[0].rolling7_cases_per_100k, rows[0].cases_per_100k);
    assert!(Tier::new(rows[0].tier.get()).is_some());
  }

  #[tokio::test]
  async fn append_needs_a_start_date() {
    let series = seeded(2).await;
    let artifacts = MemoryArtifacts::default();
    let pipeline = Pipeline::new(&series, &artifacts, RunConfig::default());
    assert!(matches!(pipeline.append(None).await, Err(Error::NoArtifacts)));
  }

  #[tokio::test]
  async fn failed_append_leaves_latest_date_alone() {
    let series = seeded(9).await;
    let artifacts = MemoryArtifacts::default();
    let pipeline = Pipeline::new(&series, &artifacts, RunConfig::default());
    pipeline.batch().await.unwrap();
    series
      .record_counters(records("1", &ten_days())[9..].to_vec())
      .await
      .unwrap();
    artifacts.dates.lock().unwrap().remove(&day(7));

    let report = pipeline.append(None).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.written.is_empty());
    assert_eq!(artifacts.latest_date().await.unwrap(), Some(day(9)));
    assert!(artifacts.region_rows(day(10)).await.unwrap().is_none());
    assert_eq!(pipeline.next_date().await.unwrap(), day(10));
  }

  #[tokio::test]
  async fn failed_rerun_keeps_persisted_row() {
    let series = seeded(10).await;
    let artifacts = MemoryArtifacts::default();
    let pipeline = Pipeline::new(&series, &artifacts, RunConfig::default());
    pipeline.batch().await.unwrap();
    let before = artifacts.region_rows(day(10)).await.unwrap().unwrap();
    artifacts.dates.lock().unwrap().remove(&day(7));

    let report = pipeline.append(Some(day(10))).await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.written[0].regions, 1);
    assert_eq!(artifacts.region_rows(day(10)).await.unwrap().unwrap(), before);
  }

  #[tokio::test]
  async fn failed_batch_region_keeps_earlier_rows() {
    let series = seeded(5).await;
    series.upsert_region(region("2", 20_000)).await.unwrap();
    series
      .record_counters(records("2", &ten_days()[..5]))
      .await
      .unwrap();
    let artifacts = MemoryArtifacts::default();
    let pipeline = Pipeline::new(&series, &artifacts, RunConfig::default());
    assert!(pipeline.batch().await.unwrap().is_clean());
    let before = artifacts.region_rows(day(3)).await.unwrap().unwrap();

    series.regions.lock().unwrap()[1] = region("2", 0);
    let report = pipeline.batch().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.written.len(), 5);
    let after = artifacts.region_rows(day(3)).await.unwrap().unwrap();
    assert_eq!(after, before);
  }
}
