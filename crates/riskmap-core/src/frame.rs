//! Per-region columnar frames.
//!
//! Each pass takes ownership of the previous frame and returns a new one with
//! extra columns appended: series → deltas → rates → rolling. Columns are
//! never rewritten once appended, and frames of different regions share
//! nothing, so regions can be processed in any order.

use chrono::NaiveDate;

use crate::{
  Result,
  config::RunConfig,
  delta::{DeltaRecord, derive_deltas},
  region::{Region, RegionId},
  rolling::{DailyRates, FeatureRecord, Rolling, trailing},
  series::{DailyCounterRecord, DailyCounters},
};

// ─── Series ──────────────────────────────────────────────────────────────────

/// One region's cumulative history, in the order the provider returned it.
#[derive(Debug, Clone)]
pub struct SeriesFrame {
  region_id:  RegionId,
  population: u64,
  dates:      Vec<NaiveDate>,
  counters:   Vec<DailyCounters>,
}

impl SeriesFrame {
  /// Resolves the population denominator up front so every later column
  /// shares it. Records belonging to other regions are ignored.
  pub fn new(
    region: &Region,
    config: &RunConfig,
    history: &[DailyCounterRecord],
  ) -> Result<Self> {
    let population = region.population(config.population_basis)?;
    let (dates, counters): (Vec<_>, Vec<_>) = history
      .iter()
      .filter(|r| r.region_id == region.region_id)
      .map(|r| (r.date, r.counters))
      .unzip();
    Ok(Self {
      region_id: region.region_id.clone(),
      population,
      dates,
      counters,
    })
  }

  /// Appends the delta column. Fails if dates are not strictly increasing.
  pub fn with_deltas(self, config: &RunConfig) -> Result<DeltaFrame> {
    let deltas = derive_deltas(
      &self.region_id,
      self.dates.iter().copied().zip(&self.counters),
      config.delta_policy,
    )?;
    Ok(DeltaFrame { series: self, deltas })
  }
}

// ─── Deltas ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeltaFrame {
  series: SeriesFrame,
  deltas: Vec<DeltaRecord>,
}

impl DeltaFrame {
  pub fn deltas(&self) -> &[DeltaRecord] { &self.deltas }

  /// Appends the four single-day rate columns.
  pub fn with_rates(self) -> RateFrame {
    let population = self.series.population;
    let rates = self
      .deltas
      .iter()
      .zip(&self.series.counters)
      .map(|(d, c)| DailyRates::compute(d, c, population))
      .collect();
    RateFrame { deltas: self, rates }
  }
}

// ─── Rates ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RateFrame {
  deltas: DeltaFrame,
  rates:  Vec<DailyRates>,
}

impl RateFrame {
  pub fn rates(&self) -> &[DailyRates] { &self.rates }

  /// Appends the two trailing-window columns using the ordinal rule.
  pub fn with_rolling(self) -> FeatureFrame {
    let cases: Vec<f64> = self.rates.iter().map(|r| r.cases_per_100k).collect();
    let deaths: Vec<f64> = self.rates.iter().map(|r| r.deaths_per_100k).collect();
    let rolling = trailing(&cases)
      .into_iter()
      .zip(trailing(&deaths))
      .map(|(cases_per_100k, deaths_per_100k)| Rolling {
        cases_per_100k,
        deaths_per_100k,
      })
      .collect();
    FeatureFrame { rates: self, rolling }
  }
}

// ─── Features ────────────────────────────────────────────────────────────────

/// The finished frame: every column needed to build [`FeatureRecord`]s.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
  rates:   RateFrame,
  rolling: Vec<Rolling>,
}

impl FeatureFrame {
  /// Batch mode: runs every pass over the region's full history.
  pub fn build(
    region: &Region,
    config: &RunConfig,
    history: &[DailyCounterRecord],
  ) -> Result<Self> {
    Ok(
      SeriesFrame::new(region, config, history)?
        .with_deltas(config)?
        .with_rates()
        .with_rolling(),
    )
  }

  fn series(&self) -> &SeriesFrame { &self.rates.deltas.series }

  pub fn region_id(&self) -> &RegionId { &self.series().region_id }

  pub fn population(&self) -> u64 { self.series().population }

  pub fn dates(&self) -> &[NaiveDate] { &self.series().dates }

  pub fn deltas(&self) -> &[DeltaRecord] { self.rates.deltas.deltas() }

  pub fn len(&self) -> usize { self.rolling.len() }

  pub fn is_empty(&self) -> bool { self.rolling.is_empty() }

  /// Ordinal position of `date`, if the region observed it.
  pub fn position(&self, date: NaiveDate) -> Option<usize> {
    self.dates().binary_search(&date).ok()
  }

  pub fn feature_at(&self, idx: usize) -> FeatureRecord {
    FeatureRecord::new(&self.rates.rates[idx], self.rolling[idx])
  }

  pub fn feature_on(&self, date: NaiveDate) -> Option<FeatureRecord> {
    self.position(date).map(|idx| self.feature_at(idx))
  }

  /// `(date, features)` pairs in date order.
  pub fn features(&self) -> impl Iterator<Item = (NaiveDate, FeatureRecord)> + '_ {
    self
      .dates()
      .iter()
      .enumerate()
      .map(|(idx, date)| (*date, self.feature_at(idx)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, region::tests::region};

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 7, d).unwrap() }

  fn history(region_id: &str, cumulative_cases: &[u64]) -> Vec<DailyCounterRecord> {
    cumulative_cases
      .iter()
      .enumerate()
      .map(|(i, cases)| {
        DailyCounterRecord::new(
          RegionId::new(region_id),
          day(i as u32 + 1),
          DailyCounters { cases: *cases, ..Default::default() },
        )
      })
      .collect()
  }

  #[test]
  fn end_to_end_single_step_rate() {
    let frame = FeatureFrame::build(
      &region("1", 100_000),
      &RunConfig::default(),
      &history("1", &[50, 65]),
    )
    .unwrap();
    assert_eq!(frame.deltas()[1].new_cases, 15);
    assert!((frame.feature_at(1).cases_per_100k - 15.0).abs() < 1e-9);
  }

  #[test]
  fn ramp_of_new_cases_reaches_full_window() {
    // Daily new cases 1..=7 expressed as cumulative counts.
    let cumulative = [1, 3, 6, 10, 15, 21, 28];
    let frame = FeatureFrame::build(
      &region("1", 1_000_000),
      &RunConfig::default(),
      &history("1", &cumulative),
    )
    .unwrap();

    for (idx, (_, f)) in frame.features().enumerate().take(6) {
      assert_eq!(f.rolling7_cases_per_100k, f.cases_per_100k, "idx {idx}");
    }
    let last = frame.feature_at(6);
    assert!((last.rolling7_cases_per_100k - 0.4).abs() < 1e-12);
  }

  #[test]
  fn window_is_ordinal_across_calendar_gaps() {
    let dates = [1, 2, 5, 6, 9, 10, 20, 21];
    let records: Vec<_> = dates
      .iter()
      .enumerate()
      .map(|(i, d)| {
        DailyCounterRecord::new(
          RegionId::new("1"),
          day(*d),
          DailyCounters { deaths: (i as u64 + 1) * 10, ..Default::default() },
        )
      })
      .collect();
    let frame =
      FeatureFrame::build(&region("1", 100_000), &RunConfig::default(), &records)
        .unwrap();

    let daily: Vec<f64> = frame.features().map(|(_, f)| f.deaths_per_100k).collect();
    let expected = daily[1..=7].iter().sum::<f64>() / 7.0;
    let got = frame.feature_on(day(21)).unwrap().rolling7_deaths_per_100k;
    assert!((got - expected).abs() < 1e-12);
  }

  #[test]
  fn short_history_never_averages() {
    let frame = FeatureFrame::build(
      &region("1", 1_000),
      &RunConfig::default(),
      &history("1", &[4, 9, 9]),
    )
    .unwrap();
    assert_eq!(frame.len(), 3);
    assert!(frame.features().all(|(_, f)| f.rolling7_cases_per_100k == f.cases_per_100k));
  }

  #[test]
  fn vaccination_percentages_use_cumulative_counts() {
    let records = [DailyCounterRecord::new(
      RegionId::new("1"),
      day(1),
      DailyCounters {
        cases:            0,
        deaths:           0,
        first_dose:       450,
        fully_vaccinated: 125,
      },
    )];
    let frame =
      FeatureFrame::build(&region("1", 1_000), &RunConfig::default(), &records).unwrap();
    let f = frame.feature_at(0);
    assert!((f.pct_at_least_one_dose - 45.0).abs() < 1e-9);
    assert_eq!(f.pct_fully_vaccinated, 12.5);
  }

  #[test]
  fn unsorted_history_is_a_precondition_failure() {
    let mut records = history("1", &[1, 2, 3]);
    records.swap(0, 2);
    let err =
      FeatureFrame::build(&region("1", 1_000), &RunConfig::default(), &records)
        .unwrap_err();
    assert!(matches!(err, Error::OutOfOrder { .. }));
  }

  #[test]
  fn foreign_records_are_ignored() {
    let mut records = history("1", &[1, 2]);
    records.extend(history("2", &[100]));
    let frame =
      FeatureFrame::build(&region("1", 1_000), &RunConfig::default(), &records).unwrap();
    assert_eq!(frame.len(), 2);
  }
}
