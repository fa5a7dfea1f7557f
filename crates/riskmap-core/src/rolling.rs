//! Per-day rates and the 7-day trailing window.
//!
//! The window is ordinal: position `idx` in a region's own sorted dates, not
//! calendar distance. Positions 0..=5 take the single-day value unchanged;
//! from position 6 on, the value is the mean of positions `idx-6..=idx`.
//!
//! Batch mode applies that rule over a whole column ([`trailing`]).
//! Incremental mode ([`incremental`]) rebuilds the newest window from the six
//! persisted days before it, which must be contiguous calendar days. Both
//! modes sum the window in chronological order, so they agree exactly.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  delta::DeltaRecord,
  region::RegionId,
  series::DailyCounters,
};

/// Number of samples in a full window.
pub const WINDOW: usize = 7;

// ─── Rates ───────────────────────────────────────────────────────────────────

pub fn per_100k(count: i64, population: u64) -> f64 {
  count as f64 / population as f64 * 100_000.0
}

pub fn percent_of(count: u64, population: u64) -> f64 {
  count as f64 / population as f64 * 100.0
}

/// The single-day values computed once per (region, date) regardless of
/// window mode. These are what an artifact persists for later incremental
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRates {
  pub cases_per_100k:        f64,
  pub deaths_per_100k:       f64,
  pub pct_at_least_one_dose: f64,
  pub pct_fully_vaccinated:  f64,
}

impl DailyRates {
  pub fn compute(
    delta: &DeltaRecord,
    counters: &DailyCounters,
    population: u64,
  ) -> Self {
    Self {
      cases_per_100k:        per_100k(delta.new_cases, population),
      deaths_per_100k:       per_100k(delta.new_deaths, population),
      pct_at_least_one_dose: percent_of(counters.first_dose, population),
      pct_fully_vaccinated:  percent_of(counters.fully_vaccinated, population),
    }
  }
}

/// The complete feature vector for one region on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
  pub cases_per_100k:           f64,
  pub deaths_per_100k:          f64,
  pub rolling7_cases_per_100k:  f64,
  pub rolling7_deaths_per_100k: f64,
  pub pct_at_least_one_dose:    f64,
  pub pct_fully_vaccinated:     f64,
}

impl FeatureRecord {
  pub fn new(rates: &DailyRates, rolling: Rolling) -> Self {
    Self {
      cases_per_100k:           rates.cases_per_100k,
      deaths_per_100k:          rates.deaths_per_100k,
      rolling7_cases_per_100k:  rolling.cases_per_100k,
      rolling7_deaths_per_100k: rolling.deaths_per_100k,
      pct_at_least_one_dose:    rates.pct_at_least_one_dose,
      pct_fully_vaccinated:     rates.pct_fully_vaccinated,
    }
  }

  pub fn daily_rates(&self) -> DailyRates {
    DailyRates {
      cases_per_100k:        self.cases_per_100k,
      deaths_per_100k:       self.deaths_per_100k,
      pct_at_least_one_dose: self.pct_at_least_one_dose,
      pct_fully_vaccinated:  self.pct_fully_vaccinated,
    }
  }
}

/// Trailing values for the two windowed metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rolling {
  pub cases_per_100k:  f64,
  pub deaths_per_100k: f64,
}

// ─── Batch ───────────────────────────────────────────────────────────────────

fn window_mean(window: &[f64]) -> f64 {
  window.iter().sum::<f64>() / window.len() as f64
}

/// Trailing value at ordinal position `idx` of `values`.
pub fn trailing_at(values: &[f64], idx: usize) -> f64 {
  if idx + 1 < WINDOW {
    values[idx]
  } else {
    window_mean(&values[idx + 1 - WINDOW..=idx])
  }
}

/// Trailing values for a whole column.
pub fn trailing(values: &[f64]) -> Vec<f64> {
  (0..values.len()).map(|idx| trailing_at(values, idx)).collect()
}

// ─── Incremental ─────────────────────────────────────────────────────────────

/// Read access to per-day rates persisted by earlier runs.
pub trait PriorRates {
  fn prior_rates(&self, region: &RegionId, date: NaiveDate) -> Option<DailyRates>;
}

/// In-memory [`PriorRates`] keyed by (region, date).
#[derive(Debug, Clone, Default)]
pub struct PriorWindow {
  rates: BTreeMap<(RegionId, NaiveDate), DailyRates>,
}

impl PriorWindow {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, region: RegionId, date: NaiveDate, rates: DailyRates) {
    self.rates.insert((region, date), rates);
  }

  pub fn len(&self) -> usize { self.rates.len() }

  pub fn is_empty(&self) -> bool { self.rates.is_empty() }
}

impl PriorRates for PriorWindow {
  fn prior_rates(&self, region: &RegionId, date: NaiveDate) -> Option<DailyRates> {
    self.rates.get(&(region.clone(), date)).copied()
  }
}

/// The six calendar days before `date`, oldest first.
pub fn prior_dates(date: NaiveDate) -> Vec<NaiveDate> {
  (1..WINDOW as u64)
    .rev()
    .filter_map(|back| date.checked_sub_days(Days::new(back)))
    .collect()
}

/// Trailing values for `date` from `today`'s rates plus the six persisted
/// days before it.
///
/// Fails with [`Error::IncompletePriorWindow`] if any of those days is
/// missing; a shorter window would disagree with batch mode.
pub fn incremental(
  region: &RegionId,
  date: NaiveDate,
  today: &DailyRates,
  prior: &impl PriorRates,
) -> Result<Rolling> {
  let days = prior_dates(date);
  let mut cases = Vec::with_capacity(WINDOW);
  let mut deaths = Vec::with_capacity(WINDOW);
  let mut missing = Vec::new();

  for day in &days {
    match prior.prior_rates(region, *day) {
      Some(r) => {
        cases.push(r.cases_per_100k);
        deaths.push(r.deaths_per_100k);
      }
      None => missing.push(*day),
    }
  }
  if !missing.is_empty() || days.len() + 1 != WINDOW {
    return Err(Error::IncompletePriorWindow {
      region: region.clone(),
      date,
      missing,
    });
  }

  cases.push(today.cases_per_100k);
  deaths.push(today.deaths_per_100k);

  Ok(Rolling {
    cases_per_100k:  window_mean(&cases),
    deaths_per_100k: window_mean(&deaths),
  })
}
