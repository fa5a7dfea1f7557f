//! Cumulative series feeds.
//!
//! Both feeds name regions by display name rather than id; [`merge`](crate::merge())
//! resolves names against the catalog.

use std::io::Read;

use chrono::NaiveDate;
use riskmap_core::series::parse_date;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result, row_number};

const CASES: &str = "cases";
const VACCINATIONS: &str = "vaccinations";

/// One row of the case/death feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRow {
  pub date:   NaiveDate,
  pub region: String,
  pub cases:  u64,
  pub deaths: u64,
}

#[derive(Deserialize)]
struct RawCase {
  date:   String,
  state:  String,
  cases:  u64,
  #[serde(default)]
  deaths: Option<u64>,
}

/// `date,state,fips,cases,deaths`; extra columns are ignored and an empty
/// `deaths` reads as 0.
pub fn read_cases(input: impl Read) -> Result<Vec<CaseRow>> {
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
  let mut rows = Vec::new();
  for (index, raw) in reader.deserialize::<RawCase>().enumerate() {
    let raw = raw?;
    rows.push(CaseRow {
      date:   feed_date(CASES, index, &raw.date)?,
      region: raw.state,
      cases:  raw.cases,
      deaths: raw.deaths.unwrap_or(0),
    });
  }
  debug!(count = rows.len(), "case rows read");
  Ok(rows)
}

/// One row of the vaccination feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationRow {
  pub date:             NaiveDate,
  pub region:           String,
  pub first_dose:       u64,
  pub fully_vaccinated: u64,
}

#[derive(Deserialize)]
struct RawVaccination {
  #[serde(rename = "Date")]
  date:             String,
  #[serde(rename = "Province_State")]
  state:            String,
  #[serde(rename = "People_at_least_one_dose", default)]
  first_dose:       Option<f64>,
  #[serde(rename = "People_fully_vaccinated", default)]
  fully_vaccinated: Option<f64>,
}

/// `Date,Province_State,People_at_least_one_dose,People_fully_vaccinated`.
///
/// Counts are published as decimals in places (`1234.0`) and are sometimes
/// blank; blanks read as 0.
pub fn read_vaccinations(input: impl Read) -> Result<Vec<VaccinationRow>> {
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
  let mut rows = Vec::new();
  for (index, raw) in reader.deserialize::<RawVaccination>().enumerate() {
    let raw = raw?;
    rows.push(VaccinationRow {
      date:             feed_date(VACCINATIONS, index, &raw.date)?,
      region:           raw.state,
      first_dose:       count(VACCINATIONS, index, raw.first_dose)?,
      fully_vaccinated: count(VACCINATIONS, index, raw.fully_vaccinated)?,
    });
  }
  debug!(count = rows.len(), "vaccination rows read");
  Ok(rows)
}

fn feed_date(feed: &'static str, index: usize, value: &str) -> Result<NaiveDate> {
  parse_date(value).map_err(|_| Error::InvalidDate {
    feed,
    row: row_number(index),
    value: value.to_owned(),
  })
}

fn count(feed: &'static str, index: usize, value: Option<f64>) -> Result<u64> {
  match value {
    None => Ok(0),
    Some(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
    Some(v) => Err(Error::InvalidRow {
      feed,
      row: row_number(index),
      message: format!("invalid count {v}"),
    }),
  }
}
