//! Raw cumulative counters and the date format shared by every artifact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, region::RegionId};

/// `YYYY-MM-DD`, zero-padded, so lexicographic order equals date order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
  date.format(DATE_FORMAT).to_string()
}

/// Parse a strictly formatted `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  // chrono accepts unpadded fields; the artifact contract does not.
  if s.len() != 10 {
    return Err(Error::InvalidDate(s.to_owned()));
  }
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// Cumulative counters for one region on one date. Provider-guaranteed
/// non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
  pub cases:            u64,
  pub deaths:           u64,
  pub first_dose:       u64,
  pub fully_vaccinated: u64,
}

/// One row of the raw series store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounterRecord {
  pub region_id: RegionId,
  pub date:      NaiveDate,
  pub counters:  DailyCounters,
}

impl DailyCounterRecord {
  pub fn new(region_id: RegionId, date: NaiveDate, counters: DailyCounters) -> Self {
    Self { region_id, date, counters }
  }
}
