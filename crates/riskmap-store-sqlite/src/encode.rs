//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Dates are stored as zero-padded `YYYY-MM-DD` text so that `ORDER BY date`
//! is chronological. Counts are stored as signed 64-bit integers.

use chrono::NaiveDate;
use riskmap_core::{
  region::{Facility, FacilityId, Region, RegionId},
  series::{DailyCounterRecord, DailyCounters, format_date, parse_date},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { format_date(date) }

pub fn decode_date(s: &str) -> Result<NaiveDate> { Ok(parse_date(s)?) }

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::CountRange(n.to_string()))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::CountRange(n.to_string()))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Columns read directly from a `regions` row.
pub struct RawRegion {
  pub region_id:       String,
  pub name:            String,
  pub code:            String,
  pub population_2020: i64,
  pub population_2021: i64,
}

impl RawRegion {
  pub fn into_region(self) -> Result<Region> {
    Ok(Region {
      region_id:       RegionId(self.region_id),
      name:            self.name,
      code:            self.code,
      population_2020: decode_count(self.population_2020)?,
      population_2021: decode_count(self.population_2021)?,
    })
  }
}

/// Columns read directly from a `facilities` row. Every column maps
/// one-to-one, so no decoding can fail.
pub struct RawFacility {
  pub facility_id: String,
  pub name:        String,
  pub region_id:   String,
  pub county_id:   Option<String>,
  pub zip_code:    Option<String>,
  pub latitude:    Option<f64>,
  pub longitude:   Option<f64>,
}

impl RawFacility {
  pub fn into_facility(self) -> Facility {
    Facility {
      facility_id: FacilityId(self.facility_id),
      name:        self.name,
      region_id:   RegionId(self.region_id),
      county_id:   self.county_id,
      zip_code:    self.zip_code,
      latitude:    self.latitude,
      longitude:   self.longitude,
    }
  }
}

/// Columns read directly from a `daily_counters` row.
pub struct RawCounters {
  pub region_id:        String,
  pub date:             String,
  pub cases:            i64,
  pub deaths:           i64,
  pub first_dose:       i64,
  pub fully_vaccinated: i64,
}

impl RawCounters {
  pub fn into_record(self) -> Result<DailyCounterRecord> {
    Ok(DailyCounterRecord {
      region_id: RegionId(self.region_id),
      date:      decode_date(&self.date)?,
      counters:  DailyCounters {
        cases:            decode_count(self.cases)?,
        deaths:           decode_count(self.deaths)?,
        first_dose:       decode_count(self.first_dose)?,
        fully_vaccinated: decode_count(self.fully_vaccinated)?,
      },
    })
  }
}

/// A counter row ready to bind: `(region_id, date, cases, deaths, first_dose,
/// fully_vaccinated)`.
pub type EncodedCounters = (String, String, i64, i64, i64, i64);

pub fn encode_counters(record: &DailyCounterRecord) -> Result<EncodedCounters> {
  let c = &record.counters;
  Ok((
    record.region_id.as_str().to_owned(),
    encode_date(record.date),
    encode_count(c.cases)?,
    encode_count(c.deaths)?,
    encode_count(c.first_dose)?,
    encode_count(c.fully_vaccinated)?,
  ))
}
