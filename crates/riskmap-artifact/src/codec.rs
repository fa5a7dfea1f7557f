//! CSV encoding of artifact rows.
//!
//! Headers are written explicitly so an empty table still carries its column
//! names. Floats are written in shortest round-trip form, so a value read
//! back is bit-identical to the one written.

use serde::{Serialize, de::DeserializeOwned};

pub const REGION_COLUMNS: [&str; 11] = [
  "region_id",
  "region_name",
  "region_code",
  "tier",
  "population",
  "cases_per_100k",
  "rolling7_cases_per_100k",
  "deaths_per_100k",
  "rolling7_deaths_per_100k",
  "pct_at_least_one_dose",
  "pct_fully_vaccinated",
];

pub const FACILITY_COLUMNS: [&str; 13] = [
  "facility_id",
  "facility_name",
  "region_id",
  "region_code",
  "county_id",
  "zip_code",
  "latitude",
  "longitude",
  "tier",
  "rolling7_cases_per_100k",
  "rolling7_deaths_per_100k",
  "pct_at_least_one_dose",
  "pct_fully_vaccinated",
];

pub fn encode<T: Serialize>(
  columns: &[&str],
  rows: &[T],
) -> Result<Vec<u8>, csv::Error> {
  let mut writer = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(Vec::new());
  writer.write_record(columns)?;
  for row in rows {
    writer.serialize(row)?;
  }
  writer.into_inner().map_err(|e| e.into_error().into())
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, csv::Error> {
  csv::Reader::from_reader(bytes).deserialize().collect()
}
