//! Region and facility catalog CSVs.
//!
//! Headers match the field names of [`Region`] and [`Facility`]; empty
//! optional columns read as `None`.

use std::io::Read;

use riskmap_core::region::{Facility, Region};
use tracing::debug;

use crate::{Error, Result, row_number};

const REGIONS: &str = "regions";
const FACILITIES: &str = "facilities";

/// `region_id,name,code,population_2020,population_2021`
pub fn read_regions(input: impl Read) -> Result<Vec<Region>> {
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
  let mut regions = Vec::new();
  for (index, row) in reader.deserialize::<Region>().enumerate() {
    let region = row?;
    if region.region_id.as_str().is_empty() {
      return Err(Error::InvalidRow {
        feed:    REGIONS,
        row:     row_number(index),
        message: "empty region_id".to_owned(),
      });
    }
    regions.push(region);
  }
  debug!(count = regions.len(), "regions read");
  Ok(regions)
}

/// `facility_id,name,region_id,county_id,zip_code,latitude,longitude`
pub fn read_facilities(input: impl Read) -> Result<Vec<Facility>> {
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
  let mut facilities = Vec::new();
  for (index, row) in reader.deserialize::<Facility>().enumerate() {
    let facility = row?;
    if facility.facility_id.as_str().is_empty() {
      return Err(Error::InvalidRow {
        feed:    FACILITIES,
        row:     row_number(index),
        message: "empty facility_id".to_owned(),
      });
    }
    facilities.push(facility);
  }
  debug!(count = facilities.len(), "facilities read");
  Ok(facilities)
}
