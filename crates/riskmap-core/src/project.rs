//! Output rows and the facility projection.
//!
//! A [`DateArtifact`] is everything written for one processed date: one
//! [`RegionRiskRow`] per region that observed the date, plus one
//! [`FacilityRiskRow`] per catalog facility. Facility rows are a join on the
//! region rows, never an independent computation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  classify::{Tier, classify},
  region::{Facility, FacilityId, Region, RegionCatalog, RegionId},
  rolling::{DailyRates, FeatureRecord},
};

// ─── Region rows ─────────────────────────────────────────────────────────────

/// One persisted row per (region, date). Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRiskRow {
  pub region_id:                RegionId,
  pub region_name:              String,
  pub region_code:              String,
  pub tier:                     Tier,
  pub population:               u64,
  pub cases_per_100k:           f64,
  pub rolling7_cases_per_100k:  f64,
  pub deaths_per_100k:          f64,
  pub rolling7_deaths_per_100k: f64,
  pub pct_at_least_one_dose:    f64,
  pub pct_fully_vaccinated:     f64,
}

impl RegionRiskRow {
  /// Classifies `features` and attaches the region's identity.
  pub fn new(region: &Region, population: u64, features: &FeatureRecord) -> Self {
    Self {
      region_id:                region.region_id.clone(),
      region_name:              region.name.clone(),
      region_code:              region.code.clone(),
      tier:                     classify(features),
      population,
      cases_per_100k:           features.cases_per_100k,
      rolling7_cases_per_100k:  features.rolling7_cases_per_100k,
      deaths_per_100k:          features.deaths_per_100k,
      rolling7_deaths_per_100k: features.rolling7_deaths_per_100k,
      pct_at_least_one_dose:    features.pct_at_least_one_dose,
      pct_fully_vaccinated:     features.pct_fully_vaccinated,
    }
  }

  pub fn features(&self) -> FeatureRecord {
    FeatureRecord {
      cases_per_100k:           self.cases_per_100k,
      deaths_per_100k:          self.deaths_per_100k,
      rolling7_cases_per_100k:  self.rolling7_cases_per_100k,
      rolling7_deaths_per_100k: self.rolling7_deaths_per_100k,
      pct_at_least_one_dose:    self.pct_at_least_one_dose,
      pct_fully_vaccinated:     self.pct_fully_vaccinated,
    }
  }

  /// The single-day values an incremental run reads back.
  pub fn daily_rates(&self) -> DailyRates { self.features().daily_rates() }
}

// ─── Facility rows ───────────────────────────────────────────────────────────

/// A facility joined with its owning region's row for one date.
///
/// Every projected field is `None` when the region has no row for the date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRiskRow {
  pub facility_id:              FacilityId,
  pub facility_name:            String,
  pub region_id:                RegionId,
  pub region_code:              Option<String>,
  pub county_id:                Option<String>,
  pub zip_code:                 Option<String>,
  pub latitude:                 Option<f64>,
  pub longitude:                Option<f64>,
  pub tier:                     Option<Tier>,
  pub rolling7_cases_per_100k:  Option<f64>,
  pub rolling7_deaths_per_100k: Option<f64>,
  pub pct_at_least_one_dose:    Option<f64>,
  pub pct_fully_vaccinated:     Option<f64>,
}

impl FacilityRiskRow {
  pub fn project(facility: &Facility, region: Option<&RegionRiskRow>) -> Self {
    Self {
      facility_id:              facility.facility_id.clone(),
      facility_name:            facility.name.clone(),
      region_id:                facility.region_id.clone(),
      region_code:              region.map(|r| r.region_code.clone()),
      county_id:                facility.county_id.clone(),
      zip_code:                 facility.zip_code.clone(),
      latitude:                 facility.latitude,
      longitude:                facility.longitude,
      tier:                     region.map(|r| r.tier),
      rolling7_cases_per_100k:  region.map(|r| r.rolling7_cases_per_100k),
      rolling7_deaths_per_100k: region.map(|r| r.rolling7_deaths_per_100k),
      pct_at_least_one_dose:    region.map(|r| r.pct_at_least_one_dose),
      pct_fully_vaccinated:     region.map(|r| r.pct_fully_vaccinated),
    }
  }
}

/// Project region rows onto every facility in `facilities`.
pub fn project_facilities<'a>(
  facilities: impl IntoIterator<Item = &'a Facility>,
  regions: &[RegionRiskRow],
) -> Vec<FacilityRiskRow> {
  let by_id: BTreeMap<&RegionId, &RegionRiskRow> =
    regions.iter().map(|r| (&r.region_id, r)).collect();
  facilities
    .into_iter()
    .map(|f| FacilityRiskRow::project(f, by_id.get(&f.region_id).copied()))
    .collect()
}

// ─── Date artifact ───────────────────────────────────────────────────────────

/// Everything produced for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateArtifact {
  pub date:       NaiveDate,
  /// Sorted by region id.
  pub regions:    Vec<RegionRiskRow>,
  /// Sorted by facility id.
  pub facilities: Vec<FacilityRiskRow>,
}

impl DateArtifact {
  /// Sorts `regions` and projects them onto the catalog's facilities.
  pub fn assemble(
    date: NaiveDate,
    catalog: &RegionCatalog,
    mut regions: Vec<RegionRiskRow>,
  ) -> Self {
    regions.sort_by(|a, b| a.region_id.cmp(&b.region_id));
    let facilities = project_facilities(catalog.facilities(), &regions);
    Self { date, regions, facilities }
  }

  pub fn region(&self, id: &RegionId) -> Option<&RegionRiskRow> {
    self
      .regions
      .binary_search_by(|r| r.region_id.cmp(id))
      .ok()
      .map(|idx| &self.regions[idx])
  }
}
