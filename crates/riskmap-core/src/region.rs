//! Static reference data: regions, their facilities, and the catalog that
//! holds both for the duration of a run.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, config::PopulationBasis};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque region identifier as assigned by the catalog provider.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RegionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Opaque facility identifier.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FacilityId(pub String);

impl FacilityId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FacilityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Region ──────────────────────────────────────────────────────────────────

/// A top-level administrative unit that accumulates daily counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
  pub region_id:       RegionId,
  pub name:            String,
  /// Short code, e.g. a postal abbreviation.
  pub code:            String,
  pub population_2020: u64,
  pub population_2021: u64,
}

impl Region {
  /// The normalisation denominator for `basis`. Zero is rejected: every rate
  /// for the region would be undefined.
  pub fn population(&self, basis: PopulationBasis) -> Result<u64> {
    let population = match basis {
      PopulationBasis::Year2020 => self.population_2020,
      PopulationBasis::Year2021 => self.population_2021,
    };
    if population == 0 {
      return Err(Error::NonPositivePopulation(self.region_id.clone()));
    }
    Ok(population)
  }
}

// ─── Facility ────────────────────────────────────────────────────────────────

/// A physical location owned by exactly one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
  pub facility_id: FacilityId,
  pub name:        String,
  pub region_id:   RegionId,
  pub county_id:   Option<String>,
  pub zip_code:    Option<String>,
  pub latitude:    Option<f64>,
  pub longitude:   Option<f64>,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Read-only snapshot of every region and facility known to a run.
///
/// Facilities are kept even if their `region_id` matches no region; the
/// projection step reports those with an absent tier.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
  regions:    BTreeMap<RegionId, Region>,
  facilities: Vec<Facility>,
}

impl RegionCatalog {
  pub fn new(
    regions: impl IntoIterator<Item = Region>,
    facilities: impl IntoIterator<Item = Facility>,
  ) -> Self {
    let regions = regions
      .into_iter()
      .map(|r| (r.region_id.clone(), r))
      .collect();
    let mut facilities: Vec<Facility> = facilities.into_iter().collect();
    facilities.sort_by(|a, b| a.facility_id.cmp(&b.facility_id));
    Self { regions, facilities }
  }

  pub fn region(&self, id: &RegionId) -> Option<&Region> {
    self.regions.get(id)
  }

  /// Regions in ascending id order.
  pub fn regions(&self) -> impl Iterator<Item = &Region> {
    self.regions.values()
  }

  /// Facilities in ascending id order.
  pub fn facilities(&self) -> &[Facility] { &self.facilities }

  pub fn facilities_of<'a>(
    &'a self,
    region_id: &'a RegionId,
  ) -> impl Iterator<Item = &'a Facility> + 'a {
    self.facilities.iter().filter(move |f| &f.region_id == region_id)
  }

  /// Case-sensitive lookup by display name, as used when joining source
  /// feeds keyed by region name.
  pub fn region_by_name(&self, name: &str) -> Option<&Region> {
    self.regions.values().find(|r| r.name == name)
  }

  pub fn len(&self) -> usize { self.regions.len() }

  pub fn is_empty(&self) -> bool { self.regions.is_empty() }
}
