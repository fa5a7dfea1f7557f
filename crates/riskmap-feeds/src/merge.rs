//! Joins the case and vaccination feeds onto catalog regions.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use riskmap_core::{
  region::RegionCatalog,
  series::{DailyCounterRecord, DailyCounters},
};
use tracing::{debug, warn};

use crate::series::{CaseRow, VaccinationRow};

/// The joined series plus what could not be placed.
#[derive(Debug, Default)]
pub struct MergedSeries {
  /// Sorted by region id, then date.
  pub records: Vec<DailyCounterRecord>,
  /// Case rows whose region name is not in the catalog, counted by name.
  pub skipped: BTreeMap<String, usize>,
}

impl MergedSeries {
  pub fn skipped_rows(&self) -> usize { self.skipped.values().sum() }
}

/// Left join of `cases` with `vaccinations` on (date, region name).
///
/// The case feed decides which (region, date) pairs exist. A missing
/// vaccination row leaves both vaccination counters at 0. Later duplicates
/// of the same key replace earlier ones in either feed.
pub fn merge(
  catalog: &RegionCatalog,
  cases: &[CaseRow],
  vaccinations: &[VaccinationRow],
) -> MergedSeries {
  let doses: HashMap<(NaiveDate, &str), &VaccinationRow> = vaccinations
    .iter()
    .map(|v| ((v.date, v.region.as_str()), v))
    .collect();

  let mut joined = BTreeMap::new();
  let mut skipped = BTreeMap::new();
  for row in cases {
    let Some(region) = catalog.region_by_name(&row.region) else {
      *skipped.entry(row.region.clone()).or_insert(0) += 1;
      continue;
    };
    let vaccination = doses.get(&(row.date, row.region.as_str()));
    let counters = DailyCounters {
      cases:            row.cases,
      deaths:           row.deaths,
      first_dose:       vaccination.map_or(0, |v| v.first_dose),
      fully_vaccinated: vaccination.map_or(0, |v| v.fully_vaccinated),
    };
    joined.insert((region.region_id.clone(), row.date), counters);
  }

  for (name, count) in &skipped {
    warn!(region = %name, rows = count, "region not in catalog; rows skipped");
  }
  debug!(records = joined.len(), "feeds merged");

  let records = joined
    .into_iter()
    .map(|((region_id, date), counters)| {
      DailyCounterRecord::new(region_id, date, counters)
    })
    .collect();
  MergedSeries { records, skipped }
}

#[cfg(test)]
mod tests {
  use riskmap_core::region::{Region, RegionId};

  use super::*;

  fn region(id: &str, name: &str) -> Region {
    Region {
      region_id:       RegionId::new(id),
      name:            name.to_owned(),
      code:            name[..2].to_uppercase(),
      population_2020: 1_000,
      population_2021: 1_000,
    }
  }

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 2, d).unwrap() }

  fn case(d: u32, region: &str, cases: u64) -> CaseRow {
    CaseRow { date: day(d), region: region.to_owned(), cases, deaths: 1 }
  }

  fn catalog() -> RegionCatalog {
    RegionCatalog::new([region("2", "Ohio"), region("1", "Utah")], [])
  }

  #[test]
  fn case_feed_drives_rows() {
    let vaccinations = [
      VaccinationRow {
        date:             day(1),
        region:           "Ohio".to_owned(),
        first_dose:       300,
        fully_vaccinated: 100,
      },
      VaccinationRow {
        date:             day(9),
        region:           "Ohio".to_owned(),
        first_dose:       900,
        fully_vaccinated: 500,
      },
    ];
    let merged = merge(
      &catalog(),
      &[case(1, "Ohio", 10), case(2, "Ohio", 12)],
      &vaccinations,
    );
    assert_eq!(merged.records.len(), 2);
    assert_eq!(merged.records[0].counters.first_dose, 300);
    assert_eq!(merged.records[1].counters.first_dose, 0);
    assert_eq!(merged.records[1].counters.cases, 12);
  }

  #[test]
  fn unknown_names_are_counted() {
    let merged = merge(
      &catalog(),
      &[
        case(1, "Utah", 1),
        case(1, "Guam", 5),
        case(2, "Guam", 6),
        case(1, "Atlantis", 1),
      ],
      &[],
    );
    assert_eq!(merged.records.len(), 1);
    assert_eq!(merged.skipped["Guam"], 2);
    assert_eq!(merged.skipped_rows(), 3);
  }

  #[test]
  fn output_sorted_by_region_then_date() {
    let merged = merge(
      &catalog(),
      &[case(3, "Ohio", 3), case(1, "Utah", 1), case(1, "Ohio", 1)],
      &[],
    );
    let keys: Vec<_> = merged
      .records
      .iter()
      .map(|r| (r.region_id.as_str(), r.date))
      .collect();
    assert_eq!(keys, [("1", day(1)), ("2", day(1)), ("2", day(3))]);
  }

  #[test]
  fn duplicate_case_rows_keep_the_last() {
    let merged = merge(&catalog(), &[case(1, "Ohio", 3), case(1, "Ohio", 4)], &[]);
    assert_eq!(merged.records.len(), 1);
    assert_eq!(merged.records[0].counters.cases, 4);
  }
}
