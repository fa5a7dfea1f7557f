//! Delta deriver: cumulative counters to daily new cases and deaths.
//!
//! A region's first observed date has no predecessor and its delta is the raw
//! cumulative value. Negative deltas (counter revisions) are kept unless the
//! run's [`DeltaPolicy`] says otherwise.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  config::DeltaPolicy,
  region::RegionId,
  series::DailyCounters,
};

/// Daily new counts for one date within a single region's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRecord {
  pub date:       NaiveDate,
  pub new_cases:  i64,
  pub new_deaths: i64,
}

fn diff(current: u64, previous: u64) -> i64 { current as i64 - previous as i64 }

/// Delta between `current` and the region's immediately preceding record.
///
/// `previous` is `None` for the region's earliest date. Returns
/// [`Error::OutOfOrder`] when `previous` is not strictly earlier.
pub fn derive_delta(
  region: &RegionId,
  previous: Option<(NaiveDate, &DailyCounters)>,
  current: (NaiveDate, &DailyCounters),
  policy: DeltaPolicy,
) -> Result<DeltaRecord> {
  let (date, counters) = current;
  let base = match previous {
    Some((prev_date, _)) if prev_date >= date => {
      return Err(Error::OutOfOrder {
        region:   region.clone(),
        previous: prev_date,
        current:  date,
      });
    }
    Some((_, prev)) => *prev,
    None => DailyCounters::default(),
  };

  Ok(DeltaRecord {
    date,
    new_cases: policy.apply(diff(counters.cases, base.cases)),
    new_deaths: policy.apply(diff(counters.deaths, base.deaths)),
  })
}

/// Deltas for a region's complete, date-sorted history.
pub fn derive_deltas<'a>(
  region: &RegionId,
  history: impl IntoIterator<Item = (NaiveDate, &'a DailyCounters)>,
  policy: DeltaPolicy,
) -> Result<Vec<DeltaRecord>> {
  let history = history.into_iter();
  let mut out = Vec::with_capacity(history.size_hint().0);
  let mut previous = None;
  for current in history {
    out.push(derive_delta(region, previous, current, policy)?);
    previous = Some(current);
  }
  Ok(out)
}
