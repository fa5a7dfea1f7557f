//! Error types for `riskmap-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::region::RegionId;

#[derive(Debug, Error)]
pub enum Error {
  /// Dates fed to the delta deriver were not strictly increasing.
  #[error("region {region}: date {current} does not follow {previous}")]
  OutOfOrder {
    region:   RegionId,
    previous: NaiveDate,
    current:  NaiveDate,
  },

  /// Incremental mode needs the six contiguous calendar days before `date`.
  #[error(
    "region {region}: incremental window for {date} is missing prior days {missing:?}"
  )]
  IncompletePriorWindow {
    region:  RegionId,
    date:    NaiveDate,
    missing: Vec<NaiveDate>,
  },

  #[error("region {0}: population must be positive")]
  NonPositivePopulation(RegionId),

  #[error("invalid date {0:?}; expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("no artifacts found; run a batch first")]
  NoArtifacts,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// The region a precondition failure belongs to, if any.
  pub fn region(&self) -> Option<&RegionId> {
    match self {
      Self::OutOfOrder { region, .. }
      | Self::IncompletePriorWindow { region, .. }
      | Self::NonPositivePopulation(region) => Some(region),
      Self::InvalidDate(_) | Self::NoArtifacts | Self::Storage(_) => None,
    }
  }
}

/// Box a backend error into [`Error::Storage`].
pub(crate) fn storage<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Storage(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
