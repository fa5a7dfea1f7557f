//! Error types for the riskmap-feeds parsers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("{feed} row {row}: invalid date {value:?}")]
  InvalidDate {
    feed:  &'static str,
    row:   u64,
    value: String,
  },

  #[error("{feed} row {row}: {message}")]
  InvalidRow {
    feed:    &'static str,
    row:     u64,
    message: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
