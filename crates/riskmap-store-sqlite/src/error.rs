//! Error type for `riskmap-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] riskmap_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A count does not fit SQLite's signed 64-bit integer, or a stored
  /// integer is negative.
  #[error("count out of range: {0}")]
  CountRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
