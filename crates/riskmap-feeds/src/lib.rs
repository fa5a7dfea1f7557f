//! Local source-feed parsers for riskmap.
//!
//! Reads the region and facility catalogs, the cumulative case/death feed and
//! the optional vaccination feed from CSV, and joins the two series feeds
//! into [`DailyCounterRecord`]s keyed by catalog region. Pure synchronous; no
//! filesystem or database access beyond the readers handed in.
//!
//! [`DailyCounterRecord`]: riskmap_core::series::DailyCounterRecord

pub mod catalog;
pub mod error;
mod merge;
pub mod series;

pub use catalog::{read_facilities, read_regions};
pub use error::{Error, Result};
pub use merge::{MergedSeries, merge};
pub use series::{CaseRow, VaccinationRow, read_cases, read_vaccinations};

/// Row number as a human reads the file: the header is line 1.
pub(crate) fn row_number(index: usize) -> u64 { index as u64 + 2 }
