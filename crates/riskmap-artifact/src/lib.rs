//! Per-date CSV artifacts for riskmap.
//!
//! Each processed date is written as two files under an artifact root:
//!
//! ```text
//! <root>/regions/<YYYY-MM-DD>.csv
//! <root>/facilities/<YYYY-MM-DD>.csv
//! ```
//!
//! [`ArtifactDir`] implements [`riskmap_core::store::ArtifactStore`], so the
//! pipeline reads its prior window back from the same files the query
//! service serves.

mod codec;
mod digest;
mod dir;

pub mod error;

pub use digest::artifact_digest;
pub use dir::ArtifactDir;
pub use error::{Error, Result};
