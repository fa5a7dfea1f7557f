//! Storage traits implemented by backend crates.
//!
//! [`SeriesStore`] is the catalog plus the raw cumulative series
//! (`riskmap-store-sqlite`). [`ArtifactStore`] is the per-date output
//! (`riskmap-artifact`). The pipeline and the query service depend on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  project::{DateArtifact, FacilityRiskRow, RegionRiskRow},
  region::{Facility, Region, RegionId},
  series::DailyCounterRecord,
};

// ─── Series ──────────────────────────────────────────────────────────────────

/// Region catalog and raw series provider.
///
/// Writes are idempotent upserts keyed by id, or by (region, date) for
/// counters, so re-importing the same feed leaves the store unchanged.
pub trait SeriesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn upsert_region(
    &self,
    region: Region,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_facility(
    &self,
    facility: Facility,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All regions, ascending by id.
  fn list_regions(
    &self,
  ) -> impl Future<Output = Result<Vec<Region>, Self::Error>> + Send + '_;

  /// All facilities, ascending by id.
  fn list_facilities(
    &self,
  ) -> impl Future<Output = Result<Vec<Facility>, Self::Error>> + Send + '_;

  // ── Raw series ────────────────────────────────────────────────────────

  /// Insert or replace counters; returns the number of records written.
  fn record_counters(
    &self,
    records: Vec<DailyCounterRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// A region's full history, ascending by date.
  fn region_history<'a>(
    &'a self,
    region: &'a RegionId,
  ) -> impl Future<Output = Result<Vec<DailyCounterRecord>, Self::Error>> + Send + 'a;

  /// The last `limit` records on or before `through`, ascending by date.
  fn region_history_through<'a>(
    &'a self,
    region: &'a RegionId,
    through: NaiveDate,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<DailyCounterRecord>, Self::Error>> + Send + 'a;
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

/// Persisted per-date output. One artifact per date; rewriting a date with
/// identical content is a no-op in effect.
pub trait ArtifactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `artifact`; returns a content digest of what was written.
  fn write_artifact<'a>(
    &'a self,
    artifact: &'a DateArtifact,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Region rows for `date`, or `None` if no artifact exists.
  fn region_rows(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Vec<RegionRiskRow>>, Self::Error>> + Send + '_;

  /// Facility rows for `date`, or `None` if no artifact exists.
  fn facility_rows(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Vec<FacilityRiskRow>>, Self::Error>> + Send + '_;

  /// Digest of the artifact for `date`, as returned by `write_artifact`.
  fn digest(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Every date with an artifact, ascending.
  fn list_dates(
    &self,
  ) -> impl Future<Output = Result<Vec<NaiveDate>, Self::Error>> + Send + '_;

  /// The most recent artifact date.
  fn latest_date(
    &self,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + '_;
}
