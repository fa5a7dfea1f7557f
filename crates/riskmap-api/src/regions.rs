//! Handlers for `/regions` and `/facilities` endpoints.
//!
//! Each takes an optional `?date=YYYY-MM-DD` and defaults to the latest
//! artifact date.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use riskmap_core::{
  project::{FacilityRiskRow, RegionRiskRow},
  region::{FacilityId, RegionId},
  series::format_date,
  store::ArtifactStore,
};

use crate::{
  dates::{DateParams, resolve},
  error::ApiError,
};

fn no_artifact(date: NaiveDate) -> ApiError {
  ApiError::NotFound(format!("no artifact for {}", format_date(date)))
}

/// `GET /regions/{id}[?date=]`
pub async fn get_one<A: ArtifactStore>(
  State(store): State<Arc<A>>,
  Path(id): Path<String>,
  Query(params): Query<DateParams>,
) -> Result<Json<RegionRiskRow>, ApiError> {
  let date = resolve(store.as_ref(), params.date.as_deref()).await?;
  let id = RegionId::new(id);
  let row = store
    .region_rows(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| no_artifact(date))?
    .into_iter()
    .find(|r| r.region_id == id)
    .ok_or_else(|| ApiError::NotFound(format!("region {id} has no row for {date}")))?;
  Ok(Json(row))
}

/// `GET /regions/{id}/facilities[?date=]`
///
/// Includes facilities whose projection is absent. 404 only when the region
/// has neither a row nor any facility on that date.
pub async fn facilities<A: ArtifactStore>(
  State(store): State<Arc<A>>,
  Path(id): Path<String>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<FacilityRiskRow>>, ApiError> {
  let date = resolve(store.as_ref(), params.date.as_deref()).await?;
  let id = RegionId::new(id);
  let rows: Vec<FacilityRiskRow> = store
    .facility_rows(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| no_artifact(date))?
    .into_iter()
    .filter(|f| f.region_id == id)
    .collect();

  if rows.is_empty() {
    let known = store
      .region_rows(date)
      .await
      .map_err(ApiError::store)?
      .is_some_and(|regions| regions.iter().any(|r| r.region_id == id));
    if !known {
      return Err(ApiError::NotFound(format!("region {id} not found")));
    }
  }
  Ok(Json(rows))
}

/// `GET /facilities/{id}[?date=]`
pub async fn facility<A: ArtifactStore>(
  State(store): State<Arc<A>>,
  Path(id): Path<String>,
  Query(params): Query<DateParams>,
) -> Result<Json<FacilityRiskRow>, ApiError> {
  let date = resolve(store.as_ref(), params.date.as_deref()).await?;
  let id = FacilityId::new(id);
  let row = store
    .facility_rows(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| no_artifact(date))?
    .into_iter()
    .find(|f| f.facility_id == id)
    .ok_or_else(|| ApiError::NotFound(format!("facility {id} not found")))?;
  Ok(Json(row))
}
