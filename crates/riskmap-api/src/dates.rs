//! Handlers for `/dates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dates` | Every artifact date, ascending |
//! | `GET`  | `/dates/latest` | 404 if nothing has been written |
//! | `GET`  | `/dates/{date}` | Region rows; `ETag` is the artifact digest |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use riskmap_core::{
  series::{format_date, parse_date},
  store::ArtifactStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `?date=YYYY-MM-DD`, shared by every per-date lookup.
#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
  pub date: Option<String>,
}

/// The requested date, or the latest artifact date when none is given.
pub(crate) async fn resolve<A: ArtifactStore>(
  store: &A,
  requested: Option<&str>,
) -> Result<NaiveDate, ApiError> {
  match requested {
    Some(s) => Ok(parse_date(s)?),
    None => store
      .latest_date()
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound("no artifacts have been written".into())),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /dates`
pub async fn list<A: ArtifactStore>(
  State(store): State<Arc<A>>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
  let dates = store.list_dates().await.map_err(ApiError::store)?;
  Ok(Json(dates))
}

// ─── Latest ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Latest {
  pub date: NaiveDate,
}

/// `GET /dates/latest`
pub async fn latest<A: ArtifactStore>(
  State(store): State<Arc<A>>,
) -> Result<Json<Latest>, ApiError> {
  let date = resolve(store.as_ref(), None).await?;
  Ok(Json(Latest { date }))
}

// ─── One date ─────────────────────────────────────────────────────────────────

/// `GET /dates/{date}`; answers `304` when `If-None-Match` carries the
/// current digest.
pub async fn get_one<A: ArtifactStore>(
  State(store): State<Arc<A>>,
  Path(date): Path<String>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let date = parse_date(&date)?;
  let missing = || ApiError::NotFound(format!("no artifact for {}", format_date(date)));

  let digest = store
    .digest(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(missing)?;
  let etag = format!("\"{digest}\"");

  let cached = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|t| t.trim() == etag));
  if cached {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let rows = store
    .region_rows(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(missing)?;
  Ok(([(header::ETAG, etag)], Json(rows)).into_response())
}
