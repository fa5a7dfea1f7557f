//! JSON query service over persisted riskmap artifacts.
//!
//! Exposes an axum [`Router`] backed by any
//! [`riskmap_core::store::ArtifactStore`]. The service is read-only: it never
//! recomputes features, it serves what the last batch or append run wrote.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = riskmap_api::api_router(Arc::new(ArtifactDir::new("artifacts")));
//! ```

pub mod classify;
pub mod dates;
pub mod error;
pub mod regions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use riskmap_core::store::ArtifactStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
pub fn api_router<A>(store: Arc<A>) -> Router<()>
where
  A: ArtifactStore + 'static,
{
  Router::new()
    // Dates
    .route("/dates", get(dates::list::<A>))
    .route("/dates/latest", get(dates::latest::<A>))
    .route("/dates/{date}", get(dates::get_one::<A>))
    // Regions and facilities
    .route("/regions/{id}", get(regions::get_one::<A>))
    .route("/regions/{id}/facilities", get(regions::facilities::<A>))
    .route("/facilities/{id}", get(regions::facility::<A>))
    // Classifier
    .route("/classify", post(classify::handler))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use chrono::NaiveDate;
  use riskmap_artifact::ArtifactDir;
  use riskmap_core::{
    project::{DateArtifact, RegionRiskRow},
    region::{Facility, FacilityId, Region, RegionCatalog, RegionId},
    rolling::FeatureRecord,
  };
  use serde_json::Value;
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2021, 11, d).unwrap() }

  fn region(id: &str, name: &str) -> Region {
    Region {
      region_id:       RegionId::new(id),
      name:            name.into(),
      code:            name[..2].to_uppercase(),
      population_2020: 1_000_000,
      population_2021: 1_000_000,
    }
  }

  fn facility(id: &str, region_id: &str) -> Facility {
    Facility {
      facility_id: FacilityId::new(id),
      name:        format!("Facility {id}"),
      region_id:   RegionId::new(region_id),
      county_id:   None,
      zip_code:    None,
      latitude:    None,
      longitude:   None,
    }
  }

  fn features(rolling_cases: f64) -> FeatureRecord {
    FeatureRecord {
      cases_per_100k:           rolling_cases,
      deaths_per_100k:          0.0,
      rolling7_cases_per_100k:  rolling_cases,
      rolling7_deaths_per_100k: 0.0,
      pct_at_least_one_dose:    95.0,
      pct_fully_vaccinated:     80.0,
    }
  }

  /// Two dates; region 2 only observed on the first.
  async fn fixture() -> (TempDir, Arc<ArtifactDir>) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = ArtifactDir::new(tmp.path());
    let ohio = region("1", "Ohio");
    let utah = region("2", "Utah");
    let catalog = RegionCatalog::new(
      [ohio.clone(), utah.clone()],
      [facility("f1", "1"), facility("f2", "2"), facility("f3", "1")],
    );

    let first = DateArtifact::assemble(day(1), &catalog, vec![
      RegionRiskRow::new(&ohio, 1_000_000, &features(2.0)),
      RegionRiskRow::new(&utah, 1_000_000, &features(30.0)),
    ]);
    let second = DateArtifact::assemble(day(2), &catalog, vec![
      RegionRiskRow::new(&ohio, 1_000_000, &features(12.0)),
    ]);
    dir.write_artifact(&first).await.unwrap();
    dir.write_artifact(&second).await.unwrap();
    (tmp, Arc::new(dir))
  }

  async fn send(store: Arc<ArtifactDir>, req: Request<Body>) -> Response {
    api_router(store).oneshot(req).await.unwrap()
  }

  async fn get(store: Arc<ArtifactDir>, uri: &str) -> Response {
    send(store, Request::get(uri).body(Body::empty()).unwrap()).await
  }

  async fn json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ─── Dates ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn lists_dates_and_latest() {
    let (_tmp, store) = fixture().await;

    let resp = get(store.clone(), "/dates").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await, serde_json::json!(["2021-11-01", "2021-11-02"]));

    let resp = get(store, "/dates/latest").await;
    assert_eq!(json(resp).await["date"], "2021-11-02");
  }

  #[tokio::test]
  async fn date_rows_carry_etag() {
    let (_tmp, store) = fixture().await;

    let resp = get(store.clone(), "/dates/2021-11-01").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp.headers()[header::ETAG].to_str().unwrap().to_owned();
    assert!(etag.starts_with('"') && etag.len() == 66);
    let body = json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["tier"], 2);

    let req = Request::get("/dates/2021-11-01")
      .header(header::IF_NONE_MATCH, &etag)
      .body(Body::empty())
      .unwrap();
    let resp = send(store, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
  }

  #[tokio::test]
  async fn bad_and_missing_dates() {
    let (_tmp, store) = fixture().await;

    let resp = get(store.clone(), "/dates/2021-13-01").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json(resp).await["error"].is_string());

    let resp = get(store.clone(), "/dates/2021-11-30").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = get(store, "/regions/1?date=11/01/2021").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn empty_store_has_no_latest() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactDir::new(tmp.path()));
    assert_eq!(get(store.clone(), "/dates").await.status(), StatusCode::OK);
    assert_eq!(
      get(store, "/dates/latest").await.status(),
      StatusCode::NOT_FOUND
    );
  }

  // ─── Regions and facilities ────────────────────────────────────────────────

  #[tokio::test]
  async fn region_defaults_to_latest_date() {
    let (_tmp, store) = fixture().await;

    let latest = json(get(store.clone(), "/regions/1").await).await;
    assert_eq!(latest["rolling7_cases_per_100k"], 12.0);

    let earlier = json(get(store.clone(), "/regions/1?date=2021-11-01").await).await;
    assert_eq!(earlier["tier"], 1);

    // Utah did not observe the latest date.
    assert_eq!(get(store, "/regions/2").await.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn facilities_follow_their_region() {
    let (_tmp, store) = fixture().await;

    let rows = json(get(store.clone(), "/regions/1/facilities").await).await;
    let ids: Vec<_> = rows
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["facility_id"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(ids, ["f1", "f3"]);

    let orphaned = json(get(store.clone(), "/facilities/f2").await).await;
    assert!(orphaned["tier"].is_null());

    let rated = json(get(store.clone(), "/facilities/f2?date=2021-11-01").await).await;
    assert_eq!(rated["tier"], 2);

    assert_eq!(
      get(store.clone(), "/facilities/f9").await.status(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      get(store, "/regions/9/facilities").await.status(),
      StatusCode::NOT_FOUND
    );
  }

  // ─── Classifier ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn classify_returns_breakdown() {
    let (_tmp, store) = fixture().await;
    let body = serde_json::json!({
      "rolling7_cases_per_100k": 25.0,
      "rolling7_deaths_per_100k": 0.35,
      "pct_at_least_one_dose": 95.0,
      "pct_fully_vaccinated": 70.0,
    });
    let req = Request::post("/classify")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = send(store, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let b = json(resp).await;
    assert_eq!(b["case_subscore"], 4);
    assert_eq!(b["death_subscore"], 3);
    assert_eq!(b["tier"], 3);
  }
}
