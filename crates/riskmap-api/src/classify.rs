//! `POST /classify`: run the classifier on caller-supplied windowed values.

use axum::Json;
use riskmap_core::classify::{ClassifyInput, RiskBreakdown, breakdown};

pub async fn handler(Json(input): Json<ClassifyInput>) -> Json<RiskBreakdown> {
  Json(breakdown(&input))
}
