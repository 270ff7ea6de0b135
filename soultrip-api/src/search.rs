use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use soultrip_core::InferredFilters;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/search/infer", post(infer_filters))
}

#[derive(Debug, Deserialize)]
pub struct InferRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub filters: InferredFilters,
}

async fn infer_filters(
    State(state): State<AppState>,
    Json(req): Json<InferRequest>,
) -> Result<Json<InferResponse>, AppError> {
    let query = req.query.unwrap_or_default();
    let filters = state
        .inference
        .infer(&query)
        .await
        .map_err(AppError::inference)?;
    Ok(Json(InferResponse { filters }))
}
