use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use soultrip_core::{ProfilePatch, UserProfile};
use uuid::Uuid;

use crate::bookings::signed_in;
use crate::error::AppError;
use crate::middleware::Viewer;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/profiles/{id}", get(get_profile))
        .route("/v1/profile", patch(update_profile))
}

async fn get_profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<UserProfile>, AppError> {
    let profile = state.profiles.public(id).await.map_err(AppError::catalog)?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserProfile>, AppError> {
    let identity = signed_in(&viewer)?;
    let profile = state
        .profiles
        .update_own(identity, patch)
        .await
        .map_err(AppError::catalog)?;
    Ok(Json(profile))
}
