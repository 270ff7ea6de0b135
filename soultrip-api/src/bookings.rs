use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use soultrip_booking::{BookingPanel, CancelOutcome, MyBooking};
use soultrip_core::Identity;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Viewer;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(my_bookings))
        .route("/v1/bookings/{id}", get(get_booking).delete(cancel_booking))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub outcome: &'static str,
    pub booking_id: Uuid,
    pub message: &'static str,
    pub panel: BookingPanel,
}

pub(crate) fn signed_in(viewer: &Viewer) -> Result<&Identity, AppError> {
    viewer
        .identity()
        .ok_or_else(|| AppError::AuthenticationError("Sign in required".to_string()))
}

async fn my_bookings(State(state): State<AppState>, viewer: Viewer) -> Result<Json<Vec<MyBooking>>, AppError> {
    let identity = signed_in(&viewer)?;
    let bookings = state
        .bookings
        .my_bookings(identity)
        .await
        .map_err(AppError::booking)?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<MyBooking>, AppError> {
    let identity = signed_in(&viewer)?;
    let booking = state
        .bookings
        .booking_detail(identity, id)
        .await
        .map_err(AppError::booking)?;
    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    let receipt = state
        .bookings
        .cancel(viewer.identity(), id)
        .await
        .map_err(AppError::booking)?;

    let message = receipt.outcome.message();
    let tag = receipt.outcome.tag();
    if let CancelOutcome::Error(err) = receipt.outcome {
        return Err(AppError::outcome(err, message));
    }

    Ok(Json(CancelResponse {
        outcome: tag,
        booking_id: id,
        message,
        panel: receipt.panel,
    }))
}
