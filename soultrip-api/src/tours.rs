use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use soultrip_booking::{BookingOutcome, BookingPanel, BookingView};
use soultrip_catalog::{Paginator, ParticipantEntry, TourDraft, TourSummary, DEFAULT_PAGE_SIZE};
use soultrip_core::{Difficulty, PageRange, Role, Tour, TourFilters, TourPatch, TourSort};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Viewer;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours", get(list_tours).post(create_tour))
        .route(
            "/v1/tours/{id}",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .route("/v1/tours/{id}/participants", get(list_participants))
        .route("/v1/tours/{id}/roster", get(get_roster))
        .route("/v1/tours/{id}/bookings", post(book_tour))
        .route("/v1/organizer/tours", get(my_tours))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListToursQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Comma-separated
    pub countries: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub sort: Option<TourSort>,
    pub offset: Option<u64>,
    pub page_size: Option<u64>,
}

impl ListToursQuery {
    fn filters(&self) -> TourFilters {
        TourFilters {
            start_date: self.start_date,
            end_date: self.end_date,
            countries: self
                .countries
                .as_deref()
                .map(|list| list.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            difficulty: self.difficulty,
            sort: self.sort.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TourPage {
    pub tours: Vec<TourSummary>,
    pub page_size: u64,
    pub next_offset: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub outcome: &'static str,
    pub booking_id: Uuid,
    pub message: &'static str,
    pub panel: BookingPanel,
}

// ============================================================================
// Catalog Handlers
// ============================================================================

async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<ListToursQuery>,
) -> Result<Json<TourPage>, AppError> {
    let offset = query.offset.unwrap_or(0);
    if offset > PageRange::MAX_OFFSET {
        return Err(AppError::ValidationError(format!(
            "offset must not exceed {}",
            PageRange::MAX_OFFSET
        )));
    }
    let mut pager = Paginator::new(query.page_size.unwrap_or(DEFAULT_PAGE_SIZE));
    pager.offset = offset;

    let page = state
        .listing
        .search(&query.filters(), Some(pager.next_range(false)))
        .await
        .map_err(AppError::catalog)?;
    pager.absorb(false, page);

    Ok(Json(TourPage {
        page_size: pager.page_size,
        next_offset: pager.offset,
        has_more: pager.has_more,
        tours: pager.items,
    }))
}

async fn create_tour(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(draft): Json<TourDraft>,
) -> Result<(StatusCode, Json<Tour>), AppError> {
    // Tours reference the organizer's user row
    let organizer_name = match viewer.identity() {
        Some(identity) if identity.role == Role::Organizer => state
            .profiles
            .provision(identity)
            .await
            .map_err(AppError::catalog)?
            .full_name,
        _ => None,
    };

    let tour = state
        .tours
        .create(viewer.identity(), organizer_name, draft)
        .await
        .map_err(AppError::catalog)?;
    Ok((StatusCode::CREATED, Json(tour)))
}

async fn get_tour(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let view = state
        .bookings
        .load(viewer.identity(), id)
        .await
        .map_err(AppError::booking)?;
    Ok(Json(view))
}

async fn update_tour(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(patch): Json<TourPatch>,
) -> Result<Json<Tour>, AppError> {
    let tour = state
        .tours
        .update(viewer.identity(), id, patch)
        .await
        .map_err(AppError::catalog)?;
    Ok(Json(tour))
}

async fn delete_tour(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .tours
        .delete(viewer.identity(), id)
        .await
        .map_err(AppError::catalog)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn my_tours(State(state): State<AppState>, viewer: Viewer) -> Result<Json<Vec<Tour>>, AppError> {
    let tours = state
        .tours
        .list_mine(viewer.identity())
        .await
        .map_err(AppError::catalog)?;
    Ok(Json(tours))
}

async fn list_participants(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantEntry>>, AppError> {
    let entries = state
        .participants
        .participants(viewer.identity(), id)
        .await
        .map_err(AppError::catalog)?;
    Ok(Json(entries))
}

async fn get_roster(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantEntry>>, AppError> {
    let entries = state
        .participants
        .roster(viewer.identity(), id)
        .await
        .map_err(AppError::catalog)?;
    Ok(Json(entries))
}

// ============================================================================
// Booking Handler
// ============================================================================

async fn book_tour(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    // Bookings reference the participant's user row
    if let Some(identity) = viewer.identity().filter(|i| i.can_book()) {
        state.profiles.provision(identity).await.map_err(AppError::catalog)?;
    }

    let receipt = state
        .bookings
        .book(viewer.identity(), id)
        .await
        .map_err(AppError::booking)?;

    let message = receipt.outcome.message();
    let tag = receipt.outcome.tag();
    let (status, booking_id) = match receipt.outcome {
        BookingOutcome::Created(booking) => (StatusCode::CREATED, booking.id),
        BookingOutcome::Reactivated(booking) => (StatusCode::OK, booking.id),
        BookingOutcome::Error(err) => return Err(AppError::outcome(err, message)),
    };

    Ok((
        status,
        Json(BookingResponse {
            outcome: tag,
            booking_id,
            message,
            panel: receipt.panel,
        }),
    ))
}
