use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use soultrip_booking::{BookingError, Eligibility};
use soultrip_catalog::CatalogError;
use soultrip_core::StoreError;
use soultrip_search::InferenceError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UnavailableError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn catalog(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CatalogError::Forbidden(_) => AppError::AuthorizationError(err.to_string()),
            CatalogError::Validation(msg) => AppError::ValidationError(msg),
            CatalogError::Store(e) => AppError::store(e),
        }
    }

    pub fn store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => AppError::UnavailableError(err.to_string()),
            StoreError::Denied(_) => AppError::AuthorizationError(err.to_string()),
            StoreError::Conflict(_) => AppError::ConflictError(err.to_string()),
            StoreError::Other(msg) => AppError::InternalServerError(msg),
        }
    }

    pub fn booking(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) | BookingError::TourNotFound(_) => AppError::NotFoundError(err.to_string()),
            BookingError::NotEligible(Eligibility::SignInRequired) => {
                AppError::AuthenticationError(err.to_string())
            }
            BookingError::NotEligible(Eligibility::WrongRole) => AppError::AuthorizationError(err.to_string()),
            BookingError::NotEligible(Eligibility::CapacityUnknown) | BookingError::ReadFailed(_) => {
                AppError::UnavailableError(err.to_string())
            }
            BookingError::NotEligible(_) | BookingError::InconsistentState { .. } => {
                AppError::ConflictError(err.to_string())
            }
            BookingError::WriteFailed(_) | BookingError::CancelFailed(_) => {
                AppError::UnavailableError(err.to_string())
            }
        }
    }

    /// A failed protocol outcome, reported with its user-facing message
    pub fn outcome(err: BookingError, message: &str) -> Self {
        tracing::warn!("Booking protocol failed: {}", err);
        match AppError::booking(err) {
            AppError::ConflictError(_) => AppError::ConflictError(message.to_string()),
            AppError::NotFoundError(_) => AppError::NotFoundError(message.to_string()),
            _ => AppError::UnavailableError(message.to_string()),
        }
    }

    pub fn inference(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidQuery(msg) => AppError::ValidationError(msg),
            other => AppError::UnavailableError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnavailableError(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
