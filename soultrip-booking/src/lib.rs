pub mod models;
pub mod resolver;
pub mod lifecycle;
pub mod cancellation;
pub mod orchestrator;

pub use models::{BookingOutcome, CancelOutcome, Eligibility};
pub use resolver::ExistenceResolver;
pub use lifecycle::CreationProtocol;
pub use cancellation::CancellationProtocol;
pub use orchestrator::{BookingOrchestrator, BookingPanel, BookingReceipt, BookingView, CancelReceipt, MyBooking};

use soultrip_catalog::CatalogError;
use soultrip_core::StoreError;
use uuid::Uuid;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Could not read booking state: {0}")]
    ReadFailed(StoreError),

    #[error("Booking write failed: {0}")]
    WriteFailed(StoreError),

    #[error("Booking conflict without a cancelled row to reactivate (tour {tour_id}, participant {participant_id}): {source}")]
    InconsistentState {
        tour_id: Uuid,
        participant_id: Uuid,
        source: StoreError,
    },

    #[error("Cancellation failed: {0}")]
    CancelFailed(StoreError),

    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Tour not found: {0}")]
    TourNotFound(Uuid),

    #[error("Booking not allowed: {0}")]
    NotEligible(Eligibility),
}

pub type BookingResult<T> = Result<T, BookingError>;

impl BookingError {
    /// Maps a catalog failure raised while loading a tour's booking state
    pub fn from_catalog(tour_id: Uuid, err: CatalogError) -> Self {
        match err {
            CatalogError::Store(e) => BookingError::ReadFailed(e),
            CatalogError::NotFound(_) | CatalogError::Forbidden(_) | CatalogError::Validation(_) => {
                BookingError::TourNotFound(tour_id)
            }
        }
    }
}
