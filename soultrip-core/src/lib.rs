pub mod booking;
pub mod tour;
pub mod search;
pub mod repository;
pub mod identity;

pub use booking::{Booking, BookingFilter, BookingPatch, BookingStatus, NewBooking, PaymentStatus};
pub use identity::{Identity, ProfilePatch, Role, UserProfile};
pub use repository::{BookingStore, ProfileRepository, StoreError, StoreResult, TourRepository};
pub use search::{InferredFilters, PageRange, TourFilters, TourSort};
pub use tour::{Availability, Difficulty, NewTour, Tour, TourImage, TourPatch, TourStatus};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
