use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingFilter, BookingPatch, NewBooking};
use crate::identity::{Identity, ProfilePatch, UserProfile};
use crate::search::{PageRange, TourFilters};
use crate::tour::{NewTour, Tour, TourPatch};

/// Failure modes of the storage platform, already classified.
///
/// Callers branch on the variant; nothing downstream inspects error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Uniqueness violation: {0}")]
    Conflict(String),
    #[error("Rejected by access policy: {0}")]
    Denied(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-level access to bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking>;

    /// Returns the first affected row, or `None` when the filter matched nothing
    async fn update_bookings(
        &self,
        filter: &BookingFilter,
        patch: &BookingPatch,
    ) -> StoreResult<Option<Booking>>;

    /// Returns the first deleted row, or `None` when the filter matched nothing
    async fn delete_bookings(&self, filter: &BookingFilter) -> StoreResult<Option<Booking>>;

    async fn count_bookings(&self, filter: &BookingFilter) -> StoreResult<u64>;

    /// Newest first
    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;
}

/// Tour catalog access. Mutations are scoped to the owning organizer.
#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn create_tour(&self, tour: &NewTour) -> StoreResult<Tour>;

    async fn get_tour(&self, id: Uuid) -> StoreResult<Option<Tour>>;

    async fn get_tours(&self, ids: &[Uuid]) -> StoreResult<Vec<Tour>>;

    async fn update_tour(
        &self,
        id: Uuid,
        organizer_id: Uuid,
        patch: &TourPatch,
    ) -> StoreResult<Option<Tour>>;

    /// Cascades to the tour's bookings and images
    async fn delete_tour(&self, id: Uuid, organizer_id: Uuid) -> StoreResult<bool>;

    async fn list_published(
        &self,
        filters: &TourFilters,
        range: Option<PageRange>,
    ) -> StoreResult<Vec<Tour>>;

    async fn list_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Tour>>;
}

/// Public user profiles.
///
/// Tours and bookings reference a user row, so callers provision it with
/// `ensure_profile` before a user's first write.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Unknown ids are skipped
    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>>;

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.get_profiles(&[id]).await?.into_iter().next())
    }

    /// Inserts a blank row unless one exists, then returns the stored row.
    /// An existing row keeps its role.
    async fn ensure_profile(&self, identity: &Identity) -> StoreResult<UserProfile>;

    /// `None` when the user has no row
    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<Option<UserProfile>>;
}
