use soultrip_core::{BookingFilter, BookingStore, Identity};
use std::sync::Arc;
use uuid::Uuid;

use crate::{BookingError, BookingResult};

/// Finds the caller's active booking on a tour.
#[derive(Clone)]
pub struct ExistenceResolver {
    bookings: Arc<dyn BookingStore>,
}

impl ExistenceResolver {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    /// `Ok(None)` means no active booking; a failed read is an `Err`, never `None`.
    pub async fn resolve(&self, identity: Option<&Identity>, tour_id: Uuid) -> BookingResult<Option<Uuid>> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        let rows = self
            .bookings
            .find_bookings(
                &BookingFilter::new()
                    .tour(tour_id)
                    .participant(identity.user_id)
                    .active(),
            )
            .await
            .map_err(BookingError::ReadFailed)?;

        Ok(rows.first().map(|b| b.id))
    }
}
