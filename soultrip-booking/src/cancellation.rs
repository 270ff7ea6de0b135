use soultrip_core::{BookingFilter, BookingPatch, BookingStatus, BookingStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{BookingError, CancelOutcome};

/// Ends a booking's active status, scoped to its owner.
///
/// Tries a hard delete first and falls back to marking the row cancelled, so
/// it succeeds whether the storage policy allows deletes or only updates.
#[derive(Clone)]
pub struct CancellationProtocol {
    bookings: Arc<dyn BookingStore>,
}

impl CancellationProtocol {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    pub async fn cancel(&self, booking_id: Uuid, participant_id: Uuid) -> CancelOutcome {
        let owned = BookingFilter::new().id(booking_id).participant(participant_id);

        match self.bookings.delete_bookings(&owned).await {
            Ok(Some(booking)) => {
                info!("Booking {} deleted", booking.id);
                return CancelOutcome::Deleted(booking);
            }
            Ok(None) => {
                warn!("Hard delete of booking {} matched no row, trying soft cancel", booking_id);
            }
            Err(e) => {
                warn!("Hard delete of booking {} failed ({}), trying soft cancel", booking_id, e);
            }
        }

        // Never report a second cancellation of an already-cancelled row
        let guarded = owned.status_not(BookingStatus::Cancelled);
        match self.bookings.update_bookings(&guarded, &BookingPatch::cancel()).await {
            Ok(Some(booking)) => {
                info!("Booking {} soft-cancelled", booking.id);
                CancelOutcome::SoftCancelled(booking)
            }
            Ok(None) => CancelOutcome::Error(BookingError::NotFound(booking_id)),
            Err(e) => CancelOutcome::Error(BookingError::CancelFailed(e)),
        }
    }
}
