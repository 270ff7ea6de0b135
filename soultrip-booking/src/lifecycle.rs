use soultrip_core::{BookingFilter, BookingPatch, BookingStatus, BookingStore, NewBooking};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{BookingError, BookingOutcome};

/// Insert a pending booking, or reactivate the caller's cancelled one.
///
/// Preconditions (identity, role, published tour, capacity) are checked by
/// the caller. A uniqueness conflict is not a failure here: it routes to
/// reactivation of the cancelled row for the same pair. Each step is a single
/// storage operation with no enclosing transaction.
#[derive(Clone)]
pub struct CreationProtocol {
    bookings: Arc<dyn BookingStore>,
}

impl CreationProtocol {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    pub async fn create_or_reactivate(&self, tour_id: Uuid, participant_id: Uuid) -> BookingOutcome {
        let conflict = match self
            .bookings
            .insert_booking(&NewBooking::pending(tour_id, participant_id))
            .await
        {
            Ok(booking) => {
                info!("Booking {} created for tour {}", booking.id, tour_id);
                return BookingOutcome::Created(booking);
            }
            Err(e) if e.is_conflict() => e,
            Err(e) => return BookingOutcome::Error(BookingError::WriteFailed(e)),
        };

        let cancelled = BookingFilter::new()
            .tour(tour_id)
            .participant(participant_id)
            .status(BookingStatus::Cancelled);

        match self.bookings.update_bookings(&cancelled, &BookingPatch::reactivate()).await {
            Ok(Some(booking)) => {
                info!("Booking {} reactivated for tour {}", booking.id, tour_id);
                BookingOutcome::Reactivated(booking)
            }
            Ok(None) => {
                // The conflict implies an active row the caller did not see
                warn!(
                    "Inconsistent booking state: insert conflicted but no cancelled row for tour {} participant {}",
                    tour_id, participant_id
                );
                BookingOutcome::Error(BookingError::InconsistentState {
                    tour_id,
                    participant_id,
                    source: conflict,
                })
            }
            Err(e) => BookingOutcome::Error(BookingError::WriteFailed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use soultrip_core::{NewTour, PaymentStatus, TourRepository, TourStatus};
    use soultrip_store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, CreationProtocol, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let tour = store
            .create_tour(&NewTour {
                organizer_id: Uuid::new_v4(),
                organizer_name: None,
                title: "Himalayan yoga trek".to_string(),
                description: None,
                start_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                price: 2400.0,
                currency: "USD".to_string(),
                max_participants: 12,
                status: TourStatus::Published,
                country: Some("nepal".to_string()),
                difficulty: None,
                images: vec![],
            })
            .await
            .unwrap();
        (store.clone(), CreationProtocol::new(store), tour.id)
    }

    #[tokio::test]
    async fn test_fresh_insert_is_created_pending_unpaid() {
        let (_, protocol, tour_id) = setup().await;
        let outcome = protocol.create_or_reactivate(tour_id, Uuid::new_v4()).await;

        let BookingOutcome::Created(booking) = outcome else {
            panic!("expected created, got {:?}", outcome);
        };
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_rebooking_after_cancel_reuses_row() {
        let (store, protocol, tour_id) = setup().await;
        let participant = Uuid::new_v4();

        let first = protocol.create_or_reactivate(tour_id, participant).await;
        let first_id = first.booking_id().unwrap();
        store
            .update_bookings(&BookingFilter::new().id(first_id), &BookingPatch::cancel())
            .await
            .unwrap();

        let second = protocol.create_or_reactivate(tour_id, participant).await;
        assert!(matches!(second, BookingOutcome::Reactivated(_)));
        assert_eq!(second.booking_id(), Some(first_id));
        assert_eq!(second.booking().unwrap().status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_conflict_with_active_row_is_inconsistent_state() {
        let (store, protocol, tour_id) = setup().await;
        let participant = Uuid::new_v4();
        protocol.create_or_reactivate(tour_id, participant).await;

        let again = protocol.create_or_reactivate(tour_id, participant).await;
        assert!(matches!(again, BookingOutcome::Error(BookingError::InconsistentState { .. })));

        let active = store
            .count_bookings(&BookingFilter::new().tour(tour_id).participant(participant).active())
            .await
            .unwrap();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_non_conflict_insert_failure_is_surfaced() {
        let (_, protocol, _) = setup().await;
        // No such tour: foreign key failure, not a uniqueness conflict
        let outcome = protocol.create_or_reactivate(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(outcome, BookingOutcome::Error(BookingError::WriteFailed(_))));
    }

    #[tokio::test]
    async fn test_reactivation_denied_is_write_failure() {
        let (store, protocol, tour_id) = setup().await;
        let participant = Uuid::new_v4();
        let first = protocol.create_or_reactivate(tour_id, participant).await;
        store
            .update_bookings(&BookingFilter::new().id(first.booking_id().unwrap()), &BookingPatch::cancel())
            .await
            .unwrap();

        store.policy.deny_booking_updates(true);
        let outcome = protocol.create_or_reactivate(tour_id, participant).await;
        assert!(matches!(outcome, BookingOutcome::Error(BookingError::WriteFailed(_))));
    }

    #[tokio::test]
    async fn test_concurrent_attempts_leave_one_active_row() {
        let (store, protocol, tour_id) = setup().await;
        let participant = Uuid::new_v4();

        let (a, b, c) = tokio::join!(
            protocol.create_or_reactivate(tour_id, participant),
            protocol.create_or_reactivate(tour_id, participant),
            protocol.create_or_reactivate(tour_id, participant),
        );
        let successes = [&a, &b, &c].iter().filter(|o| o.booking_id().is_some()).count();
        assert_eq!(successes, 1);

        let rows = store
            .find_bookings(&BookingFilter::new().tour(tour_id).participant(participant))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
