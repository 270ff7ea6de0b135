use serde::Serialize;
use soultrip_catalog::CapacityReader;
use soultrip_core::{Booking, BookingFilter, BookingStore, Identity, Tour, TourRepository};
use soultrip_shared::BookingLifecycleEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancellation::CancellationProtocol;
use crate::lifecycle::CreationProtocol;
use crate::models::{BookingOutcome, CancelOutcome, Eligibility};
use crate::resolver::ExistenceResolver;
use crate::{BookingError, BookingResult};

/// Local view of a tour's booking state.
///
/// After a write the panel is advanced by [`BookingPanel::after_booking`] or
/// [`BookingPanel::after_cancel`] instead of being re-read; the next load
/// reconciles it with storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingPanel {
    pub tour_id: Uuid,
    /// `None` when the count could not be read
    pub occupancy: Option<u64>,
    pub max_participants: u64,
    pub my_booking_id: Option<Uuid>,
}

impl BookingPanel {
    pub fn new(tour: &Tour, occupancy: Option<u64>, my_booking_id: Option<Uuid>) -> Self {
        Self {
            tour_id: tour.id,
            occupancy,
            max_participants: tour.max_participants.max(0) as u64,
            my_booking_id,
        }
    }

    pub fn sold_out(&self) -> Option<bool> {
        self.occupancy.map(|count| count >= self.max_participants)
    }

    pub fn after_booking(self, outcome: &BookingOutcome) -> Self {
        let Some(id) = outcome.booking_id() else {
            return self;
        };
        let occupancy = match self.my_booking_id {
            Some(_) => self.occupancy,
            None => self.occupancy.map(|count| count + 1),
        };
        Self {
            occupancy,
            my_booking_id: Some(id),
            ..self
        }
    }

    /// Only a cancellation of the booking this panel holds moves the counter
    pub fn after_cancel(self, outcome: &CancelOutcome) -> Self {
        match outcome.booking() {
            Some(booking) if self.my_booking_id == Some(booking.id) => Self {
                occupancy: self.occupancy.map(|count| count.saturating_sub(1)),
                my_booking_id: None,
                ..self
            },
            _ => self,
        }
    }

    pub fn eligibility(&self, identity: Option<&Identity>, tour: &Tour) -> Eligibility {
        let Some(identity) = identity else {
            return Eligibility::SignInRequired;
        };
        if !identity.can_book() {
            return Eligibility::WrongRole;
        }
        if !tour.is_bookable() {
            return Eligibility::NotBookable;
        }
        if self.my_booking_id.is_some() {
            return Eligibility::AlreadyBooked;
        }
        match self.sold_out() {
            None => Eligibility::CapacityUnknown,
            Some(true) => Eligibility::SoldOut,
            Some(false) => Eligibility::Bookable,
        }
    }
}

/// Tour detail as seen by one viewer
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub tour: Tour,
    pub panel: BookingPanel,
    pub sold_out: Option<bool>,
    pub eligibility: Eligibility,
}

#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub outcome: BookingOutcome,
    pub panel: BookingPanel,
}

#[derive(Debug, Clone)]
pub struct CancelReceipt {
    pub outcome: CancelOutcome,
    pub panel: BookingPanel,
}

/// A participant's booking with its tour, if the tour still exists
#[derive(Debug, Clone, Serialize)]
pub struct MyBooking {
    pub booking: Booking,
    pub tour: Option<Tour>,
}

/// Runs the booking protocols behind eligibility checks and keeps the panel in step.
///
/// The capacity check and the insert are separate operations, so two
/// participants racing for the last place can both succeed.
#[derive(Clone)]
pub struct BookingOrchestrator {
    tours: Arc<dyn TourRepository>,
    bookings: Arc<dyn BookingStore>,
    capacity: CapacityReader,
    resolver: ExistenceResolver,
    creation: CreationProtocol,
    cancellation: CancellationProtocol,
    events: Option<broadcast::Sender<BookingLifecycleEvent>>,
}

impl BookingOrchestrator {
    pub fn new(tours: Arc<dyn TourRepository>, bookings: Arc<dyn BookingStore>) -> Self {
        Self {
            capacity: CapacityReader::new(bookings.clone()),
            resolver: ExistenceResolver::new(bookings.clone()),
            creation: CreationProtocol::new(bookings.clone()),
            cancellation: CancellationProtocol::new(bookings.clone()),
            tours,
            bookings,
            events: None,
        }
    }

    pub fn with_events(mut self, events: broadcast::Sender<BookingLifecycleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn load(&self, identity: Option<&Identity>, tour_id: Uuid) -> BookingResult<BookingView> {
        let tour = self
            .tours
            .get_tour(tour_id)
            .await
            .map_err(BookingError::ReadFailed)?
            .filter(|t| t.is_visible_to(identity))
            .ok_or(BookingError::TourNotFound(tour_id))?;

        let panel = self.panel_for(identity, &tour).await?;
        Ok(BookingView {
            sold_out: panel.sold_out(),
            eligibility: panel.eligibility(identity, &tour),
            panel,
            tour,
        })
    }

    async fn panel_for(&self, identity: Option<&Identity>, tour: &Tour) -> BookingResult<BookingPanel> {
        let occupancy = match self.capacity.occupancy(tour.id).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Capacity unknown for tour {}: {}", tour.id, e);
                None
            }
        };
        let my_booking_id = self.resolver.resolve(identity, tour.id).await?;
        Ok(BookingPanel::new(tour, occupancy, my_booking_id))
    }

    pub async fn book(&self, identity: Option<&Identity>, tour_id: Uuid) -> BookingResult<BookingReceipt> {
        let view = self.load(identity, tour_id).await?;
        let participant = match (view.eligibility, identity) {
            (Eligibility::Bookable, Some(identity)) => identity.user_id,
            (eligibility, _) => return Err(BookingError::NotEligible(eligibility)),
        };

        let outcome = self.creation.create_or_reactivate(tour_id, participant).await;
        if let (Some(kind), Some(booking)) = (outcome.kind(), outcome.booking()) {
            self.publish(BookingLifecycleEvent::now(kind, booking.id, booking.tour_id, booking.participant_id));
        }

        Ok(BookingReceipt {
            panel: view.panel.after_booking(&outcome),
            outcome,
        })
    }

    pub async fn cancel(&self, identity: Option<&Identity>, booking_id: Uuid) -> BookingResult<CancelReceipt> {
        let identity = identity.ok_or(BookingError::NotEligible(Eligibility::SignInRequired))?;
        let booking = self.owned_booking(identity, booking_id).await?;

        let tour = self
            .tours
            .get_tour(booking.tour_id)
            .await
            .map_err(BookingError::ReadFailed)?
            .ok_or(BookingError::TourNotFound(booking.tour_id))?;
        let panel = self.panel_for(Some(identity), &tour).await?;

        let outcome = self.cancellation.cancel(booking_id, identity.user_id).await;
        if let (Some(kind), Some(row)) = (outcome.kind(), outcome.booking()) {
            self.publish(BookingLifecycleEvent::now(kind, row.id, row.tour_id, row.participant_id));
        }

        Ok(CancelReceipt {
            panel: panel.after_cancel(&outcome),
            outcome,
        })
    }

    /// Non-cancelled bookings of the caller, newest first
    pub async fn my_bookings(&self, identity: &Identity) -> BookingResult<Vec<MyBooking>> {
        let bookings = self
            .bookings
            .find_bookings(&BookingFilter::new().participant(identity.user_id).active())
            .await
            .map_err(BookingError::ReadFailed)?;

        let tour_ids: Vec<Uuid> = bookings.iter().map(|b| b.tour_id).collect();
        let tours = self
            .tours
            .get_tours(&tour_ids)
            .await
            .map_err(BookingError::ReadFailed)?;

        Ok(bookings
            .into_iter()
            .map(|booking| MyBooking {
                tour: tours.iter().find(|t| t.id == booking.tour_id).cloned(),
                booking,
            })
            .collect())
    }

    pub async fn booking_detail(&self, identity: &Identity, booking_id: Uuid) -> BookingResult<MyBooking> {
        let booking = self.owned_booking(identity, booking_id).await?;
        let tour = self
            .tours
            .get_tour(booking.tour_id)
            .await
            .map_err(BookingError::ReadFailed)?;
        Ok(MyBooking { booking, tour })
    }

    async fn owned_booking(&self, identity: &Identity, booking_id: Uuid) -> BookingResult<Booking> {
        self.bookings
            .find_bookings(&BookingFilter::new().id(booking_id).participant(identity.user_id))
            .await
            .map_err(BookingError::ReadFailed)?
            .into_iter()
            .next()
            .ok_or(BookingError::NotFound(booking_id))
    }

    fn publish(&self, event: BookingLifecycleEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine
            if events.send(event).is_err() {
                debug!("No lifecycle event subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use soultrip_core::{BookingStatus, NewTour, TourStatus};
    use soultrip_shared::LifecycleKind;
    use soultrip_store::MemoryStore;

    async fn tour_with_capacity(store: &MemoryStore, max_participants: i32, status: TourStatus) -> Tour {
        store
            .create_tour(&NewTour {
                organizer_id: Uuid::new_v4(),
                organizer_name: None,
                title: "Sedona energy walk".to_string(),
                description: None,
                start_date: NaiveDate::from_ymd_opt(2026, 5, 3).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 5, 7).unwrap(),
                price: 720.0,
                currency: "USD".to_string(),
                max_participants,
                status,
                country: Some("united states".to_string()),
                difficulty: None,
                images: vec![],
            })
            .await
            .unwrap()
    }

    fn orchestrator(store: &Arc<MemoryStore>) -> BookingOrchestrator {
        BookingOrchestrator::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_fill_tour_then_block_third_participant() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 2, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let p1 = Identity::participant(Uuid::new_v4());
        let p2 = Identity::participant(Uuid::new_v4());
        let p3 = Identity::participant(Uuid::new_v4());

        let first = orchestrator.book(Some(&p1), tour.id).await.unwrap();
        assert!(matches!(first.outcome, BookingOutcome::Created(_)));
        assert_eq!(first.panel.occupancy, Some(1));

        let second = orchestrator.book(Some(&p2), tour.id).await.unwrap();
        assert_eq!(second.panel.occupancy, Some(2));
        assert_eq!(second.panel.sold_out(), Some(true));

        let view = orchestrator.load(Some(&p3), tour.id).await.unwrap();
        assert_eq!(view.eligibility, Eligibility::SoldOut);
        assert!(matches!(
            orchestrator.book(Some(&p3), tour.id).await,
            Err(BookingError::NotEligible(Eligibility::SoldOut))
        ));
    }

    #[tokio::test]
    async fn test_cancel_then_rebook_keeps_one_active_row() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 2, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let p1 = Identity::participant(Uuid::new_v4());
        orchestrator.book(Some(&Identity::participant(Uuid::new_v4())), tour.id).await.unwrap();

        let booked = orchestrator.book(Some(&p1), tour.id).await.unwrap();
        let booking_id = booked.outcome.booking_id().unwrap();

        let cancelled = orchestrator.cancel(Some(&p1), booking_id).await.unwrap();
        assert!(matches!(cancelled.outcome, CancelOutcome::Deleted(_)));
        assert_eq!(cancelled.panel.occupancy, Some(1));
        assert_eq!(cancelled.panel.my_booking_id, None);

        let again = orchestrator.book(Some(&p1), tour.id).await.unwrap();
        assert!(matches!(again.outcome, BookingOutcome::Created(_)));
        let active = store
            .count_bookings(&BookingFilter::new().tour(tour.id).participant(p1.user_id).active())
            .await
            .unwrap();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_soft_cancel_then_rebook_reuses_id() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let me = Identity::participant(Uuid::new_v4());
        store.policy.deny_booking_deletes(true);

        let booked = orchestrator.book(Some(&me), tour.id).await.unwrap();
        let booking_id = booked.outcome.booking_id().unwrap();

        let cancelled = orchestrator.cancel(Some(&me), booking_id).await.unwrap();
        assert!(matches!(cancelled.outcome, CancelOutcome::SoftCancelled(_)));
        assert_eq!(cancelled.panel.occupancy, Some(0));

        let rebooked = orchestrator.book(Some(&me), tour.id).await.unwrap();
        assert!(matches!(rebooked.outcome, BookingOutcome::Reactivated(_)));
        assert_eq!(rebooked.outcome.booking_id(), Some(booking_id));
        assert_eq!(rebooked.panel.occupancy, Some(1));
    }

    #[tokio::test]
    async fn test_double_cancel_never_decrements_twice() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let me = Identity::participant(Uuid::new_v4());
        store.policy.deny_booking_deletes(true);

        let booking_id = orchestrator.book(Some(&me), tour.id).await.unwrap().outcome.booking_id().unwrap();
        orchestrator.cancel(Some(&me), booking_id).await.unwrap();

        let second = orchestrator.cancel(Some(&me), booking_id).await.unwrap();
        assert!(matches!(second.outcome, CancelOutcome::Error(_)));
        assert_eq!(second.panel.occupancy, Some(0));

        // Deletes allowed again: removing the cancelled row is not a second cancellation
        store.policy.deny_booking_deletes(false);
        let third = orchestrator.cancel(Some(&me), booking_id).await.unwrap();
        assert!(matches!(third.outcome, CancelOutcome::Deleted(_)));
        assert_eq!(third.panel.occupancy, Some(0));
    }

    #[tokio::test]
    async fn test_cannot_cancel_another_participants_booking() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let owner = Identity::participant(Uuid::new_v4());
        let booking_id = orchestrator.book(Some(&owner), tour.id).await.unwrap().outcome.booking_id().unwrap();

        let intruder = Identity::participant(Uuid::new_v4());
        assert!(matches!(
            orchestrator.cancel(Some(&intruder), booking_id).await,
            Err(BookingError::NotFound(_))
        ));
        let rows = store.find_bookings(&BookingFilter::new().id(booking_id)).await.unwrap();
        assert_eq!(rows[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_eligibility_for_each_viewer() {
        let store = Arc::new(MemoryStore::new());
        let published = tour_with_capacity(&store, 3, TourStatus::Published).await;
        let draft = tour_with_capacity(&store, 3, TourStatus::Draft).await;
        let orchestrator = orchestrator(&store);

        let anonymous = orchestrator.load(None, published.id).await.unwrap();
        assert_eq!(anonymous.eligibility, Eligibility::SignInRequired);

        let organizer = Identity::organizer(Uuid::new_v4());
        let view = orchestrator.load(Some(&organizer), published.id).await.unwrap();
        assert_eq!(view.eligibility, Eligibility::WrongRole);

        let draft_owner = Identity::participant(draft.organizer_id);
        let view = orchestrator.load(Some(&draft_owner), draft.id).await.unwrap();
        assert_eq!(view.eligibility, Eligibility::NotBookable);

        assert!(matches!(
            orchestrator.load(None, draft.id).await,
            Err(BookingError::TourNotFound(_))
        ));

        let me = Identity::participant(Uuid::new_v4());
        orchestrator.book(Some(&me), published.id).await.unwrap();
        let view = orchestrator.load(Some(&me), published.id).await.unwrap();
        assert_eq!(view.eligibility, Eligibility::AlreadyBooked);
    }

    #[test]
    fn test_unknown_capacity_is_never_bookable() {
        let tour = Tour {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            organizer_name: None,
            title: "Lisbon sound bath".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 2).unwrap(),
            price: 90.0,
            currency: "EUR".to_string(),
            max_participants: 10,
            status: TourStatus::Published,
            country: None,
            difficulty: None,
            images: vec![],
            created_at: chrono::Utc::now(),
        };
        let panel = BookingPanel::new(&tour, None, None);
        let me = Identity::participant(Uuid::new_v4());
        assert_eq!(panel.eligibility(Some(&me), &tour), Eligibility::CapacityUnknown);
    }

    #[tokio::test]
    async fn test_failed_count_blocks_booking() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let me = Identity::participant(Uuid::new_v4());
        store.policy.fail_counts(true);

        let view = orchestrator.load(Some(&me), tour.id).await.unwrap();
        assert_eq!(view.panel.occupancy, None);
        assert_eq!(view.sold_out, None);
        assert_eq!(view.eligibility, Eligibility::CapacityUnknown);

        assert!(matches!(
            orchestrator.book(Some(&me), tour.id).await,
            Err(BookingError::NotEligible(Eligibility::CapacityUnknown))
        ));
        assert!(store.find_bookings(&BookingFilter::new().tour(tour.id)).await.unwrap().is_empty());

        store.policy.fail_counts(false);
        let booked = orchestrator.book(Some(&me), tour.id).await.unwrap();
        assert_eq!(booked.panel.occupancy, Some(1));
    }

    #[tokio::test]
    async fn test_lifecycle_events_are_broadcast() {
        let store = Arc::new(MemoryStore::new());
        let tour = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let (tx, mut rx) = broadcast::channel(8);
        let orchestrator = orchestrator(&store).with_events(tx);
        let me = Identity::participant(Uuid::new_v4());

        let booking_id = orchestrator.book(Some(&me), tour.id).await.unwrap().outcome.booking_id().unwrap();
        orchestrator.cancel(Some(&me), booking_id).await.unwrap();

        let created = rx.recv().await.unwrap();
        assert_eq!(created.kind, LifecycleKind::Created);
        assert_eq!(created.booking_id, booking_id);
        assert_eq!(rx.recv().await.unwrap().kind, LifecycleKind::Deleted);
    }

    #[tokio::test]
    async fn test_my_bookings_excludes_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let a = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let b = tour_with_capacity(&store, 4, TourStatus::Published).await;
        let orchestrator = orchestrator(&store);
        let me = Identity::participant(Uuid::new_v4());
        store.policy.deny_booking_deletes(true);

        orchestrator.book(Some(&me), a.id).await.unwrap();
        let gone = orchestrator.book(Some(&me), b.id).await.unwrap().outcome.booking_id().unwrap();
        orchestrator.cancel(Some(&me), gone).await.unwrap();

        let mine = orchestrator.my_bookings(&me).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].tour.as_ref().map(|t| t.id), Some(a.id));

        let detail = orchestrator.booking_detail(&me, gone).await.unwrap();
        assert_eq!(detail.booking.status, BookingStatus::Cancelled);
    }
}
