use async_trait::async_trait;
use chrono::Utc;
use soultrip_core::{
    Booking, BookingFilter, BookingPatch, BookingStore, Identity, NewBooking, NewTour, PageRange,
    ProfilePatch, ProfileRepository, StoreError, StoreResult, Tour, TourFilters, TourPatch,
    TourRepository, UserProfile,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Switches that make the in-memory store behave like a platform whose
/// access policies reject some operations, or whose reads are failing.
#[derive(Debug, Default)]
pub struct AccessPolicy {
    deny_booking_deletes: AtomicBool,
    deny_booking_updates: AtomicBool,
    fail_reads: AtomicBool,
    fail_counts: AtomicBool,
}

impl AccessPolicy {
    pub fn deny_booking_deletes(&self, deny: bool) {
        self.deny_booking_deletes.store(deny, Ordering::SeqCst);
    }

    pub fn deny_booking_updates(&self, deny: bool) {
        self.deny_booking_updates.store(deny, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail only occupancy counts; tours and bookings stay readable
    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Tables {
    tours: HashMap<Uuid, Tour>,
    // Insertion order doubles as creation order
    bookings: Vec<Booking>,
    profiles: HashMap<Uuid, UserProfile>,
}

/// In-memory implementation of every storage trait.
///
/// Mirrors the relational schema's constraints: one booking row per
/// (tour, participant), bookings reference an existing tour, and deleting a
/// tour cascades to its bookings.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    pub policy: AccessPolicy,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: UserProfile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.policy.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let mut tables = self.tables.write().await;

        if !tables.tours.contains_key(&booking.tour_id) {
            return Err(StoreError::Other(format!(
                "bookings_tour_id_fkey: tour {} does not exist",
                booking.tour_id
            )));
        }
        let duplicate = tables
            .bookings
            .iter()
            .any(|b| b.tour_id == booking.tour_id && b.participant_id == booking.participant_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"bookings_tour_participant_key\"".to_string(),
            ));
        }

        let row = Booking {
            id: Uuid::new_v4(),
            tour_id: booking.tour_id,
            participant_id: booking.participant_id,
            status: booking.status,
            payment_status: booking.payment_status,
            created_at: Utc::now(),
        };
        tables.bookings.push(row.clone());
        Ok(row)
    }

    async fn update_bookings(
        &self,
        filter: &BookingFilter,
        patch: &BookingPatch,
    ) -> StoreResult<Option<Booking>> {
        if self.policy.deny_booking_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Denied("update on bookings".to_string()));
        }
        let mut tables = self.tables.write().await;

        let mut first = None;
        for booking in tables.bookings.iter_mut().filter(|b| filter.matches(b)) {
            booking.apply(patch);
            if first.is_none() {
                first = Some(booking.clone());
            }
        }
        Ok(first)
    }

    async fn delete_bookings(&self, filter: &BookingFilter) -> StoreResult<Option<Booking>> {
        if self.policy.deny_booking_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Denied("delete on bookings".to_string()));
        }
        let mut tables = self.tables.write().await;

        let (deleted, kept): (Vec<Booking>, Vec<Booking>) =
            tables.bookings.drain(..).partition(|b| filter.matches(b));
        tables.bookings = kept;
        Ok(deleted.into_iter().next())
    }

    async fn count_bookings(&self, filter: &BookingFilter) -> StoreResult<u64> {
        self.check_reads()?;
        if self.policy.fail_counts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated count failure".to_string()));
        }
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().filter(|b| filter.matches(b)).count() as u64)
    }

    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .rev()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn create_tour(&self, tour: &NewTour) -> StoreResult<Tour> {
        let row = Tour {
            id: Uuid::new_v4(),
            organizer_id: tour.organizer_id,
            organizer_name: tour.organizer_name.clone(),
            title: tour.title.clone(),
            description: tour.description.clone(),
            start_date: tour.start_date,
            end_date: tour.end_date,
            price: tour.price,
            currency: tour.currency.clone(),
            max_participants: tour.max_participants,
            status: tour.status,
            country: tour.country.as_deref().map(str::to_lowercase),
            difficulty: tour.difficulty,
            images: tour.images.clone(),
            created_at: Utc::now(),
        };
        self.tables.write().await.tours.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_tour(&self, id: Uuid) -> StoreResult<Option<Tour>> {
        self.check_reads()?;
        Ok(self.tables.read().await.tours.get(&id).cloned())
    }

    async fn get_tours(&self, ids: &[Uuid]) -> StoreResult<Vec<Tour>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.tours.get(id).cloned()).collect())
    }

    async fn update_tour(
        &self,
        id: Uuid,
        organizer_id: Uuid,
        patch: &TourPatch,
    ) -> StoreResult<Option<Tour>> {
        let mut tables = self.tables.write().await;
        match tables.tours.get_mut(&id) {
            Some(tour) if tour.organizer_id == organizer_id => {
                tour.apply(patch);
                tour.country = tour.country.as_deref().map(str::to_lowercase);
                Ok(Some(tour.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_tour(&self, id: Uuid, organizer_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables.tours.get(&id).is_some_and(|t| t.organizer_id == organizer_id);
        if !owned {
            return Ok(false);
        }
        tables.tours.remove(&id);
        tables.bookings.retain(|b| b.tour_id != id);
        Ok(true)
    }

    async fn list_published(
        &self,
        filters: &TourFilters,
        range: Option<PageRange>,
    ) -> StoreResult<Vec<Tour>> {
        self.check_reads()?;
        let tables = self.tables.read().await;

        let mut tours: Vec<Tour> = tables
            .tours
            .values()
            .filter(|t| t.is_bookable() && filters.matches(t))
            .cloned()
            .collect();
        tours.sort_by(|a, b| filters.sort.compare(a, b).then_with(|| a.id.cmp(&b.id)));

        Ok(match range {
            Some(range) => tours
                .into_iter()
                .skip(usize::try_from(range.from).unwrap_or(usize::MAX))
                .take(usize::try_from(range.limit()).unwrap_or(usize::MAX))
                .collect(),
            None => tours,
        })
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Tour>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        let mut tours: Vec<Tour> = tables
            .tours
            .values()
            .filter(|t| t.organizer_id == organizer_id)
            .cloned()
            .collect();
        tours.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tours)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.profiles.get(id).cloned()).collect())
    }

    async fn ensure_profile(&self, identity: &Identity) -> StoreResult<UserProfile> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .entry(identity.user_id)
            .or_insert_with(|| UserProfile::blank(identity));
        Ok(profile.clone())
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<Option<UserProfile>> {
        let mut tables = self.tables.write().await;
        Ok(tables.profiles.get_mut(&id).map(|profile| {
            profile.apply(patch);
            profile.clone()
        }))
    }
}
