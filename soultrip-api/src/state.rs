use soultrip_booking::BookingOrchestrator;
use soultrip_catalog::{CapacityReader, ParticipantDirectory, ProfileManager, TourListing, TourManager};
use soultrip_core::{BookingStore, ProfileRepository, TourRepository};
use soultrip_search::SearchInferrer;
use soultrip_shared::{BookingLifecycleEvent, Masked};
use soultrip_store::MemoryStore;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub tours: Arc<TourManager>,
    pub listing: Arc<TourListing>,
    pub participants: Arc<ParticipantDirectory>,
    pub bookings: Arc<BookingOrchestrator>,
    pub profiles: Arc<ProfileManager>,
    pub inference: Arc<SearchInferrer>,
    pub events: broadcast::Sender<BookingLifecycleEvent>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        tour_repo: Arc<dyn TourRepository>,
        booking_store: Arc<dyn BookingStore>,
        profiles: Arc<dyn ProfileRepository>,
        inference: SearchInferrer,
        auth: AuthConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(100);
        let capacity = CapacityReader::new(booking_store.clone());

        Self {
            tours: Arc::new(TourManager::new(tour_repo.clone())),
            listing: Arc::new(TourListing::new(tour_repo.clone(), capacity)),
            participants: Arc::new(ParticipantDirectory::new(
                tour_repo.clone(),
                booking_store.clone(),
                profiles.clone(),
            )),
            bookings: Arc::new(
                BookingOrchestrator::new(tour_repo, booking_store).with_events(events.clone()),
            ),
            profiles: Arc::new(ProfileManager::new(profiles)),
            inference: Arc::new(inference),
            events,
            auth,
        }
    }

    /// Every repository backed by one in-memory store
    pub fn in_memory(store: Arc<MemoryStore>, inference: SearchInferrer, auth: AuthConfig) -> Self {
        Self::new(store.clone(), store.clone(), store, inference, auth)
    }
}
