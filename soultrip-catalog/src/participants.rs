use serde::Serialize;
use soultrip_core::{
    Booking, BookingFilter, BookingStore, Identity, ProfileRepository, TourRepository, UserProfile,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantEntry {
    pub booking: Booking,
    pub profile: Option<UserProfile>,
}

/// Who is going on a tour.
pub struct ParticipantDirectory {
    tours: Arc<dyn TourRepository>,
    bookings: Arc<dyn BookingStore>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ParticipantDirectory {
    pub fn new(
        tours: Arc<dyn TourRepository>,
        bookings: Arc<dyn BookingStore>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self { tours, bookings, profiles }
    }

    /// Active bookings of a visible tour, with public profiles
    pub async fn participants(
        &self,
        viewer: Option<&Identity>,
        tour_id: Uuid,
    ) -> CatalogResult<Vec<ParticipantEntry>> {
        let tour = self
            .tours
            .get_tour(tour_id)
            .await?
            .filter(|t| t.is_visible_to(viewer))
            .ok_or_else(|| CatalogError::NotFound(format!("tour {}", tour_id)))?;

        let bookings = self
            .bookings
            .find_bookings(&BookingFilter::new().tour(tour.id).active())
            .await?;
        self.with_profiles(bookings).await
    }

    /// Every booking of the organizer's tour, cancelled ones included
    pub async fn roster(
        &self,
        identity: Option<&Identity>,
        tour_id: Uuid,
    ) -> CatalogResult<Vec<ParticipantEntry>> {
        let identity = identity.ok_or_else(|| CatalogError::Forbidden("sign in required".to_string()))?;
        let tour = self
            .tours
            .get_tour(tour_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tour {}", tour_id)))?;
        if tour.organizer_id != identity.user_id {
            return Err(CatalogError::Forbidden("roster is visible to the organizer only".to_string()));
        }

        let bookings = self.bookings.find_bookings(&BookingFilter::new().tour(tour.id)).await?;
        self.with_profiles(bookings).await
    }

    async fn with_profiles(&self, bookings: Vec<Booking>) -> CatalogResult<Vec<ParticipantEntry>> {
        let ids: Vec<Uuid> = bookings.iter().map(|b| b.participant_id).collect();
        let mut profiles: HashMap<Uuid, UserProfile> = self
            .profiles
            .get_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|booking| ParticipantEntry {
                profile: profiles.remove(&booking.participant_id),
                booking,
            })
            .collect())
    }
}
