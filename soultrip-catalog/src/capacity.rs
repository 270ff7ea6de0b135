use soultrip_core::{BookingFilter, BookingStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::CatalogResult;

/// Derives occupancy from booking rows. Nothing is cached: every call
/// re-counts, so a failed read surfaces as an error and never as zero.
#[derive(Clone)]
pub struct CapacityReader {
    bookings: Arc<dyn BookingStore>,
}

impl CapacityReader {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    /// Number of non-cancelled bookings; an unknown tour counts zero
    pub async fn occupancy(&self, tour_id: Uuid) -> CatalogResult<u64> {
        let count = self
            .bookings
            .count_bookings(&BookingFilter::new().tour(tour_id).active())
            .await?;
        Ok(count)
    }
}
