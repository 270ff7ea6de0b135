use serde::Serialize;
use soultrip_core::{Availability, PageRange, Tour, TourFilters, TourRepository};
use std::sync::Arc;
use tracing::warn;

use crate::capacity::CapacityReader;
use crate::CatalogResult;

/// Page sizes the listing accepts
pub const PER_PAGE_OPTIONS: [u64; 4] = [6, 9, 12, 18];
pub const DEFAULT_PAGE_SIZE: u64 = 9;

/// A published tour as shown on the listing.
///
/// `availability` is `None` when occupancy could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct TourSummary {
    #[serde(flatten)]
    pub tour: Tour,
    pub occupancy: Option<u64>,
    pub availability: Option<Availability>,
}

pub struct TourListing {
    tours: Arc<dyn TourRepository>,
    capacity: CapacityReader,
}

impl TourListing {
    pub fn new(tours: Arc<dyn TourRepository>, capacity: CapacityReader) -> Self {
        Self { tours, capacity }
    }

    pub async fn search(
        &self,
        filters: &TourFilters,
        range: Option<PageRange>,
    ) -> CatalogResult<Vec<TourSummary>> {
        let tours = self.tours.list_published(filters, range).await?;

        let mut summaries = Vec::with_capacity(tours.len());
        for tour in tours {
            let occupancy = match self.capacity.occupancy(tour.id).await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!("Occupancy unavailable for tour {}: {}", tour.id, e);
                    None
                }
            };
            summaries.push(TourSummary {
                availability: occupancy.map(|count| tour.availability(count)),
                occupancy,
                tour,
            });
        }
        Ok(summaries)
    }
}

/// Accumulates listing pages for "load more" style browsing.
///
/// A page shorter than the page size ends the listing.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    pub offset: u64,
    pub page_size: u64,
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Paginator<T> {
    /// Unsupported page sizes fall back to the default
    pub fn new(page_size: u64) -> Self {
        let page_size = if PER_PAGE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            offset: 0,
            page_size,
            items: Vec::new(),
            has_more: true,
        }
    }

    /// Range to request next; `reset` starts again from the first row
    pub fn next_range(&self, reset: bool) -> PageRange {
        let from = if reset { 0 } else { self.offset };
        PageRange::new(from, self.page_size)
    }

    pub fn absorb(&mut self, reset: bool, page: Vec<T>) {
        if reset {
            self.items.clear();
            self.offset = 0;
        }
        let len = page.len() as u64;
        self.has_more = len == self.page_size;
        self.offset = self.offset.saturating_add(len);
        self.items.extend(page);
    }

    /// Change page size; the accumulated listing restarts
    pub fn resize(&mut self, page_size: u64) {
        *self = Self::new(page_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use soultrip_core::{BookingStore, NewBooking, NewTour, TourSort, TourStatus};
    use soultrip_store::MemoryStore;
    use uuid::Uuid;

    async fn seed(store: &MemoryStore, price: f64, status: TourStatus, max_participants: i32) -> Tour {
        store
            .create_tour(&NewTour {
                organizer_id: Uuid::new_v4(),
                organizer_name: None,
                title: format!("Retreat {}", price),
                description: None,
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
                price,
                currency: "EUR".to_string(),
                max_participants,
                status,
                country: Some("portugal".to_string()),
                difficulty: None,
                images: vec![],
            })
            .await
            .unwrap()
    }

    fn listing(store: &Arc<MemoryStore>) -> TourListing {
        TourListing::new(store.clone(), CapacityReader::new(store.clone()))
    }

    #[tokio::test]
    async fn test_search_hides_drafts_and_marks_sold_out() {
        let store = Arc::new(MemoryStore::new());
        let full = seed(&store, 300.0, TourStatus::Published, 1).await;
        seed(&store, 500.0, TourStatus::Published, 4).await;
        seed(&store, 100.0, TourStatus::Draft, 4).await;
        store.insert_booking(&NewBooking::pending(full.id, Uuid::new_v4())).await.unwrap();

        let filters = TourFilters {
            sort: TourSort::PriceAsc,
            ..Default::default()
        };
        let results = listing(&store).search(&filters, None).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].tour.id, full.id);
        assert_eq!(results[0].availability, Some(Availability::SoldOut));
        assert_eq!(results[1].availability, Some(Availability::Available));
    }

    #[tokio::test]
    async fn test_failed_count_leaves_availability_unknown() {
        let store = Arc::new(MemoryStore::new());
        let tour = seed(&store, 250.0, TourStatus::Published, 2).await;
        store.policy.fail_counts(true);

        let results = listing(&store).search(&TourFilters::default(), None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tour.id, tour.id);
        assert_eq!(results[0].occupancy, None);
        assert_eq!(results[0].availability, None);
    }

    #[tokio::test]
    async fn test_paging_until_short_page() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..8 {
            seed(&store, 100.0 + i as f64, TourStatus::Published, 10).await;
        }
        let listing = listing(&store);
        let mut pager = Paginator::new(6);

        let first = listing.search(&TourFilters::default(), Some(pager.next_range(true))).await.unwrap();
        pager.absorb(true, first);
        assert_eq!(pager.items.len(), 6);
        assert!(pager.has_more);

        let second = listing.search(&TourFilters::default(), Some(pager.next_range(false))).await.unwrap();
        pager.absorb(false, second);
        assert_eq!(pager.items.len(), 8);
        assert_eq!(pager.offset, 8);
        assert!(!pager.has_more);
    }

    #[test]
    fn test_paginator_reset_and_page_sizes() {
        let mut pager: Paginator<u32> = Paginator::new(12);
        pager.absorb(false, (0..12).collect());
        assert_eq!(pager.next_range(false), PageRange { from: 12, to: 23 });

        pager.absorb(true, vec![1, 2]);
        assert_eq!(pager.items, vec![1, 2]);
        assert!(!pager.has_more);

        pager.offset = u64::MAX - 1;
        pager.absorb(false, vec![3, 4, 5]);
        assert_eq!(pager.offset, u64::MAX);

        pager.resize(7);
        assert_eq!(pager.page_size, DEFAULT_PAGE_SIZE);
        assert!(pager.items.is_empty());
    }
}
