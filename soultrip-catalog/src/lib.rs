pub mod capacity;
pub mod management;
pub mod listing;
pub mod participants;
pub mod profiles;

pub use capacity::CapacityReader;
pub use management::{TourDraft, TourManager};
pub use listing::{Paginator, TourListing, TourSummary, DEFAULT_PAGE_SIZE, PER_PAGE_OPTIONS};
pub use participants::{ParticipantDirectory, ParticipantEntry};
pub use profiles::ProfileManager;

use soultrip_core::StoreError;

/// Catalog-level errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Invalid tour: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
