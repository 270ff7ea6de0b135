pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod tour_repo;
pub mod profile_repo;
pub mod memory;

pub use database::DbClient;
pub use booking_repo::PgBookingStore;
pub use tour_repo::PgTourRepository;
pub use profile_repo::PgProfileRepository;
pub use memory::MemoryStore;
