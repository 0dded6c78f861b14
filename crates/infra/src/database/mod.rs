//! SQLite-backed implementations of the store ports

mod listing_repository;
mod manager;
mod reservation_repository;

pub use listing_repository::SqliteListingRepository;
pub use manager::{DbConnection, DbManager};
pub use reservation_repository::SqliteReservationRepository;
