//! # Roost Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The calendar feed normalizer and reconciliation engine
//! - The sync orchestrator service
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `roost-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;

// Re-export specific items to avoid ambiguity
pub use calendar::engine::{ReconcileStats, ReconciliationEngine};
pub use calendar::normalizer::normalize_feed;
pub use calendar::ports::{FeedFetcher, ListingRepository, ReservationRepository};
pub use calendar::service::CalendarSyncService;
