//! Port interfaces for calendar sync collaborators
//!
//! The store and the feed fetcher are injected at construction time so the
//! orchestrator and engine can be exercised against test doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_domain::{
    CalendarFeed, ImportedReservation, Listing, NewReservation, ReservationDates, Result,
};

/// Trait for fetching a raw calendar document from an external feed
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the calendar document at `url`, returning the raw body text
    async fn fetch_calendar(&self, url: &str) -> Result<String>;
}

/// Trait for listing reads and feed-binding writes
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Fetch a listing by identifier
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>>;

    /// Enumerate listings that have a configured feed URL
    async fn find_listings_with_feeds(&self) -> Result<Vec<CalendarFeed>>;

    /// Set or clear a listing's feed URL
    async fn set_feed_url(&self, listing_id: &str, url: Option<&str>) -> Result<()>;

    /// Record the timestamp of a listing's last successful sync
    async fn set_last_synced(&self, listing_id: &str, synced_at: DateTime<Utc>) -> Result<()>;
}

/// Trait for imported-reservation reads and writes.
///
/// Implementations scope every operation to the zero-price sentinel, so
/// genuine paid bookings are structurally unreachable from the
/// reconciliation engine.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Query a listing's imported reservations, optionally restricted to
    /// records whose start instant is at or after `starting_after`
    async fn find_imported(
        &self,
        listing_id: &str,
        starting_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ImportedReservation>>;

    /// Bulk-insert reservations, returning the number created
    async fn create_reservations(&self, rows: &[NewReservation]) -> Result<usize>;

    /// Rewrite the dates of existing imported reservations by identifier,
    /// returning the number updated
    async fn update_reservation_dates(&self, updates: &[ReservationDates]) -> Result<usize>;

    /// Delete imported reservations by identifier set, returning the number
    /// removed
    async fn delete_reservations(&self, ids: &[String]) -> Result<usize>;
}
