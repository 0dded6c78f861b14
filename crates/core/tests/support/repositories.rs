//! In-memory mock implementations of the calendar sync ports
//!
//! Provide deterministic state for orchestrator and engine tests without a
//! database or network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use roost_core::calendar::ports::{FeedFetcher, ListingRepository, ReservationRepository};
use roost_domain::{
    CalendarFeed, ImportedReservation, Listing, NewReservation, Reservation, ReservationDates,
    Result, RoostError,
};

/// In-memory mock for `ListingRepository`
#[derive(Default)]
pub struct MockListingRepository {
    listings: Mutex<Vec<Listing>>,
}

impl MockListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience helper for seeding a listing
    pub fn with_listing(self, listing: Listing) -> Self {
        self.listings.lock().push(listing);
        self
    }

    /// Snapshot of a stored listing, for assertions
    pub fn listing(&self, listing_id: &str) -> Option<Listing> {
        self.listings.lock().iter().find(|l| l.id == listing_id).cloned()
    }

    /// Last-sync timestamp recorded for a listing
    pub fn last_synced(&self, listing_id: &str) -> Option<DateTime<Utc>> {
        self.listing(listing_id).and_then(|l| l.last_ics_sync_at)
    }
}

#[async_trait]
impl ListingRepository for MockListingRepository {
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>> {
        Ok(self.listings.lock().iter().find(|l| l.id == listing_id).cloned())
    }

    async fn find_listings_with_feeds(&self) -> Result<Vec<CalendarFeed>> {
        Ok(self
            .listings
            .lock()
            .iter()
            .filter_map(|l| {
                l.ics_url.as_ref().map(|url| CalendarFeed {
                    listing_id: l.id.clone(),
                    url: url.clone(),
                    title: l.title.clone(),
                    last_synced_at: l.last_ics_sync_at,
                })
            })
            .collect())
    }

    async fn set_feed_url(&self, listing_id: &str, url: Option<&str>) -> Result<()> {
        let mut listings = self.listings.lock();
        let listing = listings.iter_mut().find(|l| l.id == listing_id).ok_or_else(|| {
            RoostError::ListingNotFound(format!("listing {listing_id} does not exist"))
        })?;
        listing.ics_url = url.map(String::from);
        Ok(())
    }

    async fn set_last_synced(&self, listing_id: &str, synced_at: DateTime<Utc>) -> Result<()> {
        let mut listings = self.listings.lock();
        let listing = listings.iter_mut().find(|l| l.id == listing_id).ok_or_else(|| {
            RoostError::ListingNotFound(format!("listing {listing_id} does not exist"))
        })?;
        listing.last_ics_sync_at = Some(synced_at);
        Ok(())
    }
}

/// In-memory mock for `ReservationRepository`.
///
/// Stores both imported and paid rows so tests can assert the engine never
/// reaches outside the zero-price sentinel.
#[derive(Default)]
pub struct MockReservationRepository {
    rows: Mutex<Vec<Reservation>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience helper for seeding a reservation row
    pub fn with_reservation(self, reservation: Reservation) -> Self {
        self.rows.lock().push(reservation);
        self
    }

    /// Make every subsequent write fail, simulating a store outage
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Snapshot of all stored rows, for assertions
    pub fn all(&self) -> Vec<Reservation> {
        self.rows.lock().clone()
    }

    /// Stored imported rows for one listing
    pub fn imported_for(&self, listing_id: &str) -> Vec<Reservation> {
        self.rows
            .lock()
            .iter()
            .filter(|r| r.listing_id == listing_id && r.is_imported())
            .cloned()
            .collect()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RoostError::Database("storage offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for MockReservationRepository {
    async fn find_imported(
        &self,
        listing_id: &str,
        starting_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ImportedReservation>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| r.listing_id == listing_id && r.is_imported())
            .filter(|r| starting_after.map_or(true, |after| r.start_date >= after))
            .map(|r| ImportedReservation {
                id: r.id.clone(),
                start_date: r.start_date,
                end_date: r.end_date,
            })
            .collect())
    }

    async fn create_reservations(&self, rows: &[NewReservation]) -> Result<usize> {
        self.check_writable()?;
        let mut stored = self.rows.lock();
        for row in rows {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            stored.push(Reservation {
                id: format!("res-{n}"),
                listing_id: row.listing_id.clone(),
                user_id: row.user_id.clone(),
                start_date: row.start_date,
                end_date: row.end_date,
                total_price: row.total_price,
                created_at: Utc::now(),
            });
        }
        Ok(rows.len())
    }

    async fn update_reservation_dates(&self, updates: &[ReservationDates]) -> Result<usize> {
        self.check_writable()?;
        let mut stored = self.rows.lock();
        let mut updated = 0;
        for update in updates {
            if let Some(row) =
                stored.iter_mut().find(|r| r.id == update.id && r.is_imported())
            {
                row.start_date = update.start_date;
                row.end_date = update.end_date;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_reservations(&self, ids: &[String]) -> Result<usize> {
        self.check_writable()?;
        let mut stored = self.rows.lock();
        let before = stored.len();
        stored.retain(|r| !(r.is_imported() && ids.contains(&r.id)));
        Ok(before - stored.len())
    }
}

/// Scripted mock for `FeedFetcher`.
///
/// URLs without a configured body fail with `FeedUnavailable`, which is
/// also how tests simulate an unreachable feed.
#[derive(Default)]
pub struct MockFeedFetcher {
    bodies: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MockFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response body for a URL
    pub fn with_feed(self, url: &str, body: impl Into<String>) -> Self {
        self.bodies.lock().insert(url.to_string(), body.into());
        self
    }

    /// Delay every fetch, keeping the listing's sync lock held long enough
    /// for a competing run to observe it
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for MockFeedFetcher {
    async fn fetch_calendar(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.bodies
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| RoostError::FeedUnavailable(format!("no response from {url}")))
    }
}
