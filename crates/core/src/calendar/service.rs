//! Sync orchestrator: drives one-listing and fleet-wide sync runs.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use roost_domain::{
    CalendarFeed, FleetSyncReport, ListingSyncResult, ListingSyncStatus, Result, RoostError,
    SyncOutcome,
};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use url::Url;

use super::engine::{ReconcileStats, ReconciliationEngine};
use super::normalizer::normalize_feed;
use super::ports::{FeedFetcher, ListingRepository, ReservationRepository};

/// Calendar sync orchestrator.
///
/// Runs the ingest → normalize → reconcile pipeline for a single listing,
/// and fans that out over every feed-configured listing for fleet runs.
/// Collaborators are injected at construction time.
pub struct CalendarSyncService {
    listings: Arc<dyn ListingRepository>,
    fetcher: Arc<dyn FeedFetcher>,
    engine: ReconciliationEngine,
    /// Per-listing guards; a second concurrent run for the same listing is
    /// rejected rather than allowed to race on a stale snapshot.
    sync_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CalendarSyncService {
    /// Create a new sync service
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        reservations: Arc<dyn ReservationRepository>,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            listings,
            fetcher,
            engine: ReconciliationEngine::new(reservations),
            sync_locks: DashMap::new(),
        }
    }

    /// Sync one listing against its external feed.
    ///
    /// The listing existence check runs before any fetch or parse work;
    /// `force_resync` selects the destructive wipe-and-reimport path.
    ///
    /// # Errors
    /// `ListingNotFound` when the listing does not exist, `SyncInProgress`
    /// when another run holds the listing's lock, `FeedUnavailable` on
    /// fetch failure, `SyncFailed` on parse or store failure.
    #[instrument(skip(self, feed_url), fields(listing_id, force_resync))]
    pub async fn sync_listing(
        &self,
        listing_id: &str,
        feed_url: &str,
        force_resync: bool,
    ) -> Result<SyncOutcome> {
        let listing = self.listings.find_listing(listing_id).await?.ok_or_else(|| {
            RoostError::ListingNotFound(format!("listing {listing_id} does not exist"))
        })?;

        let lock = self.sync_locks.entry(listing_id.to_string()).or_default().clone();
        let _guard = lock.try_lock().map_err(|_| {
            RoostError::SyncInProgress(format!("a sync is already running for listing {listing_id}"))
        })?;

        let raw = self.fetcher.fetch_calendar(feed_url).await?;

        let now = Utc::now();
        let feed = normalize_feed(&raw, now)?;
        if feed.skipped > 0 {
            warn!(
                listing_id,
                skipped = feed.skipped,
                "discarded malformed or stale events from feed"
            );
        }

        let stats = self.engine.reconcile(&listing, &feed.intervals, force_resync, now).await?;

        info!(
            listing_id,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            "calendar sync completed"
        );

        Ok(SyncOutcome {
            created: stats.created,
            updated: stats.updated,
            deleted: stats.deleted,
            message: outcome_message(&stats, force_resync, feed.intervals.is_empty()),
        })
    }

    /// Sync every listing that has a configured feed URL.
    ///
    /// Listings are processed independently: a failure is recorded in that
    /// listing's result entry and processing continues with the rest. The
    /// last-sync timestamp advances only for listings that synced cleanly.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<FleetSyncReport> {
        let feeds = self.listings.find_listings_with_feeds().await?;

        let mut results = Vec::with_capacity(feeds.len());
        let mut synced = 0;
        let mut failed = 0;

        for feed in &feeds {
            match self.sync_and_stamp(feed).await {
                Ok(_) => {
                    synced += 1;
                    results.push(ListingSyncResult {
                        listing_id: feed.listing_id.clone(),
                        title: feed.title.clone(),
                        status: ListingSyncStatus::Synced,
                        error: None,
                    });
                }
                Err(err) => {
                    failed += 1;
                    warn!(listing_id = %feed.listing_id, error = %err, "listing sync failed");
                    results.push(ListingSyncResult {
                        listing_id: feed.listing_id.clone(),
                        title: feed.title.clone(),
                        status: ListingSyncStatus::Failed,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        info!(total = feeds.len(), synced, failed, "fleet sync completed");

        Ok(FleetSyncReport { total: feeds.len(), synced, failed, results })
    }

    /// Set or clear a listing's feed URL.
    ///
    /// # Errors
    /// `ListingNotFound` for unknown listings, `InvalidInput` when the URL
    /// does not parse or does not look like a calendar feed.
    pub async fn set_feed_url(&self, listing_id: &str, url: Option<&str>) -> Result<()> {
        self.listings.find_listing(listing_id).await?.ok_or_else(|| {
            RoostError::ListingNotFound(format!("listing {listing_id} does not exist"))
        })?;

        if let Some(candidate) = url {
            Url::parse(candidate).map_err(|_| {
                RoostError::InvalidInput(format!("'{candidate}' is not a valid URL"))
            })?;
            if !candidate.contains(".ics") && !candidate.contains("calendar") {
                return Err(RoostError::InvalidInput(format!(
                    "'{candidate}' does not look like a calendar feed URL"
                )));
            }
        }

        self.listings.set_feed_url(listing_id, url).await
    }

    /// Fleet sync never force-resyncs; on success the listing's last-sync
    /// timestamp is stamped.
    async fn sync_and_stamp(&self, feed: &CalendarFeed) -> Result<SyncOutcome> {
        let outcome = self.sync_listing(&feed.listing_id, &feed.url, false).await?;
        self.listings.set_last_synced(&feed.listing_id, Utc::now()).await?;
        Ok(outcome)
    }
}

/// Human-readable summary mirroring the counts of the run.
fn outcome_message(stats: &ReconcileStats, force_resync: bool, feed_was_empty: bool) -> String {
    if force_resync {
        if stats.created == 0 {
            format!("Force resync completed: {} reservations cleared", stats.deleted)
        } else {
            format!(
                "Force resync completed: {} cleared, {} new reservations imported",
                stats.deleted, stats.created
            )
        }
    } else if feed_was_empty {
        if stats.deleted > 0 {
            format!("Cleaned up {} cancelled reservations", stats.deleted)
        } else {
            "No valid events found to sync".to_string()
        }
    } else {
        format!(
            "Synced {} new, {} updated, and {} deleted reservations",
            stats.created, stats.updated, stats.deleted
        )
    }
}
