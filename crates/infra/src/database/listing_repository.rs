//! SQLite-backed implementation of the ListingRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_core::calendar::ports::ListingRepository;
use roost_domain::{CalendarFeed, Listing, Result, RoostError};
use rusqlite::params;
use tracing::{debug, instrument};

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite implementation of ListingRepository
pub struct SqliteListingRepository {
    db: Arc<DbManager>,
}

impl SqliteListingRepository {
    /// Create a new listing repository
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn ts_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| RoostError::Database(format!("timestamp {ts} out of range")))
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    #[instrument(skip(self))]
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>> {
        let conn = self.db.get_connection()?;

        let result = conn.query_row(
            "SELECT id, user_id, title, ics_url, last_ics_sync_at
             FROM listings
             WHERE id = ?1",
            params![listing_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            },
        );

        match result {
            Ok((id, user_id, title, ics_url, last_sync_ts)) => {
                let last_ics_sync_at = last_sync_ts.map(ts_to_utc).transpose()?;
                Ok(Some(Listing { id, user_id, title, ics_url, last_ics_sync_at }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_listings_with_feeds(&self) -> Result<Vec<CalendarFeed>> {
        let conn = self.db.get_connection()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, ics_url, title, last_ics_sync_at
                 FROM listings
                 WHERE ics_url IS NOT NULL
                 ORDER BY id ASC",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        let mut feeds = Vec::with_capacity(rows.len());
        for (listing_id, url, title, last_sync_ts) in rows {
            let last_synced_at = last_sync_ts.map(ts_to_utc).transpose()?;
            feeds.push(CalendarFeed { listing_id, url, title, last_synced_at });
        }

        debug!(count = feeds.len(), "enumerated feed-configured listings");

        Ok(feeds)
    }

    #[instrument(skip(self))]
    async fn set_feed_url(&self, listing_id: &str, url: Option<&str>) -> Result<()> {
        let conn = self.db.get_connection()?;

        let changed = conn
            .execute("UPDATE listings SET ics_url = ?1 WHERE id = ?2", params![url, listing_id])
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(RoostError::ListingNotFound(format!(
                "listing {listing_id} does not exist"
            )));
        }

        debug!(listing_id, configured = url.is_some(), "updated listing feed URL");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_last_synced(&self, listing_id: &str, synced_at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.get_connection()?;

        let changed = conn
            .execute(
                "UPDATE listings SET last_ics_sync_at = ?1 WHERE id = ?2",
                params![synced_at.timestamp(), listing_id],
            )
            .map_err(InfraError::from)?;

        if changed == 0 {
            return Err(RoostError::ListingNotFound(format!(
                "listing {listing_id} does not exist"
            )));
        }

        Ok(())
    }
}
