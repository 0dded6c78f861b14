//! SQLite-backed implementation of the ReservationRepository port.
//!
//! Every statement is scoped to `total_price = 0`, so paid bookings are
//! unreachable from this repository even if handed a stray identifier.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_core::calendar::ports::ReservationRepository;
use roost_domain::{ImportedReservation, NewReservation, ReservationDates, Result, RoostError};
use rusqlite::params;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite implementation of ReservationRepository
pub struct SqliteReservationRepository {
    db: Arc<DbManager>,
}

impl SqliteReservationRepository {
    /// Create a new reservation repository
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn ts_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| RoostError::Database(format!("timestamp {ts} out of range")))
}

#[async_trait]
impl ReservationRepository for SqliteReservationRepository {
    #[instrument(skip(self))]
    async fn find_imported(
        &self,
        listing_id: &str,
        starting_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ImportedReservation>> {
        let conn = self.db.get_connection()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, start_date, end_date
                 FROM reservations
                 WHERE listing_id = ?1
                   AND total_price = 0
                   AND start_date >= ?2
                 ORDER BY start_date ASC",
            )
            .map_err(InfraError::from)?;

        let floor = starting_after.map_or(i64::MIN, |after| after.timestamp());
        let rows = stmt
            .query_map(params![listing_id, floor], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for (id, start_ts, end_ts) in rows {
            reservations.push(ImportedReservation {
                id,
                start_date: ts_to_utc(start_ts)?,
                end_date: ts_to_utc(end_ts)?,
            });
        }

        debug!(listing_id, count = reservations.len(), "loaded imported reservations");

        Ok(reservations)
    }

    #[instrument(skip(self, rows))]
    async fn create_reservations(&self, rows: &[NewReservation]) -> Result<usize> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        let now = Utc::now().timestamp();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO reservations
                         (id, listing_id, user_id, start_date, end_date, total_price, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(InfraError::from)?;

            for row in rows {
                stmt.execute(params![
                    Uuid::now_v7().to_string(),
                    row.listing_id,
                    row.user_id,
                    row.start_date.timestamp(),
                    row.end_date.timestamp(),
                    row.total_price,
                    now,
                ])
                .map_err(InfraError::from)?;
            }
        }

        tx.commit().map_err(InfraError::from)?;

        debug!(created = rows.len(), "bulk-inserted reservations");

        Ok(rows.len())
    }

    #[instrument(skip(self, updates))]
    async fn update_reservation_dates(&self, updates: &[ReservationDates]) -> Result<usize> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        let mut updated = 0;
        {
            let mut stmt = tx
                .prepare(
                    "UPDATE reservations
                     SET start_date = ?1, end_date = ?2
                     WHERE id = ?3 AND total_price = 0",
                )
                .map_err(InfraError::from)?;

            for update in updates {
                updated += stmt
                    .execute(params![
                        update.start_date.timestamp(),
                        update.end_date.timestamp(),
                        update.id,
                    ])
                    .map_err(InfraError::from)?;
            }
        }

        tx.commit().map_err(InfraError::from)?;

        debug!(updated, "rewrote reservation dates");

        Ok(updated)
    }

    #[instrument(skip(self, ids))]
    async fn delete_reservations(&self, ids: &[String]) -> Result<usize> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        let mut deleted = 0;
        {
            let mut stmt = tx
                .prepare("DELETE FROM reservations WHERE id = ?1 AND total_price = 0")
                .map_err(InfraError::from)?;

            for id in ids {
                deleted += stmt.execute(params![id]).map_err(InfraError::from)?;
            }
        }

        tx.commit().map_err(InfraError::from)?;

        debug!(deleted, "deleted reservations");

        Ok(deleted)
    }
}
