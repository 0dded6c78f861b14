//! Reconciliation engine: converge stored imported reservations with a
//! freshly normalized feed.
//!
//! Matching is keyed on the `(start, end)` interval itself (see
//! [`roost_domain::interval_key`]); there is no per-event identifier to
//! join on. Historical imported records are never touched in incremental
//! mode, preserving the audit trail of past stays.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use roost_domain::{
    BusyInterval, Listing, NewReservation, ReservationDates, Result, RoostError,
};
use tracing::{debug, instrument};

use super::ports::ReservationRepository;

/// Write counts reported by a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Reconciliation engine over an injected reservation store
pub struct ReconciliationEngine {
    reservations: Arc<dyn ReservationRepository>,
}

impl ReconciliationEngine {
    /// Create a new engine backed by the given reservation store
    pub fn new(reservations: Arc<dyn ReservationRepository>) -> Self {
        Self { reservations }
    }

    /// Converge the listing's imported reservations to match `intervals`.
    ///
    /// Incremental mode diffs against stored future records and applies the
    /// minimal create/update/delete set. Force mode wipes every imported
    /// record for the listing (past included) and reimports from scratch.
    ///
    /// # Errors
    /// Store failures surface as `SyncFailed` carrying the cause. Writes
    /// committed before a failure are not rolled back; the run is designed
    /// to be retried rather than made transactional.
    #[instrument(
        skip(self, listing, intervals),
        fields(listing_id = %listing.id, incoming = intervals.len(), force_resync)
    )]
    pub async fn reconcile(
        &self,
        listing: &Listing,
        intervals: &[BusyInterval],
        force_resync: bool,
        now: DateTime<Utc>,
    ) -> Result<ReconcileStats> {
        if force_resync {
            self.rebuild(listing, intervals).await
        } else {
            self.converge(listing, intervals, now).await
        }
    }

    /// Destructive recovery path: wipe and reimport.
    async fn rebuild(&self, listing: &Listing, intervals: &[BusyInterval]) -> Result<ReconcileStats> {
        let existing = self
            .reservations
            .find_imported(&listing.id, None)
            .await
            .map_err(apply_failure)?;

        let deleted = if existing.is_empty() {
            0
        } else {
            let ids: Vec<String> = existing.iter().map(|r| r.id.clone()).collect();
            self.reservations.delete_reservations(&ids).await.map_err(apply_failure)?
        };

        let rows = collapse_to_rows(listing, intervals);
        let created = if rows.is_empty() {
            0
        } else {
            self.reservations.create_reservations(&rows).await.map_err(apply_failure)?
        };

        debug!(created, deleted, "force resync applied");

        Ok(ReconcileStats { created, updated: 0, deleted })
    }

    /// Incremental path: diff against stored future records.
    async fn converge(
        &self,
        listing: &Listing,
        intervals: &[BusyInterval],
        now: DateTime<Utc>,
    ) -> Result<ReconcileStats> {
        let existing = self
            .reservations
            .find_imported(&listing.id, Some(now))
            .await
            .map_err(apply_failure)?;

        // A feed that reports no events cancels every stored future record.
        if intervals.is_empty() {
            let deleted = if existing.is_empty() {
                0
            } else {
                let ids: Vec<String> = existing.iter().map(|r| r.id.clone()).collect();
                self.reservations.delete_reservations(&ids).await.map_err(apply_failure)?
            };
            return Ok(ReconcileStats { created: 0, updated: 0, deleted });
        }

        let by_key: HashMap<String, &roost_domain::ImportedReservation> =
            existing.iter().map(|record| (record.key(), record)).collect();

        let mut seen: HashSet<String> = HashSet::with_capacity(intervals.len());
        let mut creates: Vec<NewReservation> = Vec::new();
        let mut updates: Vec<ReservationDates> = Vec::new();

        for interval in intervals {
            let key = interval.key();
            // Identical (start, end) pairs collapse to one record; the
            // system tracks busy intervals, not individual bookings.
            if !seen.insert(key.clone()) {
                continue;
            }

            match by_key.get(&key) {
                Some(record) => updates.push(ReservationDates {
                    id: record.id.clone(),
                    start_date: interval.start,
                    end_date: interval.end,
                }),
                None => creates.push(imported_row(listing, interval)),
            }
        }

        // Stored records whose key never appeared are cancellations.
        let stale_ids: Vec<String> = existing
            .iter()
            .filter(|record| !seen.contains(&record.key()))
            .map(|record| record.id.clone())
            .collect();

        // The three batches touch disjoint record sets, so they can be
        // issued together; counts are reported only once all have landed.
        let (created, updated, deleted) = tokio::try_join!(
            async {
                if creates.is_empty() {
                    Ok(0)
                } else {
                    self.reservations.create_reservations(&creates).await
                }
            },
            async {
                if updates.is_empty() {
                    Ok(0)
                } else {
                    self.reservations.update_reservation_dates(&updates).await
                }
            },
            async {
                if stale_ids.is_empty() {
                    Ok(0)
                } else {
                    self.reservations.delete_reservations(&stale_ids).await
                }
            },
        )
        .map_err(apply_failure)?;

        debug!(created, updated, deleted, "incremental reconciliation applied");

        Ok(ReconcileStats { created, updated, deleted })
    }
}

/// Map the host-owned, zero-priced insert row for a busy interval.
fn imported_row(listing: &Listing, interval: &BusyInterval) -> NewReservation {
    NewReservation {
        listing_id: listing.id.clone(),
        user_id: listing.user_id.clone(),
        start_date: interval.start,
        end_date: interval.end,
        total_price: 0,
    }
}

/// Deduplicate intervals by natural key and map them to insert rows.
fn collapse_to_rows(listing: &Listing, intervals: &[BusyInterval]) -> Vec<NewReservation> {
    let mut seen = HashSet::with_capacity(intervals.len());
    intervals
        .iter()
        .filter(|interval| seen.insert(interval.key()))
        .map(|interval| imported_row(listing, interval))
        .collect()
}

fn apply_failure(err: RoostError) -> RoostError {
    RoostError::SyncFailed(err.to_string())
}
