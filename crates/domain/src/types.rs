//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rental listing, including its optional external calendar binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    /// The host who owns the listing
    pub user_id: String,
    pub title: String,
    /// External ICS feed URL, if an operator configured one
    pub ics_url: Option<String>,
    /// Timestamp of the last successful feed sync
    pub last_ics_sync_at: Option<DateTime<Utc>>,
}

/// Fleet enumeration projection: a listing with a configured feed URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarFeed {
    pub listing_id: String,
    pub url: String,
    pub title: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// A reservation record.
///
/// Records imported from an external calendar are distinguished from
/// genuine paid bookings by the zero-price sentinel; see
/// [`Reservation::is_imported`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub listing_id: String,
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Total price in minor currency units; exactly zero for imported records
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether this record was produced by calendar sync rather than a guest
    pub fn is_imported(&self) -> bool {
        self.total_price == 0
    }
}

/// The reconciliation engine's view of a stored imported reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedReservation {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl ImportedReservation {
    /// Natural key of the stored interval; see [`interval_key`]
    pub fn key(&self) -> String {
        interval_key(self.start_date, self.end_date)
    }
}

/// Row for bulk reservation inserts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub listing_id: String,
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: i64,
}

/// Date rewrite for bulk reservation updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDates {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A busy period reported by an external calendar feed.
///
/// Has no identity beyond its `(start, end)` pair; that pair is the natural
/// key used to match against stored imported reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Natural key of the interval; see [`interval_key`]
    pub fn key(&self) -> String {
        interval_key(self.start, self.end)
    }
}

/// Identity rule for busy intervals and imported reservations: the
/// concatenation of both instants in RFC 3339.
///
/// The feed format provides no stable per-event identifier, so matching is
/// keyed on the interval itself rather than a synthetic UID. Two events
/// with identical `(start, end)` pairs collapse to the same key.
pub fn interval_key(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{}-{}", start.to_rfc3339(), end.to_rfc3339())
}

/// Output of feed normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedFeed {
    /// Busy intervals that survived filtering
    pub intervals: Vec<BusyInterval>,
    /// Count of events discarded as malformed or stale
    pub skipped: usize,
}

/// Result of syncing one listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub message: String,
}

/// Per-listing status within a fleet sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSyncStatus {
    Synced,
    Failed,
}

/// Per-listing detail entry in a fleet sync report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSyncResult {
    pub listing_id: String,
    pub title: String,
    pub status: ListingSyncStatus,
    pub error: Option<String>,
}

/// Aggregated result of a fleet sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSyncReport {
    /// Listings with a configured feed URL that were considered
    pub total: usize,
    pub synced: usize,
    pub failed: usize,
    pub results: Vec<ListingSyncResult>,
}
