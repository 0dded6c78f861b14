//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Feed ingestion
pub const FEED_FETCH_TIMEOUT_SECS: u64 = 30;
pub const FEED_USER_AGENT: &str = "roost-calendar-sync/1.0";

// Events whose end instant is older than this are dropped during
// normalization; bounds the sync window so historical noise never enters
// the reconciliation diff.
pub const STALE_EVENT_CUTOFF_DAYS: i64 = 30;

// Fleet sync scheduling (sec min hour dom month dow)
pub const DEFAULT_SYNC_CRON: &str = "0 0 * * * *";
