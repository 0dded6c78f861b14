//! Shared fixtures for core integration tests

pub mod feeds;
pub mod repositories;

use chrono::{DateTime, Utc};
use roost_domain::{Listing, Reservation};

/// Build a listing without a feed binding
pub fn listing(id: &str, user_id: &str, title: &str) -> Listing {
    Listing {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        ics_url: None,
        last_ics_sync_at: None,
    }
}

/// Build a listing with a configured feed URL
pub fn listing_with_feed(id: &str, user_id: &str, title: &str, url: &str) -> Listing {
    Listing { ics_url: Some(url.to_string()), ..listing(id, user_id, title) }
}

/// Build a reservation row; `total_price` zero marks an imported record
pub fn reservation(
    id: &str,
    listing_id: &str,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    total_price: i64,
) -> Reservation {
    Reservation {
        id: id.to_string(),
        listing_id: listing_id.to_string(),
        user_id: user_id.to_string(),
        start_date: start,
        end_date: end,
        total_price,
        created_at: Utc::now(),
    }
}
