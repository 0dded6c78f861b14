//! Feed normalizer: raw calendar text to busy intervals.
//!
//! Only VEVENT components carrying a parseable start and end survive;
//! everything else (todos, alarms, free/busy blocks, garbage timestamps,
//! stale history) is filtered out. Individual bad events never abort the
//! run; they are logged and counted so callers can surface the skip count.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use roost_domain::constants::STALE_EVENT_CUTOFF_DAYS;
use roost_domain::{BusyInterval, NormalizedFeed, Result, RoostError};
use tracing::debug;

/// Parse raw feed text into the busy intervals relevant for reconciliation.
///
/// `now` anchors the staleness cutoff: events ending more than
/// [`STALE_EVENT_CUTOFF_DAYS`] before it are dropped. Production callers
/// pass `Utc::now()`.
///
/// # Errors
/// Returns `SyncFailed` when the document itself cannot be parsed as a
/// calendar. Malformed individual events are skipped, not errors.
pub fn normalize_feed(raw: &str, now: DateTime<Utc>) -> Result<NormalizedFeed> {
    let unfolded = unfold(raw);
    let calendar = read_calendar(&unfolded).map_err(|err| {
        RoostError::SyncFailed(format!("calendar document could not be parsed: {err}"))
    })?;

    let cutoff = now - Duration::days(STALE_EVENT_CUTOFF_DAYS);
    let mut intervals = Vec::new();
    let mut skipped = 0;

    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }

        let Some((start, end)) = event_interval(component) else {
            skipped += 1;
            debug!("skipping event with missing or unparseable timestamps");
            continue;
        };

        if end < cutoff {
            skipped += 1;
            debug!(end = %end, "skipping stale event");
            continue;
        }

        intervals.push(BusyInterval { start, end });
    }

    Ok(NormalizedFeed { intervals, skipped })
}

/// Extract the (start, end) instants of an event component, if both are
/// present and convertible to UTC.
fn event_interval(component: &Component<'_>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start_prop = component.find_prop("DTSTART")?;
    let end_prop = component.find_prop("DTEND")?;

    let start = to_utc_instant(DatePerhapsTime::try_from(start_prop).ok()?)?;
    let end = to_utc_instant(DatePerhapsTime::try_from(end_prop).ok()?)?;

    Some((start, end))
}

/// Convert a calendar date-or-datetime to an absolute instant.
///
/// Date-only values resolve to midnight UTC and floating times are taken
/// as UTC; `TZID` values resolve through the tz database and unknown or
/// ambiguous local times are rejected.
fn to_utc_instant(value: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::Date(date) => Some(date.and_hms_opt(0, 0, 0)?.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(instant)) => Some(instant),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Some(naive.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz: Tz = tzid.parse().ok()?;
            tz.from_local_datetime(&date_time).single().map(|dt| dt.with_timezone(&Utc))
        }
    }
}
