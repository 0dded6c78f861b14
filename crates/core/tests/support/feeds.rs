//! ICS document builders for tests

use chrono::{DateTime, Utc};

/// Format an instant in the basic UTC form used by DTSTART/DTEND
pub fn ics_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Wrap raw component text in a VCALENDAR envelope
pub fn calendar_raw(body: &str) -> String {
    format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Roost//Test//EN\r\n{body}END:VCALENDAR\r\n")
}

/// A single VEVENT block with UTC start and end
pub fn event_utc(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "BEGIN:VEVENT\r\nUID:{}-{}@test\r\nDTSTART:{}\r\nDTEND:{}\r\nEND:VEVENT\r\n",
        start.timestamp(),
        end.timestamp(),
        ics_utc(start),
        ics_utc(end),
    )
}

/// A calendar document containing the given busy periods
pub fn calendar(events: &[(DateTime<Utc>, DateTime<Utc>)]) -> String {
    let body: String = events.iter().map(|(start, end)| event_utc(*start, *end)).collect();
    calendar_raw(&body)
}

/// A calendar document with no events at all
pub fn empty_calendar() -> String {
    calendar_raw("")
}
