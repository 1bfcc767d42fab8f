//! Display defaults for event records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::api::EventRecord;

pub const DATE_TBD: &str = "Date TBD";
pub const INVALID_DATE: &str = "Invalid Date";
pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const LOCATION_TBD: &str = "Location TBD";
pub const NO_DESCRIPTION: &str = "No description provided.";

const LONG_DATE: &str = "%B %-d, %Y";

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Format a backend date as a long US date such as `July 1, 2024`.
///
/// Never fails: missing input yields [`DATE_TBD`] and anything unparseable
/// yields [`INVALID_DATE`]. Timestamps with an offset keep the calendar date
/// of that offset.
pub fn format_event_date(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return DATE_TBD.to_string();
    };

    parse_date(value).map_or_else(
        || INVALID_DATE.to_string(),
        |date| date.format(LONG_DATE).to_string(),
    )
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// What a single event looks like on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
}

impl From<&EventRecord> for EventCard {
    fn from(event: &EventRecord) -> Self {
        Self {
            title: or_default(event.name.as_deref(), UNTITLED_EVENT),
            date: format_event_date(event.date_time.as_deref()),
            location: or_default(event.location.as_deref(), LOCATION_TBD),
            description: or_default(event.description.as_deref(), NO_DESCRIPTION),
        }
    }
}
