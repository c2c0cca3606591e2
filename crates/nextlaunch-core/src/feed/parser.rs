//! iCalendar document to flat timeline.
//!
//! Only the properties the selectors read are extracted: `DTSTART`,
//! `SUMMARY`, `LOCATION` and `URL`. Recurrence rules are not expanded;
//! a recurring event contributes its first occurrence only. Events
//! without a `DTSTART` are skipped.

use std::io::BufReader;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use ical::IcalParser;
use tracing::{debug, warn};

use super::FeedError;
use crate::models::LaunchEvent;

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// Parse an iCalendar document into its events, ordered by begin instant.
pub fn parse_timeline(text: &str) -> Result<Vec<LaunchEvent>, FeedError> {
    let mut calendars = IcalParser::new(BufReader::new(text.as_bytes()));

    let calendar = match calendars.next() {
        Some(calendar) => calendar?,
        None => return Err(FeedError::Empty),
    };

    if calendars.next().is_some() {
        return Err(FeedError::Unsupported(
            "multiple calendars in one document".to_string(),
        ));
    }

    let mut events = calendar
        .events
        .iter()
        .map(parse_event)
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: events sharing a start keep document order
    events.sort_by_key(|e| e.begin);
    Ok(events)
}

/// `Ok(None)` for an event with no start date.
fn parse_event(event: &IcalEvent) -> Result<Option<LaunchEvent>, FeedError> {
    let name = property(event, "SUMMARY")
        .and_then(|p| p.value.as_deref())
        .map(unescape_text)
        .unwrap_or_default();

    let Some(dtstart) = property(event, "DTSTART") else {
        debug!(event = %name, "Skipping event without DTSTART");
        return Ok(None);
    };
    let begin = parse_dtstart(dtstart)
        .map_err(|reason| FeedError::InvalidEvent(format!("'{}': {}", name, reason)))?;

    if property(event, "RRULE").is_some() {
        debug!(event = %name, "Recurring event, using first occurrence only");
    }

    Ok(Some(LaunchEvent {
        name,
        begin,
        location: text_value(event, "LOCATION"),
        url: text_value(event, "URL"),
    }))
}

fn property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    event
        .properties
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params.as_ref()?.iter().find_map(|(key, values)| {
        if key.eq_ignore_ascii_case(name) {
            values.first().map(String::as_str)
        } else {
            None
        }
    })
}

fn text_value(event: &IcalEvent, name: &str) -> Option<String> {
    property(event, name)
        .and_then(|p| p.value.as_deref())
        .map(unescape_text)
        .filter(|v| !v.is_empty())
}

/// Resolve a `DTSTART` to a UTC instant.
///
/// `TZID`-qualified times are resolved in that zone; unknown zones and
/// floating times are taken as UTC. All-day dates start at midnight UTC.
fn parse_dtstart(prop: &Property) -> Result<DateTime<Utc>, String> {
    let raw = prop
        .value
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| "empty DTSTART".to_string())?;

    let is_date = param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (raw.len() == 8 && !raw.contains('T'));

    if is_date {
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| format!("bad date '{}': {}", raw, e))?;
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| format!("bad date '{}'", raw));
    }

    let is_utc = raw.ends_with('Z');
    let naive = NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), DATE_TIME_FORMAT)
        .map_err(|e| format!("bad date-time '{}': {}", raw, e))?;

    match param(prop, "TZID") {
        Some(tzid) if !is_utc => Ok(resolve_local(naive, tzid)),
        _ => Ok(naive.and_utc()),
    }
}

/// Local wall-clock time in zone `tzid` to UTC. A time skipped by a DST
/// jump is taken as UTC; an ambiguous one resolves to the earlier instant.
fn resolve_local(naive: NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let name = tzid.trim_matches('"').trim_start_matches('/');
    let tz: Tz = match name.parse() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(tzid, "Unknown time zone, interpreting DTSTART as UTC");
            return naive.and_utc();
        }
    };

    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            warn!(tzid, local = %naive, "Nonexistent local time, interpreting DTSTART as UTC");
            naive.and_utc()
        }
    }
}

/// Undo RFC 5545 TEXT escaping (`\\`, `\;`, `\,`, `\n`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
