//! Slot times and the durations derived from them. Slots are interpreted in UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Canonical `HH:MM` for an `H:MM` or `HH:MM` input, hours 0-23
pub fn normalize_time(raw: &str) -> Option<String> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(format!("{hours:02}:{minutes:02}"))
}

/// Instant a slot starts
pub fn scheduled_at(date: NaiveDate, time: &str) -> Option<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(&normalize_time(time)?, "%H:%M").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Whole minutes from `from` to `to`, rounded half up
fn rounded_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds();
    (millis + MILLIS_PER_MINUTE / 2).div_euclid(MILLIS_PER_MINUTE)
}

/// Minutes the patient waited past the scheduled slot; early starts count as 0
pub fn wait_time_minutes(scheduled: DateTime<Utc>, actual_start: DateTime<Utc>) -> i64 {
    rounded_minutes(scheduled, actual_start).max(0)
}

pub fn actual_duration_minutes(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<i64> {
    match (start, end) {
        (Some(start), Some(end)) => Some(rounded_minutes(start, end)),
        _ => None,
    }
}

/// e.g. `Mon Jun 03 2024 at 09:30`
pub fn formatted_date_time(date: NaiveDate, time: &str) -> String {
    format!("{} at {time}", date.format("%a %b %d %Y"))
}
