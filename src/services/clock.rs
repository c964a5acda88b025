use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("unrecognized timezone: {0}")]
    InvalidTimezone(String),

    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),
}

pub fn resolve_timezone(name: &str) -> Result<Tz, ClockError> {
    name.parse::<Tz>()
        .map_err(|_| ClockError::InvalidTimezone(name.to_string()))
}

/// Parses an ISO calendar date (`YYYY-MM-DD`) as used at the tool boundary.
pub fn parse_day(s: &str) -> Result<NaiveDate, ClockError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ClockError::InvalidDateTime(format!("bad date: {s}")))
}

/// Parses a 24-hour local time (`HH:mm`).
pub fn parse_time(s: &str) -> Result<NaiveTime, ClockError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| ClockError::InvalidDateTime(format!("bad time: {s}")))
}

/// Converts a business-local date + time into an absolute instant.
///
/// Local times skipped by a spring-forward transition are rejected;
/// ambiguous fall-back times resolve to the earlier offset.
pub fn to_instant(day: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, ClockError> {
    match tz.from_local_datetime(&day.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ClockError::InvalidDateTime(format!(
            "{day} {time} does not exist in {tz}"
        ))),
    }
}

pub fn add_minutes(instant: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    instant + Duration::minutes(minutes)
}
