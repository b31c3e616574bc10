//! Whole-day date ranges in the business time zone.
//!
//! Requests carry plain `yyyy-mm-dd` dates. They are read as local days in an
//! IANA time zone, daylight saving included, and turned into UTC instants
//! covering the whole day.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use common::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Bounds of a date filter. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    From(DateTime<Utc>),
    Until(DateTime<Utc>),
    Between(DateTime<Utc>, DateTime<Utc>),
}

/// Time zone from its IANA name, e.g. `America/Santiago`.
pub fn time_zone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::internal(format!("unknown time zone: {}", name)))
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::validation(format!("`{}` is not a date in yyyy-mm-dd format", value))
    })
}

/// First instant of `date` in `tz`.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> AppResult<DateTime<Utc>> {
    local(date.and_time(NaiveTime::MIN), tz)
}

/// Last millisecond of `date` in `tz`.
pub fn end_of_day(date: NaiveDate, tz: Tz) -> AppResult<DateTime<Utc>> {
    let next = date
        .succ_opt()
        .ok_or_else(|| AppError::validation("date is out of range"))?;
    Ok(local(next.and_time(NaiveTime::MIN), tz)? - Duration::milliseconds(1))
}

/// Build the range for an optional `start`/`end` pair.
///
/// Returns `None` when neither side is given. `end` before `start` is rejected.
pub fn day_range(start: Option<&str>, end: Option<&str>, tz: Tz) -> AppResult<Option<DateRange>> {
    let start = start.filter(|s| !s.trim().is_empty()).map(parse_date).transpose()?;
    let end = end.filter(|s| !s.trim().is_empty()).map(parse_date).transpose()?;

    Ok(match (start, end) {
        (None, None) => None,
        (Some(s), None) => Some(DateRange::From(start_of_day(s, tz)?)),
        (None, Some(e)) => Some(DateRange::Until(end_of_day(e, tz)?)),
        (Some(s), Some(e)) => {
            if e < s {
                return Err(AppError::validation(
                    "end_date must be on or after start_date",
                ));
            }
            Some(DateRange::Between(start_of_day(s, tz)?, end_of_day(e, tz)?))
        }
    })
}

/// UTC instant of a local wall-clock time.
///
/// A time repeated by a backward shift resolves to its first occurrence. A
/// time skipped by a forward shift resolves to the end of the (one hour) gap.
fn local(naive: NaiveDateTime, tz: Tz) -> AppResult<DateTime<Utc>> {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
        other => other.earliest(),
    };
    resolved
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::validation("date is out of range"))
}
