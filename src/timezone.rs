//! Conversion of canonical timezone names into local dates.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current UTC offset of `canonical_timezone`, or `None` if the timezone is unknown.
fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in the timezone `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns an [Error::InvalidTimezoneError] if `canonical_timezone` is not a known timezone.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset).date())
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}
