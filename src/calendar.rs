//! Date ranges and request date parsing.

use time::{
    Date, Duration, OffsetDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::Error;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The last day in the range.
    pub end: Date,
}

impl DateRange {
    /// The calendar month containing `date`, from the first to the last day of the month.
    pub fn month_containing(date: Date) -> Self {
        let start = first_of_month(date);
        // Every month has between 28 and 31 days, so this always lands in the following month.
        let next_month_start = first_of_month(start + Duration::days(31));

        Self {
            start,
            end: next_month_start - Duration::days(1),
        }
    }

    /// The `days` days leading up to and including `end`.
    pub fn days_ending_on(end: Date, days: i64) -> Self {
        Self {
            start: end - Duration::days(days - 1),
            end,
        }
    }
}

fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Parse a date sent by a client.
///
/// Accepts either a plain date, e.g. "2025-03-14", or an RFC 3339 date-time,
/// e.g. "2025-03-14T09:30:00Z", in which case the date part is used.
///
/// # Errors
///
/// Returns an [Error::InvalidDate] if `raw_date` is in neither format.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    let raw_date = raw_date.trim();

    if let Ok(date) = Date::parse(raw_date, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }

    OffsetDateTime::parse(raw_date, &Rfc3339)
        .map(|date_time| date_time.date())
        .map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        calendar::{DateRange, parse_date},
    };

    #[test]
    fn month_containing_mid_month_date() {
        let range = DateRange::month_containing(date!(2025 - 03 - 14));

        assert_eq!(range.start, date!(2025 - 03 - 01));
        assert_eq!(range.end, date!(2025 - 03 - 31));
    }

    #[test]
    fn month_containing_handles_leap_february() {
        let range = DateRange::month_containing(date!(2024 - 02 - 29));

        assert_eq!(range.start, date!(2024 - 02 - 01));
        assert_eq!(range.end, date!(2024 - 02 - 29));
    }

    #[test]
    fn month_containing_handles_december() {
        let range = DateRange::month_containing(date!(2025 - 12 - 01));

        assert_eq!(range.start, date!(2025 - 12 - 01));
        assert_eq!(range.end, date!(2025 - 12 - 31));
    }

    #[test]
    fn days_ending_on_spans_exactly_the_given_days() {
        let range = DateRange::days_ending_on(date!(2025 - 03 - 31), 30);

        assert_eq!(range.start, date!(2025 - 03 - 02));
        assert_eq!(range.end, date!(2025 - 03 - 31));
        assert_eq!((range.end - range.start).whole_days() + 1, 30);
    }

    #[test]
    fn days_ending_on_single_day() {
        let range = DateRange::days_ending_on(date!(2025 - 03 - 31), 1);

        assert_eq!(range.start, date!(2025 - 03 - 31));
        assert_eq!(range.end, date!(2025 - 03 - 31));
    }

    #[test]
    fn parses_plain_date() {
        assert_eq!(parse_date("2025-03-14"), Ok(date!(2025 - 03 - 14)));
    }

    #[test]
    fn parses_rfc3339_date_time() {
        assert_eq!(
            parse_date("2025-03-14T09:30:00.000Z"),
            Ok(date!(2025 - 03 - 14))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_date("last tuesday"),
            Err(Error::InvalidDate("last tuesday".to_owned()))
        );
    }
}
