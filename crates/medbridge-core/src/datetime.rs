use crate::error::{CoreError, Result};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Microseconds since the Unix epoch, truncated to whole seconds.
///
/// FHIR `period.start` is exchanged with second precision, so sub-second
/// components never reach the wire.
pub fn to_unix_micros(datetime: OffsetDateTime) -> i64 {
    datetime.unix_timestamp() * 1_000_000
}

/// Inverse of [`to_unix_micros`]. Out-of-range values yield `None`.
pub fn from_unix_micros(micros: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).ok()
}

/// `YYYYMMDDHHMMSS` in UTC, as used for MSH-7 and ACK control IDs.
pub fn hl7_timestamp(datetime: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day][hour][minute][second]");
    datetime
        .to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_default()
}

/// Parse the leading `YYYYMMDD` of an HL7 TS value.
pub fn parse_hl7_date(value: &str) -> Result<Date> {
    let digits = value.get(..8).unwrap_or_default();
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::invalid_date(value));
    }
    let format = format_description!("[year][month][day]");
    Date::parse(digits, &format).map_err(|_| CoreError::invalid_date(value))
}

/// Convert `YYYYMMDD` into ISO `YYYY-MM-DD`.
pub fn hl7_date_to_iso(value: &str) -> Result<String> {
    let date = parse_hl7_date(value)?;
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .map_err(|_| CoreError::invalid_date(value))
}

pub fn format_rfc3339(datetime: OffsetDateTime) -> String {
    datetime
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn micros_truncate_to_seconds() {
        let dt = datetime!(2024-03-01 10:15:30.250 UTC);
        let micros = to_unix_micros(dt);
        assert_eq!(micros % 1_000_000, 0);
        assert_eq!(
            from_unix_micros(micros),
            Some(datetime!(2024-03-01 10:15:30 UTC))
        );
    }

    #[test]
    fn hl7_timestamp_format() {
        let dt = datetime!(2024-03-01 10:15:30 UTC);
        assert_eq!(hl7_timestamp(dt), "20240301101530");
    }

    #[test]
    fn hl7_dates() {
        assert_eq!(hl7_date_to_iso("19900101").unwrap(), "1990-01-01");
        assert_eq!(hl7_date_to_iso("199001011230").unwrap(), "1990-01-01");
        assert!(parse_hl7_date("1990").is_err());
        assert!(parse_hl7_date("19901301").is_err());
        assert!(parse_hl7_date("abcdefgh").is_err());
    }

    #[test]
    fn rfc3339_format() {
        let dt = datetime!(2024-03-01 10:15:30 UTC);
        assert_eq!(format_rfc3339(dt), "2024-03-01T10:15:30Z");
    }
}
