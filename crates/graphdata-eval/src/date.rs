//! `Date` values.
//!
//! A date is a JavaScript time value: milliseconds since the Unix epoch, or
//! `NaN` for an invalid date. All field arithmetic is done in UTC so the
//! output never depends on the host time zone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Largest magnitude of a valid time value (±100,000,000 days).
const MAX_TIME: f64 = 8.64e15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateValue(f64);

impl DateValue {
    pub fn invalid() -> Self {
        Self(f64::NAN)
    }

    /// A date from epoch milliseconds, clipped to the valid range.
    pub fn from_time(ms: f64) -> Self {
        Self(time_clip(ms))
    }

    /// A date from calendar fields, as `new Date(y, m, d, h, mi, s, ms)`
    /// does: out-of-range fields carry into the next larger one, fractional
    /// fields are truncated, and years `0..=99` mean `1900..=1999`.
    pub fn from_fields(fields: &[f64]) -> Self {
        Self(time_clip(utc_time(fields)))
    }

    /// Parse a date string. Unrecognised text gives an invalid date.
    pub fn parse(text: &str) -> Self {
        parse_time(text.trim()).map_or_else(Self::invalid, Self::from_time)
    }

    /// Epoch milliseconds, `NaN` when invalid.
    pub fn time(self) -> f64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        !self.0.is_nan()
    }

    fn to_chrono(self) -> Option<DateTime<Utc>> {
        if !self.is_valid() {
            return None;
        }
        DateTime::from_timestamp_millis(self.0 as i64)
    }

    /// `Date.prototype.toISOString()`: `YYYY-MM-DDTHH:mm:ss.sssZ`, with a
    /// signed six-digit year outside `0..=9999`. `None` when invalid.
    pub fn to_iso_string(self) -> Option<String> {
        let dt = self.to_chrono()?;
        let year = dt.year();
        let year = if (0..=9999).contains(&year) {
            format!("{year:04}")
        } else {
            format!("{year:+07}")
        };
        Some(format!(
            "{year}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.timestamp_subsec_millis()
        ))
    }

    /// `Date.prototype.toString()` for a UTC host.
    pub fn to_date_string(self) -> String {
        match self.to_chrono() {
            Some(dt) => dt
                .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
                .to_string(),
            None => "Invalid Date".to_string(),
        }
    }
}

/// `Date.UTC(y, m, d, h, mi, s, ms)`: the time value for calendar fields.
pub fn utc(fields: &[f64]) -> f64 {
    time_clip(utc_time(fields))
}

fn utc_time(fields: &[f64]) -> f64 {
    let field = |i: usize, default: f64| fields.get(i).copied().unwrap_or(default);
    let mut year = field(0, f64::NAN);
    if year.is_finite() {
        let truncated = year.trunc();
        if (0.0..=99.0).contains(&truncated) {
            year = 1900.0 + truncated;
        }
    }
    let day = make_day(year, field(1, 0.0), field(2, 1.0));
    let time = make_time(field(3, 0.0), field(4, 0.0), field(5, 0.0), field(6, 0.0));
    day * MS_PER_DAY + time
}

/// Day number of `date` within `month` of `year`, carrying overflow.
fn make_day(year: f64, month: f64, date: f64) -> f64 {
    if !(year.is_finite() && month.is_finite() && date.is_finite()) {
        return f64::NAN;
    }
    let year = year.trunc() + (month.trunc() / 12.0).floor();
    let month = month.trunc().rem_euclid(12.0);
    // Well outside the valid time range; chrono cannot represent it either.
    if year.abs() > 400_000.0 {
        return f64::NAN;
    }
    let first = NaiveDate::from_ymd_opt(year as i32, month as u32 + 1, 1);
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1);
    match (first, epoch) {
        (Some(first), Some(epoch)) => {
            (first - epoch).num_days() as f64 + date.trunc() - 1.0
        }
        _ => f64::NAN,
    }
}

fn make_time(hour: f64, min: f64, sec: f64, ms: f64) -> f64 {
    if !(hour.is_finite() && min.is_finite() && sec.is_finite() && ms.is_finite()) {
        return f64::NAN;
    }
    hour.trunc() * 3_600_000.0 + min.trunc() * 60_000.0 + sec.trunc() * 1000.0 + ms.trunc()
}

fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > MAX_TIME {
        return f64::NAN;
    }
    // `+ 0.0` turns -0 into +0.
    time.trunc() + 0.0
}

/// Epoch milliseconds for the date formats scripts commonly use. Strings
/// without an offset are read as UTC.
fn parse_time(text: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis() as f64);
    }
    const DATE_TIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    let text = text.strip_suffix('Z').unwrap_or(text);
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(fields: &[f64]) -> Option<String> {
        DateValue::from_fields(fields).to_iso_string()
    }

    #[test]
    fn test_from_fields_month_is_zero_based() {
        assert_eq!(iso(&[2004.0, 7.0, 1.0]).as_deref(), Some("2004-08-01T00:00:00.000Z"));
        assert_eq!(iso(&[2020.0, 0.0]).as_deref(), Some("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_from_fields_carries_overflow() {
        assert_eq!(iso(&[2020.0, 12.0, 1.0]).as_deref(), Some("2021-01-01T00:00:00.000Z"));
        assert_eq!(iso(&[2020.0, 2.0, 0.0]).as_deref(), Some("2020-02-29T00:00:00.000Z"));
        assert_eq!(iso(&[2020.0, -1.0, 1.0]).as_deref(), Some("2019-12-01T00:00:00.000Z"));
        assert_eq!(
            iso(&[2020.0, 0.0, 1.0, 25.0, 61.0, 61.0, 1001.0]).as_deref(),
            Some("2020-01-02T02:02:02.001Z")
        );
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(iso(&[99.0, 0.0]).as_deref(), Some("1999-01-01T00:00:00.000Z"));
        assert_eq!(iso(&[0.0, 0.0]).as_deref(), Some("1900-01-01T00:00:00.000Z"));
        assert_eq!(iso(&[100.0, 0.0]).as_deref(), Some("0100-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_fractional_fields_truncate() {
        assert_eq!(iso(&[2004.9, 7.9, 1.9]).as_deref(), Some("2004-08-01T00:00:00.000Z"));
    }

    #[test]
    fn test_non_finite_fields_are_invalid() {
        assert!(!DateValue::from_fields(&[f64::NAN, 0.0]).is_valid());
        assert!(!DateValue::from_fields(&[2004.0, f64::INFINITY]).is_valid());
        assert_eq!(DateValue::from_fields(&[1e9, 0.0]).to_iso_string(), None);
    }

    #[test]
    fn test_time_clip() {
        assert_eq!(DateValue::from_time(8.64e15).time(), 8.64e15);
        assert!(!DateValue::from_time(8.64e15 + 1.0).is_valid());
        assert_eq!(DateValue::from_time(1.9).time(), 1.0);
        assert!(DateValue::from_time(-0.0).time().is_sign_positive());
    }

    #[test]
    fn test_iso_extended_years() {
        assert_eq!(
            DateValue::from_fields(&[10000.0, 0.0]).to_iso_string().as_deref(),
            Some("+010000-01-01T00:00:00.000Z")
        );
        assert_eq!(
            DateValue::from_fields(&[-1.0, 0.0]).to_iso_string().as_deref(),
            Some("-000001-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_epoch_and_millis() {
        assert_eq!(
            DateValue::from_time(0.0).to_iso_string().as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            DateValue::from_time(1_091_318_400_123.0).to_iso_string().as_deref(),
            Some("2004-08-01T00:00:00.123Z")
        );
        assert_eq!(
            DateValue::from_time(-1.0).to_iso_string().as_deref(),
            Some("1969-12-31T23:59:59.999Z")
        );
    }

    #[test]
    fn test_utc() {
        assert_eq!(utc(&[2004.0, 7.0, 1.0]), 1_091_318_400_000.0);
        assert_eq!(utc(&[1970.0]), 0.0);
        assert!(utc(&[]).is_nan());
    }

    #[test]
    fn test_parse_formats() {
        let expected = Some("2004-08-01T00:00:00.000Z");
        assert_eq!(DateValue::parse("2004-08-01").to_iso_string().as_deref(), expected);
        assert_eq!(DateValue::parse("2004/08/01").to_iso_string().as_deref(), expected);
        assert_eq!(
            DateValue::parse("2004-08-01T00:00:00Z").to_iso_string().as_deref(),
            expected
        );
        assert_eq!(
            DateValue::parse("2004-08-01T02:00:00+02:00").to_iso_string().as_deref(),
            expected
        );
        assert_eq!(
            DateValue::parse("2004-08-01T10:30:00.5").to_iso_string().as_deref(),
            Some("2004-08-01T10:30:00.500Z")
        );
        assert_eq!(
            DateValue::parse("Sun, 01 Aug 2004 00:00:00 +0000").to_iso_string().as_deref(),
            expected
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(!DateValue::parse("not a date").is_valid());
        assert!(!DateValue::parse("").is_valid());
        assert!(!DateValue::parse("2004-13-01").is_valid());
    }

    #[test]
    fn test_to_date_string() {
        assert_eq!(
            DateValue::from_fields(&[2004.0, 7.0, 1.0]).to_date_string(),
            "Sun Aug 01 2004 00:00:00 GMT+0000 (Coordinated Universal Time)"
        );
        assert_eq!(DateValue::invalid().to_date_string(), "Invalid Date");
    }
}
