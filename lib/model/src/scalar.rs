use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// A civil date with an optional time-of-day.
///
/// The platform reports dates without timezone information, so the resolver
/// never attaches one. Formulas that subtract or format dates operate on this
/// type directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTimeValue {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl DateTimeValue {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn with_time(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    /// Parses an ISO-8601 date or date-time string.
    ///
    /// Accepted forms: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`,
    /// `YYYY-MM-DDTHH:MM[:SS]` with an optional trailing `Z`.
    pub fn parse_iso(input: &str) -> Option<Self> {
        let s = input.trim().trim_end_matches('Z');
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Self::new(date));
        }
        for format in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Self::with_time(dt.date(), dt.time()));
            }
        }
        None
    }

    /// The date-time with midnight filling in for a missing time-of-day.
    pub fn as_datetime(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date, self.time.unwrap_or_default())
    }
}

impl From<NaiveDate> for DateTimeValue {
    fn from(date: NaiveDate) -> Self {
        Self::new(date)
    }
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::with_time(dt.date(), dt.time())
    }
}

/// A single cell value as a user would see it.
///
/// Every boundary conversion in the resolver passes through this type: raw
/// column payloads are extracted into it, formulas evaluate over it, and the
/// action layer serialises it with [fmt::Display].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
    Date(DateTimeValue),
    #[default]
    Empty,
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Empty => true,
            Scalar::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion. Booleans count as 1/0, text goes through the lenient
    /// parser, dates and empty values do not coerce.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(f64::from(u8::from(*b))),
            Scalar::Text(s) => parse_number_lenient(s),
            Scalar::Date(_) | Scalar::Empty => None,
        }
    }

    /// Numeric coercion with 0 as the fallback, matching the platform's
    /// treatment of non-numeric inputs in numeric positions.
    pub fn to_number_or_zero(&self) -> f64 {
        self.to_number().unwrap_or(0.0)
    }

    /// Truthiness for logical functions: false, 0, empty and the empty string
    /// are falsy, everything else is truthy.
    pub fn to_bool(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0,
            Scalar::Text(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            Scalar::Date(_) => true,
            Scalar::Empty => false,
        }
    }

    /// Date coercion. Text is accepted when it parses as ISO-8601.
    pub fn to_date(&self) -> Option<DateTimeValue> {
        match self {
            Scalar::Date(d) => Some(*d),
            Scalar::Text(s) => DateTimeValue::parse_iso(s),
            _ => None,
        }
    }

    /// The display string, identical to the [fmt::Display] output.
    pub fn to_display(&self) -> String {
        self.to_string()
    }

    /// The equality rule of the formula language: numeric when both sides
    /// coerce to numbers, display-string comparison otherwise.
    pub fn loose_eq(&self, other: &Scalar) -> bool {
        match (self.to_number(), other.to_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_display() == other.to_display(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", format_number(*n)),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Date(d) => write!(f, "{}", d.date.format("%Y-%m-%d")),
            Scalar::Empty => Ok(()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_owned())
    }
}

impl From<DateTimeValue> for Scalar {
    fn from(value: DateTimeValue) -> Self {
        Scalar::Date(value)
    }
}

/// Integer numbers print in plain decimal form, fractional numbers round to
/// six places with trailing zeros trimmed.
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_owned();
    }
    if n.fract() == 0.0 && n.abs() < 9e15 {
        return format!("{}", n as i64);
    }
    let mut out = format!("{n:.6}");
    while out.ends_with('0') {
        out.pop();
    }
    if out.ends_with('.') {
        out.pop();
    }
    out
}

/// Lenient numeric parsing.
///
/// Trims the input and accepts either a complete `f64` literal or the longest
/// leading numeric prefix (sign, digits, decimal point, exponent), so
/// `"42px"` parses as 42 while `"px42"` does not parse at all.
pub fn parse_number_lenient(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    let prefix = numeric_prefix(s);
    if prefix.is_empty() {
        return None;
    }
    prefix.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut saw_digit = false;
    let mut saw_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => saw_digit = true,
            b'.' if !saw_dot => saw_dot = true,
            b'e' | b'E' if saw_digit => {
                // Only take the exponent when it is complete.
                let mut exp_end = end + 1;
                if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                    exp_end += 1;
                }
                if matches!(bytes.get(exp_end), Some(b'0'..=b'9')) {
                    while matches!(bytes.get(exp_end), Some(b'0'..=b'9')) {
                        exp_end += 1;
                    }
                    end = exp_end;
                }
                break;
            }
            _ => break,
        }
        end += 1;
    }
    if saw_digit {
        &s[..end]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lenient_parse_accepts_prefixes() {
        assert_eq!(parse_number_lenient("42"), Some(42.0));
        assert_eq!(parse_number_lenient("  -3.5  "), Some(-3.5));
        assert_eq!(parse_number_lenient("42px"), Some(42.0));
        assert_eq!(parse_number_lenient("1.5e3"), Some(1500.0));
        assert_eq!(parse_number_lenient("1.5e"), Some(1.5));
        assert_eq!(parse_number_lenient("px42"), None);
        assert_eq!(parse_number_lenient(""), None);
        assert_eq!(parse_number_lenient("-"), None);
    }

    #[test]
    fn number_display() {
        assert_eq!(Scalar::Number(42.0).to_string(), "42");
        assert_eq!(Scalar::Number(-7.0).to_string(), "-7");
        assert_eq!(Scalar::Number(0.5).to_string(), "0.5");
        assert_eq!(Scalar::Number(1.0 / 3.0).to_string(), "0.333333");
    }

    #[test]
    fn date_display_is_date_only() {
        let d = DateTimeValue::with_time(date(2024, 3, 9), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(Scalar::Date(d).to_string(), "2024-03-09");
    }

    #[test]
    fn empty_displays_as_empty_string() {
        assert_eq!(Scalar::Empty.to_string(), "");
    }

    #[test]
    fn parse_iso_forms() {
        assert_eq!(
            DateTimeValue::parse_iso("2024-03-09"),
            Some(DateTimeValue::new(date(2024, 3, 9)))
        );
        assert_eq!(
            DateTimeValue::parse_iso("2024-03-09 08:30"),
            Some(DateTimeValue::with_time(
                date(2024, 3, 9),
                NaiveTime::from_hms_opt(8, 30, 0).unwrap()
            ))
        );
        assert_eq!(
            DateTimeValue::parse_iso("2024-03-09T08:30:15Z"),
            Some(DateTimeValue::with_time(
                date(2024, 3, 9),
                NaiveTime::from_hms_opt(8, 30, 15).unwrap()
            ))
        );
        assert_eq!(DateTimeValue::parse_iso("not a date"), None);
    }

    #[test]
    fn coercions() {
        assert_eq!(Scalar::Bool(true).to_number(), Some(1.0));
        assert_eq!(Scalar::text("12.5").to_number(), Some(12.5));
        assert_eq!(Scalar::Empty.to_number(), None);
        assert!(!Scalar::text("").to_bool());
        assert!(Scalar::Number(-1.0).to_bool());
    }
}
