//! Date and time builtins over civil dates. Text arguments are accepted
//! wherever a date is expected as long as they parse as ISO-8601; time-of-day
//! arguments additionally accept plain `HH:MM[:SS]` strings.

mod format;
mod workdays;

pub use format::format_date;
pub use workdays::{workday, workdays};

use crate::FunctionContext;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};
use formula_resolver_model::{DateTimeValue, Scalar};

pub(crate) fn arg_date(args: &[Scalar], index: usize) -> Option<DateTimeValue> {
    args.get(index).and_then(Scalar::to_date)
}

/// A time-of-day argument: the time component of a date scalar, or text in
/// `HH:MM[:SS]` form.
pub(crate) fn arg_time(args: &[Scalar], index: usize) -> Option<NaiveTime> {
    match args.get(index)? {
        Scalar::Date(d) => d.time,
        Scalar::Text(s) => parse_time(s),
        _ => None,
    }
}

fn parse_time(input: &str) -> Option<NaiveTime> {
    let s = input.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
        .or_else(|| DateTimeValue::parse_iso(s).and_then(|d| d.time))
}

/// `TODAY()`.
pub fn today(ctx: &FunctionContext) -> Scalar {
    Scalar::Date(DateTimeValue::new(ctx.today))
}

/// `NOW()`.
pub fn now(ctx: &FunctionContext) -> Scalar {
    Scalar::Date(DateTimeValue::from(ctx.now))
}

/// `DATE(year, month, day)`; empty for an impossible date.
pub fn date(args: &[Scalar]) -> Scalar {
    let year = args.first().and_then(Scalar::to_number).unwrap_or(0.0) as i32;
    let month = args.get(1).and_then(Scalar::to_number).unwrap_or(0.0) as u32;
    let day = args.get(2).and_then(Scalar::to_number).unwrap_or(0.0) as u32;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => Scalar::Date(DateTimeValue::new(d)),
        None => Scalar::Empty,
    }
}

/// `DAYS(end, start)`: whole days from `start` to `end`, ignoring times.
pub fn days(args: &[Scalar]) -> Scalar {
    let (Some(end), Some(start)) = (arg_date(args, 0), arg_date(args, 1)) else {
        return Scalar::Empty;
    };
    Scalar::Number((end.date - start.date).num_days() as f64)
}

/// `YEAR(date)`.
pub fn year(args: &[Scalar]) -> Scalar {
    arg_date(args, 0).map_or(Scalar::Empty, |d| Scalar::Number(f64::from(d.date.year())))
}

/// `MONTH(date)`.
pub fn month(args: &[Scalar]) -> Scalar {
    arg_date(args, 0).map_or(Scalar::Empty, |d| Scalar::Number(f64::from(d.date.month())))
}

/// `DAY(date)`.
pub fn day(args: &[Scalar]) -> Scalar {
    arg_date(args, 0).map_or(Scalar::Empty, |d| Scalar::Number(f64::from(d.date.day())))
}

/// `HOUR(time)`.
pub fn hour(args: &[Scalar]) -> Scalar {
    arg_time(args, 0).map_or(Scalar::Empty, |t| Scalar::Number(f64::from(t.hour())))
}

/// `MINUTE(time)`.
pub fn minute(args: &[Scalar]) -> Scalar {
    arg_time(args, 0).map_or(Scalar::Empty, |t| Scalar::Number(f64::from(t.minute())))
}

/// `SECOND(time)`.
pub fn second(args: &[Scalar]) -> Scalar {
    arg_time(args, 0).map_or(Scalar::Empty, |t| Scalar::Number(f64::from(t.second())))
}

/// `WEEKNUM(date)`: weeks start on Sunday, the week containing January 1 is
/// week 1.
pub fn weeknum(args: &[Scalar]) -> Scalar {
    let Some(d) = arg_date(args, 0) else {
        return Scalar::Empty;
    };
    let Some(jan1) = NaiveDate::from_ymd_opt(d.date.year(), 1, 1) else {
        return Scalar::Empty;
    };
    let offset = jan1.weekday().num_days_from_sunday();
    Scalar::Number(f64::from((d.date.ordinal0() + offset) / 7 + 1))
}

/// `ISOWEEKNUM(date)` per ISO-8601 (the week containing the year's first
/// Thursday is week 1).
pub fn isoweeknum(args: &[Scalar]) -> Scalar {
    arg_date(args, 0).map_or(Scalar::Empty, |d| {
        Scalar::Number(f64::from(d.date.iso_week().week()))
    })
}

/// `ADD_DAYS(date, count)`.
pub fn add_days(args: &[Scalar]) -> Scalar {
    shift_days(args, 1.0)
}

/// `SUBTRACT_DAYS(date, count)`.
pub fn subtract_days(args: &[Scalar]) -> Scalar {
    shift_days(args, -1.0)
}

fn shift_days(args: &[Scalar], sign: f64) -> Scalar {
    let Some(d) = arg_date(args, 0) else {
        return Scalar::Empty;
    };
    let count = args.get(1).and_then(Scalar::to_number).unwrap_or(0.0) * sign;
    let shifted = d.date + Duration::days(count.trunc() as i64);
    Scalar::Date(DateTimeValue {
        date: shifted,
        time: d.time,
    })
}

/// `HOURS_DIFF(a, b)`: the signed difference between two times of day as
/// `H:MM` text.
pub fn hours_diff(args: &[Scalar]) -> Scalar {
    let (Some(a), Some(b)) = (arg_time(args, 0), arg_time(args, 1)) else {
        return Scalar::Empty;
    };
    let minutes = i64::from(a.hour()) * 60 + i64::from(a.minute())
        - (i64::from(b.hour()) * 60 + i64::from(b.minute()));
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    Scalar::Text(format!("{}{}:{:02}", sign, minutes / 60, minutes % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Scalar {
        Scalar::text(s)
    }

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    #[test]
    fn date_builds_or_degrades() {
        assert_eq!(
            date(&[n(2024.0), n(2.0), n(29.0)]),
            Scalar::Date(DateTimeValue::new(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
        assert_eq!(date(&[n(2023.0), n(2.0), n(29.0)]), Scalar::Empty);
    }

    #[test]
    fn days_between_iso_strings() {
        assert_eq!(days(&[d("2024-03-10"), d("2024-03-01")]), n(9.0));
        assert_eq!(days(&[d("2024-03-01"), d("2024-03-10")]), n(-9.0));
        assert_eq!(days(&[d("junk"), d("2024-03-10")]), Scalar::Empty);
    }

    #[test]
    fn components() {
        assert_eq!(year(&[d("2024-03-09")]), n(2024.0));
        assert_eq!(month(&[d("2024-03-09")]), n(3.0));
        assert_eq!(day(&[d("2024-03-09")]), n(9.0));
        assert_eq!(hour(&[d("2024-03-09 14:45")]), n(14.0));
        assert_eq!(minute(&[d("14:45")]), n(45.0));
        assert_eq!(second(&[d("14:45:30")]), n(30.0));
        assert_eq!(hour(&[d("2024-03-09")]), Scalar::Empty);
    }

    #[test]
    fn week_numbers() {
        // 2024-01-01 is a Monday.
        assert_eq!(weeknum(&[d("2024-01-01")]), n(1.0));
        assert_eq!(weeknum(&[d("2024-01-07")]), n(2.0));
        assert_eq!(isoweeknum(&[d("2024-01-01")]), n(1.0));
        // 2023-01-01 is a Sunday; ISO puts it in 2022's last week.
        assert_eq!(isoweeknum(&[d("2023-01-01")]), n(52.0));
    }

    #[test]
    fn day_arithmetic_keeps_time() {
        assert_eq!(
            add_days(&[d("2024-03-09 08:00"), n(3.0)]),
            Scalar::Date(DateTimeValue::with_time(
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap()
            ))
        );
        assert_eq!(
            subtract_days(&[d("2024-03-01"), n(1.0)]),
            Scalar::Date(DateTimeValue::new(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
    }

    #[test]
    fn hours_diff_is_signed() {
        assert_eq!(hours_diff(&[d("23:00"), d("20:30")]), Scalar::text("2:30"));
        assert_eq!(hours_diff(&[d("08:00"), d("09:30")]), Scalar::text("-1:30"));
    }
}
