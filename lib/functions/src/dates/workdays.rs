use super::arg_date;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use formula_resolver_model::{DateTimeValue, Scalar};

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `WORKDAY(start, count)`: the date `count` working days after `start`
/// (before, for negative counts). Saturday and Sunday are non-working.
pub fn workday(args: &[Scalar]) -> Scalar {
    let Some(start) = arg_date(args, 0) else {
        return Scalar::Empty;
    };
    let count = args
        .get(1)
        .and_then(Scalar::to_number)
        .unwrap_or(0.0)
        .trunc() as i64;

    let step = if count < 0 { -1 } else { 1 };
    let mut remaining = count.abs();
    let mut date = start.date;
    while remaining > 0 {
        date = date + Duration::days(step);
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    Scalar::Date(DateTimeValue::new(date))
}

/// `WORKDAYS(end, start)`: the number of working days from `start` to `end`,
/// inclusive on both sides, negative when `end` precedes `start`.
pub fn workdays(args: &[Scalar]) -> Scalar {
    let (Some(end), Some(start)) = (arg_date(args, 0), arg_date(args, 1)) else {
        return Scalar::Empty;
    };
    let (from, to, sign) = if start.date <= end.date {
        (start.date, end.date, 1.0)
    } else {
        (end.date, start.date, -1.0)
    };
    let mut count = 0;
    let mut date = from;
    while date <= to {
        if !is_weekend(date) {
            count += 1;
        }
        date = date + Duration::days(1);
    }
    Scalar::Number(sign * f64::from(count))
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

    fn ymd(y: i32, m: u32, day: u32) -> Scalar {
        Scalar::Date(DateTimeValue::new(NaiveDate::from_ymd_opt(y, m, day).unwrap()))
    }

    #[test]
    fn workday_skips_weekends() {
        // 2024-03-08 is a Friday; one working day later is Monday the 11th.
        assert_eq!(workday(&[d("2024-03-08"), n(1.0)]), ymd(2024, 3, 11));
        assert_eq!(workday(&[d("2024-03-08"), n(3.0)]), ymd(2024, 3, 13));
        assert_eq!(workday(&[d("2024-03-11"), n(-1.0)]), ymd(2024, 3, 8));
        assert_eq!(workday(&[d("2024-03-08"), n(0.0)]), ymd(2024, 3, 8));
    }

    #[test]
    fn workdays_counts_inclusive_and_signed() {
        // 2024-03-04 .. 2024-03-08 is a full working week.
        assert_eq!(workdays(&[d("2024-03-08"), d("2024-03-04")]), n(5.0));
        // Spanning a weekend adds nothing for Saturday and Sunday.
        assert_eq!(workdays(&[d("2024-03-11"), d("2024-03-08")]), n(2.0));
        assert_eq!(workdays(&[d("2024-03-04"), d("2024-03-08")]), n(-5.0));
    }
}
