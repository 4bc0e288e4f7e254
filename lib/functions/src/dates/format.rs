use super::arg_date;
use chrono::{Datelike, NaiveTime, Timelike};
use formula_resolver_model::Scalar;
use std::fmt::Write;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The pattern tokens, longest first so that `MMMM` wins over `MM` and `M`.
const TOKENS: [&str; 21] = [
    "YYYY", "MMMM", "dddd", "MMM", "ddd", "YY", "MM", "Do", "DD", "HH", "hh", "mm", "ss", "M",
    "D", "H", "h", "m", "s", "A", "a",
];

/// `FORMAT_DATE(date, [pattern])` with a moment-style pattern language,
/// defaulting to `YYYY-MM-DD`. Characters outside the token set pass through
/// untouched.
pub fn format_date(args: &[Scalar]) -> Scalar {
    let Some(d) = arg_date(args, 0) else {
        return Scalar::Empty;
    };
    let pattern = match args.get(1) {
        Some(Scalar::Text(p)) if !p.is_empty() => p.clone(),
        _ => "YYYY-MM-DD".to_owned(),
    };

    let date = d.date;
    let time = d.time.unwrap_or_default();
    let mut out = String::new();
    let mut rest = pattern.as_str();

    'outer: while !rest.is_empty() {
        for token in TOKENS {
            if rest.starts_with(token) {
                render_token(&mut out, token, date, time);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }
        let ch = rest.chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    Scalar::Text(out)
}

fn render_token(out: &mut String, token: &str, date: chrono::NaiveDate, time: NaiveTime) {
    let month0 = date.month0() as usize;
    let weekday0 = date.weekday().num_days_from_monday() as usize;
    let hour = time.hour();
    let hour12 = (hour + 11) % 12 + 1;
    let _ = match token {
        "YYYY" => write!(out, "{:04}", date.year()),
        "YY" => write!(out, "{:02}", date.year().rem_euclid(100)),
        "MMMM" => write!(out, "{}", MONTHS[month0]),
        "MMM" => write!(out, "{}", &MONTHS[month0][..3]),
        "MM" => write!(out, "{:02}", date.month()),
        "M" => write!(out, "{}", date.month()),
        "dddd" => write!(out, "{}", WEEKDAYS[weekday0]),
        "ddd" => write!(out, "{}", &WEEKDAYS[weekday0][..3]),
        "Do" => write!(out, "{}{}", date.day(), ordinal_suffix(date.day())),
        "DD" => write!(out, "{:02}", date.day()),
        "D" => write!(out, "{}", date.day()),
        "HH" => write!(out, "{hour:02}"),
        "H" => write!(out, "{hour}"),
        "hh" => write!(out, "{hour12:02}"),
        "h" => write!(out, "{hour12}"),
        "mm" => write!(out, "{:02}", time.minute()),
        "m" => write!(out, "{}", time.minute()),
        "ss" => write!(out, "{:02}", time.second()),
        "s" => write!(out, "{}", time.second()),
        "A" => write!(out, "{}", if hour < 12 { "AM" } else { "PM" }),
        "a" => write!(out, "{}", if hour < 12 { "am" } else { "pm" }),
        _ => Ok(()),
    };
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
