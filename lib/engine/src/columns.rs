//! Raw column payloads and the per-kind value extractor.
//!
//! The upstream data API returns roughly twenty-five payload shapes. They are
//! modelled as one sum type with a raw-text catch-all for forward
//! compatibility; the extractor maps each shape to the scalar a user would
//! see, with smart defaults for absent values (empty for text-like kinds,
//! 0 for numeric ones).

use crate::client::{ColumnValueRecord, LinkedItemRef};
use formula_resolver_model::{
    parse_number_lenient, ColumnKind, ColumnSettings, MirrorFunction, Scalar,
};
use serde::Deserialize;

/// A raw column payload as returned by the multi-column deep query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawColumnValue {
    Text { text: Option<String> },
    LongText { text: Option<String> },
    Number { number: Option<f64>, text: Option<String> },
    Date { date: Option<String>, time: Option<String> },
    Time { text: Option<String> },
    Timeline { from: Option<String>, to: Option<String> },
    Week { start: Option<String>, end: Option<String> },
    Hour { hour: Option<u32>, minute: Option<u32> },
    Status { label: Option<String> },
    Dropdown { labels: Vec<String> },
    People { names: Vec<String> },
    Checkbox { checked: bool },
    Rating { rating: Option<f64> },
    Vote { votes: Option<f64> },
    Country { name: Option<String> },
    Email { email: Option<String>, text: Option<String> },
    Link { url: Option<String>, text: Option<String> },
    Phone { phone: Option<String> },
    Location { address: Option<String> },
    ItemId { id: Option<u64> },
    CreationLog { created_at: Option<String> },
    LastUpdated { updated_at: Option<String> },
    TimeTracking { duration_seconds: Option<u64> },
    BoardRelation { items: Vec<LinkedItemRef> },
    Dependency { items: Vec<LinkedItemRef> },
    Mirror {
        display_value: Option<String>,
        #[serde(default)]
        linked_names: Vec<String>,
    },
    WorldClock { text: Option<String> },
    /// Catch-all for kinds this build does not know.
    Unknown { text: Option<String> },
}

fn text_or_empty(text: &Option<String>) -> Scalar {
    match text {
        Some(s) if !s.is_empty() => Scalar::text(s.clone()),
        _ => Scalar::Empty,
    }
}

fn joined(parts: &[String]) -> Scalar {
    if parts.is_empty() {
        Scalar::Empty
    } else {
        Scalar::text(parts.join(", "))
    }
}

fn joined_names(items: &[LinkedItemRef]) -> Scalar {
    if items.is_empty() {
        Scalar::Empty
    } else {
        Scalar::text(
            items
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Splits a comma-separated list in which every entry parses as a number.
/// Returns `None` as soon as one entry does not.
pub(crate) fn parse_numeric_list(input: &str) -> Option<Vec<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split(',')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            part.parse::<f64>().ok().filter(|n| n.is_finite())
        })
        .collect()
}

/// Maps a raw payload to the scalar a user would see, honouring the mirror
/// aggregation configured in `settings`.
///
/// The declared `kind` pulls text payloads into numeric form for numeric
/// columns; otherwise the payload shape itself drives the mapping.
pub fn extract_scalar(
    kind: &ColumnKind,
    value: &RawColumnValue,
    settings: &ColumnSettings,
) -> Scalar {
    let scalar = extract_value(value, settings);
    if kind.is_numeric() {
        if let Scalar::Text(s) = &scalar {
            return Scalar::Number(parse_number_lenient(s).unwrap_or(0.0));
        }
    }
    scalar
}

fn extract_value(value: &RawColumnValue, settings: &ColumnSettings) -> Scalar {
    match value {
        RawColumnValue::Text { text }
        | RawColumnValue::LongText { text }
        | RawColumnValue::Time { text }
        | RawColumnValue::WorldClock { text }
        | RawColumnValue::Unknown { text } => text_or_empty(text),
        RawColumnValue::Number { number, text } => match number {
            Some(n) => Scalar::Number(*n),
            None => Scalar::Number(
                text.as_deref()
                    .and_then(parse_number_lenient)
                    .unwrap_or(0.0),
            ),
        },
        RawColumnValue::Date { date, time } => match (date, time) {
            (Some(d), Some(t)) if !d.is_empty() && !t.is_empty() => {
                Scalar::text(format!("{d} {t}"))
            }
            (Some(d), _) if !d.is_empty() => Scalar::text(d.clone()),
            _ => Scalar::Empty,
        },
        RawColumnValue::Timeline { from, to } => match (from, to) {
            (Some(f), Some(t)) if !f.is_empty() && !t.is_empty() => {
                Scalar::text(format!("{f} - {t}"))
            }
            _ => Scalar::Empty,
        },
        RawColumnValue::Week { start, end } => match (start, end) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => {
                Scalar::text(format!("{s} - {e}"))
            }
            _ => Scalar::Empty,
        },
        RawColumnValue::Hour { hour, minute } => match hour {
            Some(h) => Scalar::text(format!("{h:02}:{:02}", minute.unwrap_or(0))),
            None => Scalar::Empty,
        },
        RawColumnValue::Status { label } => text_or_empty(label),
        RawColumnValue::Dropdown { labels } => joined(labels),
        RawColumnValue::People { names } => joined(names),
        RawColumnValue::Checkbox { checked } => Scalar::text(if *checked { "true" } else { "false" }),
        RawColumnValue::Rating { rating } => Scalar::Number(rating.unwrap_or(0.0)),
        RawColumnValue::Vote { votes } => Scalar::Number(votes.unwrap_or(0.0)),
        RawColumnValue::Country { name } => text_or_empty(name),
        RawColumnValue::Email { email, text } => match text_or_empty(text) {
            Scalar::Empty => text_or_empty(email),
            s => s,
        },
        RawColumnValue::Link { url, text } => match text_or_empty(text) {
            Scalar::Empty => text_or_empty(url),
            s => s,
        },
        RawColumnValue::Phone { phone } => text_or_empty(phone),
        RawColumnValue::Location { address } => text_or_empty(address),
        RawColumnValue::ItemId { id } => id.map_or(Scalar::Empty, |v| Scalar::Number(v as f64)),
        RawColumnValue::CreationLog { created_at } => text_or_empty(created_at),
        RawColumnValue::LastUpdated { updated_at } => text_or_empty(updated_at),
        RawColumnValue::TimeTracking { duration_seconds } => match duration_seconds {
            Some(secs) => Scalar::text(format!("{}:{:02}", secs / 3600, (secs % 3600) / 60)),
            None => Scalar::Empty,
        },
        RawColumnValue::BoardRelation { items } | RawColumnValue::Dependency { items } => {
            joined_names(items)
        }
        RawColumnValue::Mirror {
            display_value,
            linked_names,
        } => extract_mirror(settings.function, display_value.as_deref(), linked_names),
    }
}

fn extract_mirror(
    function: MirrorFunction,
    display_value: Option<&str>,
    linked_names: &[String],
) -> Scalar {
    if let Some(dv) = display_value.filter(|dv| !dv.trim().is_empty()) {
        if function.is_numeric() {
            if let Some(numbers) = parse_numeric_list(dv) {
                return Scalar::Number(function.apply(&numbers));
            }
        }
        return Scalar::text(dv.to_owned());
    }
    if !linked_names.is_empty() {
        return joined(linked_names);
    }
    if function.is_numeric() {
        Scalar::Number(0.0)
    } else {
        Scalar::Empty
    }
}

/// Normalises a display-value record: the number for numeric kinds, otherwise
/// the first non-empty of the display value and the text field. Empty when
/// the platform has nothing, which is what triggers the resolver's
/// second-chance and recursion paths.
pub fn record_scalar(kind: &ColumnKind, record: &ColumnValueRecord) -> Scalar {
    if kind.is_numeric() {
        if let Some(n) = record.number {
            return Scalar::Number(n);
        }
        let parsed = [record.display_value.as_deref(), record.text.as_deref()]
            .into_iter()
            .flatten()
            .find_map(parse_number_lenient);
        return match parsed {
            Some(n) => Scalar::Number(n),
            None => Scalar::Empty,
        };
    }
    match text_or_empty(&record.display_value) {
        Scalar::Empty => text_or_empty(&record.text),
        s => s,
    }
}
