use crate::{BoardId, ColumnId};
use serde::Deserialize;
use std::fmt;

/// The closed set of column kinds the upstream data API reports.
///
/// Kinds the extractor does not recognise arrive as [ColumnKind::Unknown] and
/// fall back to their raw text representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    LongText,
    Number,
    Date,
    Time,
    Timeline,
    Week,
    Hour,
    Status,
    Dropdown,
    People,
    Checkbox,
    Rating,
    Vote,
    Country,
    Email,
    Link,
    Phone,
    Location,
    ItemId,
    CreationLog,
    LastUpdated,
    TimeTracking,
    BoardRelation,
    Dependency,
    Mirror,
    Formula,
    Lookup,
    WorldClock,
    Unknown(String),
}

impl ColumnKind {
    /// Parses the upstream kind string. Never fails; unrecognised strings are
    /// preserved in [ColumnKind::Unknown].
    pub fn parse(kind: &str) -> Self {
        match kind {
            "text" => ColumnKind::Text,
            "long_text" | "long-text" => ColumnKind::LongText,
            "number" | "numbers" => ColumnKind::Number,
            "date" => ColumnKind::Date,
            "time" => ColumnKind::Time,
            "timeline" => ColumnKind::Timeline,
            "week" => ColumnKind::Week,
            "hour" => ColumnKind::Hour,
            "status" => ColumnKind::Status,
            "dropdown" => ColumnKind::Dropdown,
            "people" => ColumnKind::People,
            "checkbox" => ColumnKind::Checkbox,
            "rating" => ColumnKind::Rating,
            "vote" => ColumnKind::Vote,
            "country" => ColumnKind::Country,
            "email" => ColumnKind::Email,
            "link" => ColumnKind::Link,
            "phone" => ColumnKind::Phone,
            "location" => ColumnKind::Location,
            "item_id" => ColumnKind::ItemId,
            "creation_log" => ColumnKind::CreationLog,
            "last_updated" => ColumnKind::LastUpdated,
            "time_tracking" => ColumnKind::TimeTracking,
            "board_relation" | "board-relation" => ColumnKind::BoardRelation,
            "dependency" => ColumnKind::Dependency,
            "mirror" => ColumnKind::Mirror,
            "formula" => ColumnKind::Formula,
            "lookup" => ColumnKind::Lookup,
            "world_clock" => ColumnKind::WorldClock,
            other => ColumnKind::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::LongText => "long_text",
            ColumnKind::Number => "number",
            ColumnKind::Date => "date",
            ColumnKind::Time => "time",
            ColumnKind::Timeline => "timeline",
            ColumnKind::Week => "week",
            ColumnKind::Hour => "hour",
            ColumnKind::Status => "status",
            ColumnKind::Dropdown => "dropdown",
            ColumnKind::People => "people",
            ColumnKind::Checkbox => "checkbox",
            ColumnKind::Rating => "rating",
            ColumnKind::Vote => "vote",
            ColumnKind::Country => "country",
            ColumnKind::Email => "email",
            ColumnKind::Link => "link",
            ColumnKind::Phone => "phone",
            ColumnKind::Location => "location",
            ColumnKind::ItemId => "item_id",
            ColumnKind::CreationLog => "creation_log",
            ColumnKind::LastUpdated => "last_updated",
            ColumnKind::TimeTracking => "time_tracking",
            ColumnKind::BoardRelation => "board_relation",
            ColumnKind::Dependency => "dependency",
            ColumnKind::Mirror => "mirror",
            ColumnKind::Formula => "formula",
            ColumnKind::Lookup => "lookup",
            ColumnKind::WorldClock => "world_clock",
            ColumnKind::Unknown(other) => other,
        }
    }

    /// Kinds whose value is numeric by nature. The resolver uses this for the
    /// second-chance numeric fetch and for smart defaults.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Number | ColumnKind::Rating | ColumnKind::Vote
        )
    }

    /// Kinds whose platform-cached display value is known to be unusable and
    /// whose resolution requires recursion.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            ColumnKind::Formula | ColumnKind::Mirror | ColumnKind::Lookup
        )
    }
}

impl Default for ColumnKind {
    fn default() -> Self {
        ColumnKind::Unknown(String::new())
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ColumnKind::parse(&raw))
    }
}

/// The numeric aggregation a mirror column applies over its linked values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorFunction {
    Sum,
    #[serde(alias = "average")]
    Avg,
    Count,
    Min,
    Max,
    #[default]
    None,
}

impl MirrorFunction {
    pub fn is_numeric(self) -> bool {
        !matches!(self, MirrorFunction::None)
    }

    /// Applies the aggregation to a list of numbers. `None` is handled by the
    /// caller, which joins values as text instead.
    pub fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            MirrorFunction::Sum | MirrorFunction::None => values.iter().sum(),
            MirrorFunction::Avg => {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
            MirrorFunction::Count => values.len() as f64,
            MirrorFunction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            MirrorFunction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// One mirror target: a board and the columns displayed from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkedColumnTarget {
    pub board_id: BoardId,
    #[serde(default)]
    pub column_ids: Vec<ColumnId>,
}

/// The decoded `settings` object of a column definition.
///
/// Only the fields the resolver consumes are modelled; the platform attaches
/// plenty more, which the deserialiser ignores.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColumnSettings {
    /// Formula source text, present on `formula` columns.
    #[serde(default)]
    pub formula: Option<String>,
    /// Aggregation applied by `mirror` columns.
    #[serde(default)]
    pub function: MirrorFunction,
    /// Mirror targets, first entry authoritative.
    #[serde(default)]
    pub displayed_linked_columns: Vec<LinkedColumnTarget>,
    /// The `board_relation` column used to traverse to linked items.
    #[serde(default)]
    pub relation_column: Option<ColumnId>,
}

impl ColumnSettings {
    /// The first mirror target, if any.
    pub fn primary_target(&self) -> Option<&LinkedColumnTarget> {
        self.displayed_linked_columns.first()
    }

    /// The column id the mirror displays, from the first target.
    pub fn primary_target_column(&self) -> Option<&ColumnId> {
        self.primary_target().and_then(|t| t.column_ids.first())
    }
}

/// A column definition as reported by the board schema query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub title: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub settings: ColumnSettings,
}

impl ColumnDef {
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            settings: ColumnSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ColumnSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_known_and_unknown() {
        assert_eq!(ColumnKind::parse("number"), ColumnKind::Number);
        assert_eq!(ColumnKind::parse("numbers"), ColumnKind::Number);
        assert_eq!(
            ColumnKind::parse("auto_number"),
            ColumnKind::Unknown("auto_number".to_owned())
        );
        assert_eq!(ColumnKind::parse("auto_number").as_str(), "auto_number");
    }

    #[test]
    fn settings_decode_from_json() {
        let settings: ColumnSettings = serde_json::from_str(
            r#"{
                "function": "average",
                "displayed_linked_columns": [
                    { "board_id": 456, "column_ids": ["numbers1"] }
                ],
                "relation_column": "connect_boards",
                "some_future_field": true
            }"#,
        )
        .unwrap();
        assert_eq!(settings.function, MirrorFunction::Avg);
        assert_eq!(
            settings.primary_target_column(),
            Some(&ColumnId::new("numbers1"))
        );
        assert_eq!(settings.relation_column, Some(ColumnId::new("connect_boards")));
    }

    #[test]
    fn mirror_function_apply() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(MirrorFunction::Sum.apply(&values), 60.0);
        assert_eq!(MirrorFunction::Avg.apply(&values), 20.0);
        assert_eq!(MirrorFunction::Count.apply(&values), 3.0);
        assert_eq!(MirrorFunction::Min.apply(&values), 10.0);
        assert_eq!(MirrorFunction::Max.apply(&values), 30.0);
        assert_eq!(MirrorFunction::Avg.apply(&[]), 0.0);
    }
}
