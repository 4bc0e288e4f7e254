use std::fmt;

/// A builtin of the formula language.
///
/// Names are matched case-insensitively. The set is closed; identifiers
/// outside it are tolerated by the parser and degrade to empty at evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinName {
    // Numeric
    Sum,
    Average,
    Count,
    Max,
    Min,
    Abs,
    Round,
    RoundUp,
    RoundDown,
    Sqrt,
    Power,
    Mod,
    Log,
    Divide,
    Multiply,
    Minus,
    Add,
    Pi,

    // Logical
    If,
    And,
    Or,
    Xor,
    Not,
    Switch,
    Exact,
    True,
    False,

    // Text
    Concatenate,
    Left,
    Right,
    Mid,
    Len,
    Lower,
    Upper,
    Trim,
    Replace,
    Search,
    Substitute,
    Rept,

    // Dates
    Today,
    Now,
    Date,
    Days,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    WeekNum,
    IsoWeekNum,
    FormatDate,
    AddDays,
    SubtractDays,
    Workday,
    Workdays,
    HoursDiff,
}

impl BuiltinName {
    /// Case-insensitive lookup of a formula function name.
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let builtin = match upper.as_str() {
            "SUM" => BuiltinName::Sum,
            "AVERAGE" => BuiltinName::Average,
            "COUNT" => BuiltinName::Count,
            "MAX" => BuiltinName::Max,
            "MIN" => BuiltinName::Min,
            "ABS" => BuiltinName::Abs,
            "ROUND" => BuiltinName::Round,
            "ROUNDUP" => BuiltinName::RoundUp,
            "ROUNDDOWN" => BuiltinName::RoundDown,
            "SQRT" => BuiltinName::Sqrt,
            "POWER" => BuiltinName::Power,
            "MOD" => BuiltinName::Mod,
            "LOG" => BuiltinName::Log,
            "DIVIDE" => BuiltinName::Divide,
            "MULTIPLY" => BuiltinName::Multiply,
            "MINUS" => BuiltinName::Minus,
            "ADD" => BuiltinName::Add,
            "PI" => BuiltinName::Pi,
            "IF" => BuiltinName::If,
            "AND" => BuiltinName::And,
            "OR" => BuiltinName::Or,
            "XOR" => BuiltinName::Xor,
            "NOT" => BuiltinName::Not,
            "SWITCH" => BuiltinName::Switch,
            "EXACT" => BuiltinName::Exact,
            "TRUE" => BuiltinName::True,
            "FALSE" => BuiltinName::False,
            "CONCATENATE" => BuiltinName::Concatenate,
            "LEFT" => BuiltinName::Left,
            "RIGHT" => BuiltinName::Right,
            "MID" => BuiltinName::Mid,
            "LEN" => BuiltinName::Len,
            "LOWER" => BuiltinName::Lower,
            "UPPER" => BuiltinName::Upper,
            "TRIM" => BuiltinName::Trim,
            "REPLACE" => BuiltinName::Replace,
            "SEARCH" => BuiltinName::Search,
            "SUBSTITUTE" => BuiltinName::Substitute,
            "REPT" => BuiltinName::Rept,
            "TODAY" => BuiltinName::Today,
            "NOW" => BuiltinName::Now,
            "DATE" => BuiltinName::Date,
            "DAYS" => BuiltinName::Days,
            "YEAR" => BuiltinName::Year,
            "MONTH" => BuiltinName::Month,
            "DAY" => BuiltinName::Day,
            "HOUR" => BuiltinName::Hour,
            "MINUTE" => BuiltinName::Minute,
            "SECOND" => BuiltinName::Second,
            "WEEKNUM" => BuiltinName::WeekNum,
            "ISOWEEKNUM" => BuiltinName::IsoWeekNum,
            "FORMAT_DATE" => BuiltinName::FormatDate,
            "ADD_DAYS" => BuiltinName::AddDays,
            "SUBTRACT_DAYS" => BuiltinName::SubtractDays,
            "WORKDAY" => BuiltinName::Workday,
            "WORKDAYS" => BuiltinName::Workdays,
            "HOURS_DIFF" => BuiltinName::HoursDiff,
            _ => return None,
        };
        Some(builtin)
    }
}

impl fmt::Display for BuiltinName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuiltinName::Sum => "SUM",
            BuiltinName::Average => "AVERAGE",
            BuiltinName::Count => "COUNT",
            BuiltinName::Max => "MAX",
            BuiltinName::Min => "MIN",
            BuiltinName::Abs => "ABS",
            BuiltinName::Round => "ROUND",
            BuiltinName::RoundUp => "ROUNDUP",
            BuiltinName::RoundDown => "ROUNDDOWN",
            BuiltinName::Sqrt => "SQRT",
            BuiltinName::Power => "POWER",
            BuiltinName::Mod => "MOD",
            BuiltinName::Log => "LOG",
            BuiltinName::Divide => "DIVIDE",
            BuiltinName::Multiply => "MULTIPLY",
            BuiltinName::Minus => "MINUS",
            BuiltinName::Add => "ADD",
            BuiltinName::Pi => "PI",
            BuiltinName::If => "IF",
            BuiltinName::And => "AND",
            BuiltinName::Or => "OR",
            BuiltinName::Xor => "XOR",
            BuiltinName::Not => "NOT",
            BuiltinName::Switch => "SWITCH",
            BuiltinName::Exact => "EXACT",
            BuiltinName::True => "TRUE",
            BuiltinName::False => "FALSE",
            BuiltinName::Concatenate => "CONCATENATE",
            BuiltinName::Left => "LEFT",
            BuiltinName::Right => "RIGHT",
            BuiltinName::Mid => "MID",
            BuiltinName::Len => "LEN",
            BuiltinName::Lower => "LOWER",
            BuiltinName::Upper => "UPPER",
            BuiltinName::Trim => "TRIM",
            BuiltinName::Replace => "REPLACE",
            BuiltinName::Search => "SEARCH",
            BuiltinName::Substitute => "SUBSTITUTE",
            BuiltinName::Rept => "REPT",
            BuiltinName::Today => "TODAY",
            BuiltinName::Now => "NOW",
            BuiltinName::Date => "DATE",
            BuiltinName::Days => "DAYS",
            BuiltinName::Year => "YEAR",
            BuiltinName::Month => "MONTH",
            BuiltinName::Day => "DAY",
            BuiltinName::Hour => "HOUR",
            BuiltinName::Minute => "MINUTE",
            BuiltinName::Second => "SECOND",
            BuiltinName::WeekNum => "WEEKNUM",
            BuiltinName::IsoWeekNum => "ISOWEEKNUM",
            BuiltinName::FormatDate => "FORMAT_DATE",
            BuiltinName::AddDays => "ADD_DAYS",
            BuiltinName::SubtractDays => "SUBTRACT_DAYS",
            BuiltinName::Workday => "WORKDAY",
            BuiltinName::Workdays => "WORKDAYS",
            BuiltinName::HoursDiff => "HOURS_DIFF",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(BuiltinName::parse("sum"), Some(BuiltinName::Sum));
        assert_eq!(BuiltinName::parse("Format_Date"), Some(BuiltinName::FormatDate));
        assert_eq!(BuiltinName::parse("NOPE"), None);
    }

    #[test]
    fn display_round_trips() {
        for name in ["SUM", "ISOWEEKNUM", "HOURS_DIFF", "TRUE"] {
            let builtin = BuiltinName::parse(name).unwrap();
            assert_eq!(builtin.to_string(), name);
        }
    }
}
