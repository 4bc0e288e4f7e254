use crate::{dates, logical, numeric, strings, BuiltinName, FunctionContext};
use formula_resolver_model::Scalar;

/// Case-insensitive lookup of a builtin by its formula name.
pub fn lookup_builtin(name: &str) -> Option<BuiltinName> {
    BuiltinName::parse(name)
}

/// Invokes a builtin. Total: every builtin coerces or falls back instead of
/// failing, so the worst outcome of a malformed call is an empty scalar.
pub fn evaluate_builtin(
    builtin: BuiltinName,
    ctx: &FunctionContext,
    args: &[Scalar],
) -> Scalar {
    match builtin {
        // Numeric
        BuiltinName::Sum => numeric::sum(args),
        BuiltinName::Average => numeric::average(args),
        BuiltinName::Count => numeric::count(args),
        BuiltinName::Max => numeric::max(args),
        BuiltinName::Min => numeric::min(args),
        BuiltinName::Abs => numeric::abs(args),
        BuiltinName::Round => numeric::round(args),
        BuiltinName::RoundUp => numeric::round_up(args),
        BuiltinName::RoundDown => numeric::round_down(args),
        BuiltinName::Sqrt => numeric::sqrt(args),
        BuiltinName::Power => numeric::power(args),
        BuiltinName::Mod => numeric::modulo(args),
        BuiltinName::Log => numeric::log(args),
        BuiltinName::Divide => numeric::divide(args),
        BuiltinName::Multiply => numeric::multiply(args),
        BuiltinName::Minus => numeric::minus(args),
        BuiltinName::Add => numeric::add(args),
        BuiltinName::Pi => numeric::pi(args),

        // Logical
        BuiltinName::If => logical::if_fn(args),
        BuiltinName::And => logical::and(args),
        BuiltinName::Or => logical::or(args),
        BuiltinName::Xor => logical::xor(args),
        BuiltinName::Not => logical::not(args),
        BuiltinName::Switch => logical::switch(args),
        BuiltinName::Exact => logical::exact(args),
        BuiltinName::True => Scalar::Bool(true),
        BuiltinName::False => Scalar::Bool(false),

        // Text
        BuiltinName::Concatenate => strings::concatenate(args),
        BuiltinName::Left => strings::left(args),
        BuiltinName::Right => strings::right(args),
        BuiltinName::Mid => strings::mid(args),
        BuiltinName::Len => strings::len(args),
        BuiltinName::Lower => strings::lower(args),
        BuiltinName::Upper => strings::upper(args),
        BuiltinName::Trim => strings::trim(args),
        BuiltinName::Replace => strings::replace(args),
        BuiltinName::Search => strings::search(args),
        BuiltinName::Substitute => strings::substitute(args),
        BuiltinName::Rept => strings::rept(args),

        // Dates
        BuiltinName::Today => dates::today(ctx),
        BuiltinName::Now => dates::now(ctx),
        BuiltinName::Date => dates::date(args),
        BuiltinName::Days => dates::days(args),
        BuiltinName::Year => dates::year(args),
        BuiltinName::Month => dates::month(args),
        BuiltinName::Day => dates::day(args),
        BuiltinName::Hour => dates::hour(args),
        BuiltinName::Minute => dates::minute(args),
        BuiltinName::Second => dates::second(args),
        BuiltinName::WeekNum => dates::weeknum(args),
        BuiltinName::IsoWeekNum => dates::isoweeknum(args),
        BuiltinName::FormatDate => dates::format_date(args),
        BuiltinName::AddDays => dates::add_days(args),
        BuiltinName::SubtractDays => dates::subtract_days(args),
        BuiltinName::Workday => dates::workday(args),
        BuiltinName::Workdays => dates::workdays(args),
        BuiltinName::HoursDiff => dates::hours_diff(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> FunctionContext {
        FunctionContext::fixed(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn dispatch_reaches_every_group() {
        let c = ctx();
        assert_eq!(
            evaluate_builtin(BuiltinName::Sum, &c, &[Scalar::Number(1.0), Scalar::Number(2.0)]),
            Scalar::Number(3.0)
        );
        assert_eq!(
            evaluate_builtin(BuiltinName::Upper, &c, &[Scalar::text("x")]),
            Scalar::text("X")
        );
        assert_eq!(
            evaluate_builtin(BuiltinName::Not, &c, &[Scalar::Bool(false)]),
            Scalar::Bool(true)
        );
        assert_eq!(
            evaluate_builtin(BuiltinName::Today, &c, &[]),
            Scalar::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().into())
        );
    }

    #[test]
    fn today_and_now_are_stable_within_a_context() {
        let c = ctx();
        assert_eq!(
            evaluate_builtin(BuiltinName::Now, &c, &[]),
            evaluate_builtin(BuiltinName::Now, &c, &[])
        );
    }
}
