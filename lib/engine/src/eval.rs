//! The tree evaluator. Pure and synchronous: the resolver populates the
//! environment with every dependency before evaluation starts, so no remote
//! call ever happens from here.

use formula_resolver_functions::{evaluate_builtin, lookup_builtin, FunctionContext};
use formula_resolver_language::{BinaryOperator, Expr, UnaryOperator};
use formula_resolver_model::{ColumnId, Scalar};
use rustc_hash::FxHashMap;
use tracing::warn;

/// The `column → scalar` environment a formula evaluates against.
///
/// Sub-field references (`{date4#date}`) resolve through field-qualified
/// entries when the resolver populated them, falling back to the base column
/// value. Missing columns evaluate to empty.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    base: FxHashMap<ColumnId, Scalar>,
    fields: FxHashMap<(ColumnId, String), Scalar>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: ColumnId, value: Scalar) {
        self.base.insert(column, value);
    }

    pub fn insert_field(&mut self, column: ColumnId, field: impl Into<String>, value: Scalar) {
        self.fields.insert((column, field.into()), value);
    }

    pub fn lookup(&self, column: &ColumnId, subfield: Option<&str>) -> Scalar {
        if let Some(field) = subfield {
            if let Some(value) = self.fields.get(&(column.clone(), field.to_owned())) {
                return value.clone();
            }
        }
        self.base.get(column).cloned().unwrap_or(Scalar::Empty)
    }
}

impl FromIterator<(ColumnId, Scalar)> for Environment {
    fn from_iter<I: IntoIterator<Item = (ColumnId, Scalar)>>(iter: I) -> Self {
        Self {
            base: iter.into_iter().collect(),
            fields: FxHashMap::default(),
        }
    }
}

/// Walks an expression tree against an environment.
pub fn evaluate(expr: &Expr, env: &Environment, ctx: &FunctionContext) -> Scalar {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::ColumnRef { column, subfield } => env.lookup(column, subfield.as_deref()),
        Expr::FunctionCall { name, args } => {
            let values: Vec<Scalar> = args.iter().map(|arg| evaluate(arg, env, ctx)).collect();
            match lookup_builtin(name) {
                Some(builtin) => evaluate_builtin(builtin, ctx, &values),
                None => {
                    warn!(function = %name, "unknown formula function");
                    Scalar::Empty
                }
            }
        }
        Expr::BinaryOp { op, lhs, rhs } => {
            let lhs = evaluate(lhs, env, ctx);
            let rhs = evaluate(rhs, env, ctx);
            apply_binary(*op, &lhs, &rhs)
        }
        Expr::UnaryOp { op, operand } => {
            let value = evaluate(operand, env, ctx);
            match op {
                UnaryOperator::Negate => Scalar::Number(-value.to_number_or_zero()),
            }
        }
    }
}

fn apply_binary(op: BinaryOperator, lhs: &Scalar, rhs: &Scalar) -> Scalar {
    match op {
        // `+` is numeric addition when both sides coerce, string
        // concatenation otherwise. `&` always concatenates.
        BinaryOperator::Add => match (lhs.to_number(), rhs.to_number()) {
            (Some(a), Some(b)) => Scalar::Number(a + b),
            _ => concat(lhs, rhs),
        },
        BinaryOperator::Concat => concat(lhs, rhs),
        BinaryOperator::Subtract => Scalar::Number(lhs.to_number_or_zero() - rhs.to_number_or_zero()),
        BinaryOperator::Multiply => Scalar::Number(lhs.to_number_or_zero() * rhs.to_number_or_zero()),
        BinaryOperator::Divide => {
            let divisor = rhs.to_number_or_zero();
            if divisor == 0.0 {
                Scalar::Number(0.0)
            } else {
                Scalar::Number(lhs.to_number_or_zero() / divisor)
            }
        }
        BinaryOperator::Modulo => {
            let divisor = rhs.to_number_or_zero();
            if divisor == 0.0 {
                Scalar::Number(0.0)
            } else {
                Scalar::Number(lhs.to_number_or_zero() % divisor)
            }
        }
        BinaryOperator::Eq => Scalar::Bool(lhs.loose_eq(rhs)),
        BinaryOperator::Ne => Scalar::Bool(!lhs.loose_eq(rhs)),
        BinaryOperator::Lt => Scalar::Bool(lhs.to_number_or_zero() < rhs.to_number_or_zero()),
        BinaryOperator::Gt => Scalar::Bool(lhs.to_number_or_zero() > rhs.to_number_or_zero()),
        BinaryOperator::Le => Scalar::Bool(lhs.to_number_or_zero() <= rhs.to_number_or_zero()),
        BinaryOperator::Ge => Scalar::Bool(lhs.to_number_or_zero() >= rhs.to_number_or_zero()),
    }
}

fn concat(lhs: &Scalar, rhs: &Scalar) -> Scalar {
    Scalar::Text(format!("{lhs}{rhs}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_resolver_language::parse;

    fn eval(formula: &str, env: &Environment) -> Scalar {
        let ctx = FunctionContext::fixed(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        evaluate(&parse(formula).unwrap(), env, &ctx)
    }

    fn env(pairs: &[(&str, Scalar)]) -> Environment {
        pairs
            .iter()
            .map(|(id, value)| (ColumnId::new(*id), value.clone()))
            .collect()
    }

    #[test]
    fn constant_folding_matches_spacing_variants() {
        let empty = Environment::new();
        for formula in ["5 + 3", " 5 + 3 ", "5+3"] {
            assert_eq!(eval(formula, &empty), Scalar::Number(8.0));
        }
    }

    #[test]
    fn plus_concatenates_when_not_numeric() {
        let empty = Environment::new();
        assert_eq!(eval(r#""a" + "b""#, &empty), Scalar::text("ab"));
        assert_eq!(eval(r#""1" + "2""#, &empty), Scalar::Number(3.0));
        assert_eq!(eval(r#"1 & 2"#, &empty), Scalar::text("12"));
    }

    #[test]
    fn column_refs_read_the_environment() {
        let env = env(&[("numbers1", Scalar::Number(25.0))]);
        assert_eq!(eval("{numbers1} * 2", &env), Scalar::Number(50.0));
    }

    #[test]
    fn missing_columns_are_empty() {
        let empty = Environment::new();
        assert_eq!(eval("{ghost}", &empty), Scalar::Empty);
        // Empty does not coerce, so + falls back to concatenation.
        assert_eq!(eval("{ghost} + 1", &empty), Scalar::text("1"));
    }

    #[test]
    fn subfields_fall_back_to_base_values() {
        let mut env = Environment::new();
        env.insert(ColumnId::new("date4"), Scalar::text("2024-03-09 08:00"));
        env.insert_field(ColumnId::new("date4"), "date", Scalar::text("2024-03-09"));
        assert_eq!(eval("{date4#date}", &env), Scalar::text("2024-03-09"));
        assert_eq!(eval("{date4#missing}", &env), Scalar::text("2024-03-09 08:00"));
    }

    #[test]
    fn comparisons_coerce_to_numbers() {
        let empty = Environment::new();
        assert_eq!(eval(r#""10" > 9"#, &empty), Scalar::Bool(true));
        assert_eq!(eval("1 <> 2", &empty), Scalar::Bool(true));
        assert_eq!(eval(r#""abc" = "abc""#, &empty), Scalar::Bool(true));
    }

    #[test]
    fn division_by_zero_is_zero() {
        let empty = Environment::new();
        assert_eq!(eval("10 / 0", &empty), Scalar::Number(0.0));
        assert_eq!(eval("10 % 0", &empty), Scalar::Number(0.0));
    }

    #[test]
    fn functions_compose_with_operators() {
        let env = env(&[("a", Scalar::Number(2.0))]);
        assert_eq!(eval("SUM({a}, 3) * 2", &env), Scalar::Number(10.0));
        assert_eq!(
            eval(r#"IF({a} > 1, "big", "small")"#, &env),
            Scalar::text("big")
        );
    }

    #[test]
    fn unknown_functions_degrade_to_empty() {
        let empty = Environment::new();
        assert_eq!(eval("FROBNICATE(1, 2)", &empty), Scalar::Empty);
    }

    #[test]
    fn unary_minus() {
        let env = env(&[("a", Scalar::Number(5.0))]);
        assert_eq!(eval("-{a} + 1", &env), Scalar::Number(-4.0));
    }
}
