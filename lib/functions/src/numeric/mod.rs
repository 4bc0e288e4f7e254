//! Numeric builtins. All of them coerce leniently and return 0 instead of
//! failing on degenerate input such as division by zero.

mod aggregates;
mod arith;
mod rounding;

pub use aggregates::{average, count, max, min, sum};
pub use arith::{abs, add, divide, log, minus, modulo, multiply, pi, power, sqrt};
pub use rounding::{round, round_down, round_up};

use formula_resolver_model::Scalar;

/// The numeric value of an argument, with 0 filling in for anything that does
/// not coerce.
pub(crate) fn arg_number(args: &[Scalar], index: usize) -> f64 {
    args.get(index).map_or(0.0, Scalar::to_number_or_zero)
}

/// Wraps a computation result, mapping the non-finite outcomes of degenerate
/// input back to 0.
pub(crate) fn finite(value: f64) -> Scalar {
    if value.is_finite() {
        Scalar::Number(value)
    } else {
        Scalar::Number(0.0)
    }
}
