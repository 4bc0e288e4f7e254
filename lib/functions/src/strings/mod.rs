//! Text builtins. Positions and lengths count characters, not bytes, and are
//! 1-based the way spreadsheet users expect.

mod case;
mod search;
mod slice;

pub use case::{len, lower, rept, trim, upper};
pub use search::{search, substitute};
pub use slice::{left, mid, replace, right};

use formula_resolver_model::Scalar;

/// `CONCATENATE(a, b, …)`: the display strings of all arguments joined.
pub fn concatenate(args: &[Scalar]) -> Scalar {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_display());
    }
    Scalar::Text(out)
}

/// The display string of an argument, empty when absent.
pub(crate) fn arg_text(args: &[Scalar], index: usize) -> String {
    args.get(index).map(Scalar::to_display).unwrap_or_default()
}

/// A 1-based character position argument clamped to at least 1.
pub(crate) fn arg_position(args: &[Scalar], index: usize, default: f64) -> usize {
    let raw = args
        .get(index)
        .and_then(Scalar::to_number)
        .unwrap_or(default);
    raw.max(1.0) as usize
}

/// A character count argument clamped to at least 0.
pub(crate) fn arg_count(args: &[Scalar], index: usize, default: f64) -> usize {
    let raw = args
        .get(index)
        .and_then(Scalar::to_number)
        .unwrap_or(default);
    raw.max(0.0) as usize
}
