#![doc(test(attr(deny(warnings))))]

//! The formula language front-end.
//!
//! Formulas are short spreadsheet-style expressions over sibling columns:
//!
//! ```text
//! IF({status} = "Done", {numbers} * 2, 0)
//! ```
//!
//! [tokenize] scans a source string into tokens without ever failing:
//! unterminated strings and column references produce best-effort tokens plus
//! a recovery warning. [parse] builds an [Expr] tree with the fixed operator
//! precedence of the language. [extract_column_ids] reports the columns a
//! formula depends on from a token-only pass, which the resolver uses before
//! committing to any remote work.

mod ast;
mod parser;
mod token;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use parser::{parse, parse_stream};
pub use token::{tokenize, OpToken, SpannedToken, Token, TokenStream, TokenWarning};

pub use formula_resolver_model::ParseError;

use formula_resolver_model::ColumnId;
use rustc_hash::FxHashSet;

/// Collects every column id referenced by `formula` without parsing it.
///
/// The result is a superset of the ids used during evaluation: tolerant
/// scanning can retain references inside otherwise malformed input.
pub fn extract_column_ids(formula: &str) -> FxHashSet<ColumnId> {
    tokenize(formula)
        .tokens
        .into_iter()
        .filter_map(|spanned| match spanned.token {
            Token::ColumnRef { column, .. } => Some(column),
            _ => None,
        })
        .collect()
}
