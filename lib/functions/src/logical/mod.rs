//! Logical builtins. Truthiness follows [Scalar::to_bool]: 0, empty values
//! and the empty string are falsy.

use formula_resolver_model::Scalar;

/// `IF(condition, then, [else])`; the else branch defaults to empty.
pub fn if_fn(args: &[Scalar]) -> Scalar {
    let condition = args.first().map_or(false, Scalar::to_bool);
    if condition {
        args.get(1).cloned().unwrap_or(Scalar::Empty)
    } else {
        args.get(2).cloned().unwrap_or(Scalar::Empty)
    }
}

/// `AND(a, b, …)`.
pub fn and(args: &[Scalar]) -> Scalar {
    Scalar::Bool(args.iter().all(Scalar::to_bool))
}

/// `OR(a, b, …)`.
pub fn or(args: &[Scalar]) -> Scalar {
    Scalar::Bool(args.iter().any(Scalar::to_bool))
}

/// `XOR(a, b, …)`: true for an odd number of truthy arguments.
pub fn xor(args: &[Scalar]) -> Scalar {
    Scalar::Bool(args.iter().filter(|a| a.to_bool()).count() % 2 == 1)
}

/// `NOT(a)`.
pub fn not(args: &[Scalar]) -> Scalar {
    Scalar::Bool(!args.first().map_or(false, Scalar::to_bool))
}

/// `EXACT(a, b)`: case-sensitive comparison of the display strings.
pub fn exact(args: &[Scalar]) -> Scalar {
    let a = args.first().map(Scalar::to_display).unwrap_or_default();
    let b = args.get(1).map(Scalar::to_display).unwrap_or_default();
    Scalar::Bool(a == b)
}

/// `SWITCH(expr, k1, v1, …, [default])`: the value paired with the first key
/// loosely equal to `expr`, the trailing default on no match, or the empty
/// string when no default is given.
pub fn switch(args: &[Scalar]) -> Scalar {
    let Some(expr) = args.first() else {
        return Scalar::text("");
    };
    let rest = &args[1..];
    let mut pairs = rest.chunks_exact(2);
    for pair in &mut pairs {
        if expr.loose_eq(&pair[0]) {
            return pair[1].clone();
        }
    }
    match pairs.remainder() {
        [default] => default.clone(),
        _ => Scalar::text(""),
    }
}
