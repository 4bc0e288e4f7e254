use super::{arg_count, arg_text};
use formula_resolver_model::Scalar;

/// `UPPER(text)`.
pub fn upper(args: &[Scalar]) -> Scalar {
    Scalar::Text(arg_text(args, 0).to_uppercase())
}

/// `LOWER(text)`.
pub fn lower(args: &[Scalar]) -> Scalar {
    Scalar::Text(arg_text(args, 0).to_lowercase())
}

/// `TRIM(text)`.
pub fn trim(args: &[Scalar]) -> Scalar {
    Scalar::Text(arg_text(args, 0).trim().to_owned())
}

/// `LEN(text)` in characters.
pub fn len(args: &[Scalar]) -> Scalar {
    Scalar::Number(arg_text(args, 0).chars().count() as f64)
}

/// `REPT(text, times)`.
pub fn rept(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let times = arg_count(args, 1, 0.0);
    Scalar::Text(text.repeat(times))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_len() {
        assert_eq!(upper(&[Scalar::text("abc")]), Scalar::text("ABC"));
        assert_eq!(lower(&[Scalar::text("AbC")]), Scalar::text("abc"));
        assert_eq!(trim(&[Scalar::text("  x  ")]), Scalar::text("x"));
        assert_eq!(len(&[Scalar::text("héllo")]), Scalar::Number(5.0));
    }

    #[test]
    fn rept_clamps_negative_counts() {
        assert_eq!(rept(&[Scalar::text("ab"), Scalar::Number(3.0)]), Scalar::text("ababab"));
        assert_eq!(rept(&[Scalar::text("ab"), Scalar::Number(-1.0)]), Scalar::text(""));
    }
}
