use super::{arg_count, arg_position, arg_text};
use formula_resolver_model::Scalar;

/// `LEFT(text, [count])`, one character by default.
pub fn left(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let count = arg_count(args, 1, 1.0);
    Scalar::Text(text.chars().take(count).collect())
}

/// `RIGHT(text, [count])`, one character by default.
pub fn right(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let count = arg_count(args, 1, 1.0);
    let total = text.chars().count();
    Scalar::Text(text.chars().skip(total.saturating_sub(count)).collect())
}

/// `MID(text, start, count)` with a 1-based start.
pub fn mid(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let start = arg_position(args, 1, 1.0);
    let count = arg_count(args, 2, 0.0);
    Scalar::Text(text.chars().skip(start - 1).take(count).collect())
}

/// `REPLACE(text, start, count, replacement)` with a 1-based start.
pub fn replace(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let start = arg_position(args, 1, 1.0);
    let count = arg_count(args, 2, 0.0);
    let replacement = arg_text(args, 3);

    let mut out: String = text.chars().take(start - 1).collect();
    out.push_str(&replacement);
    out.extend(text.chars().skip(start - 1 + count));
    Scalar::Text(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Scalar {
        Scalar::text(s)
    }

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    #[test]
    fn left_right_defaults() {
        assert_eq!(left(&[t("hello")]), t("h"));
        assert_eq!(right(&[t("hello")]), t("o"));
        assert_eq!(left(&[t("hello"), n(3.0)]), t("hel"));
        assert_eq!(right(&[t("hello"), n(3.0)]), t("llo"));
        assert_eq!(right(&[t("hi"), n(10.0)]), t("hi"));
    }

    #[test]
    fn mid_is_one_based_and_clamped() {
        assert_eq!(mid(&[t("hello"), n(2.0), n(3.0)]), t("ell"));
        assert_eq!(mid(&[t("hello"), n(10.0), n(3.0)]), t(""));
        assert_eq!(mid(&[t("hello"), n(-2.0), n(2.0)]), t("he"));
    }

    #[test]
    fn replace_splices_characters() {
        assert_eq!(
            replace(&[t("2024-01-01"), n(6.0), n(2.0), t("12")]),
            t("2024-12-01")
        );
        assert_eq!(replace(&[t("abc"), n(4.0), n(0.0), t("d")]), t("abcd"));
    }
}
