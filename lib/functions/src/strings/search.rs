use super::{arg_position, arg_text};
use formula_resolver_model::Scalar;

/// `SEARCH(needle, haystack, [start])`: case-insensitive, 1-based character
/// position, empty when not found.
pub fn search(args: &[Scalar]) -> Scalar {
    let needle = arg_text(args, 0).to_lowercase();
    let haystack = arg_text(args, 1).to_lowercase();
    let start = arg_position(args, 2, 1.0);

    if needle.is_empty() {
        return Scalar::Number(start as f64);
    }
    let skipped: String = haystack.chars().skip(start - 1).collect();
    match skipped.find(&needle) {
        Some(byte_offset) => {
            let chars_before = skipped[..byte_offset].chars().count();
            Scalar::Number((start + chars_before) as f64)
        }
        None => Scalar::Empty,
    }
}

/// `SUBSTITUTE(text, old, new, [instance])`: replaces every occurrence, or
/// only the n-th (1-based) when `instance` is given.
pub fn substitute(args: &[Scalar]) -> Scalar {
    let text = arg_text(args, 0);
    let old = arg_text(args, 1);
    let new = arg_text(args, 2);
    if old.is_empty() {
        return Scalar::Text(text);
    }
    match args.get(3).and_then(Scalar::to_number) {
        None => Scalar::Text(text.replace(&old, &new)),
        Some(instance) => {
            let instance = instance.max(1.0) as usize;
            let mut out = String::new();
            let mut rest = text.as_str();
            let mut seen = 0;
            while let Some(offset) = rest.find(&old) {
                seen += 1;
                if seen == instance {
                    out.push_str(&rest[..offset]);
                    out.push_str(&new);
                    out.push_str(&rest[offset + old.len()..]);
                    return Scalar::Text(out);
                }
                out.push_str(&rest[..offset + old.len()]);
                rest = &rest[offset + old.len()..];
            }
            out.push_str(rest);
            Scalar::Text(out)
        }
    }
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
    fn search_is_case_insensitive_and_one_based() {
        assert_eq!(search(&[t("World"), t("hello world")]), n(7.0));
        assert_eq!(search(&[t("o"), t("hello world"), n(6.0)]), n(8.0));
        assert_eq!(search(&[t("zzz"), t("hello")]), Scalar::Empty);
    }

    #[test]
    fn substitute_all_and_nth() {
        assert_eq!(
            substitute(&[t("a-b-c"), t("-"), t("+")]),
            t("a+b+c")
        );
        assert_eq!(
            substitute(&[t("a-b-c"), t("-"), t("+"), n(2.0)]),
            t("a-b+c")
        );
        assert_eq!(
            substitute(&[t("a-b-c"), t("-"), t("+"), n(5.0)]),
            t("a-b-c")
        );
    }
}
