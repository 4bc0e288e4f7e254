use super::{arg_number, finite};
use formula_resolver_model::Scalar;

fn digits_factor(args: &[Scalar]) -> (f64, bool) {
    let digits = arg_number(args, 1);
    let truncated = digits.trunc();
    // Negative digit counts round to powers of ten: ROUND(1234, -2) = 1200.
    (10f64.powf(truncated.abs()), truncated >= 0.0)
}

/// `ROUND(x, [digits])`, half away from zero, negative digits supported.
pub fn round(args: &[Scalar]) -> Scalar {
    let x = arg_number(args, 0);
    let (factor, positive) = digits_factor(args);
    let value = if positive {
        (x * factor).round() / factor
    } else {
        (x / factor).round() * factor
    };
    finite(value)
}

/// `ROUNDUP(x, [digits])`: away from zero.
pub fn round_up(args: &[Scalar]) -> Scalar {
    let x = arg_number(args, 0);
    let (factor, positive) = digits_factor(args);
    let scaled = if positive { x * factor } else { x / factor };
    let rounded = if x >= 0.0 { scaled.ceil() } else { scaled.floor() };
    let value = if positive { rounded / factor } else { rounded * factor };
    finite(value)
}

/// `ROUNDDOWN(x, [digits])`: toward zero.
pub fn round_down(args: &[Scalar]) -> Scalar {
    let x = arg_number(args, 0);
    let (factor, positive) = digits_factor(args);
    let scaled = if positive { x * factor } else { x / factor };
    let value = if positive {
        scaled.trunc() / factor
    } else {
        scaled.trunc() * factor
    };
    finite(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    #[test]
    fn round_with_digits() {
        assert_eq!(round(&[n(2.346), n(2.0)]), n(2.35));
        assert_eq!(round(&[n(2.5)]), n(3.0));
        assert_eq!(round(&[n(-2.5)]), n(-3.0));
    }

    #[test]
    fn round_with_negative_digits() {
        assert_eq!(round(&[n(1234.0), n(-2.0)]), n(1200.0));
        assert_eq!(round(&[n(1250.0), n(-2.0)]), n(1300.0));
    }

    #[test]
    fn round_up_and_down() {
        assert_eq!(round_up(&[n(1.21), n(1.0)]), n(1.3));
        assert_eq!(round_up(&[n(-1.21), n(1.0)]), n(-1.3));
        assert_eq!(round_down(&[n(1.29), n(1.0)]), n(1.2));
        assert_eq!(round_down(&[n(-1.29), n(1.0)]), n(-1.2));
        assert_eq!(round_down(&[n(1234.0), n(-2.0)]), n(1200.0));
    }
}
