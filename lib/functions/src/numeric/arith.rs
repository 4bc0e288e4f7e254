use super::{arg_number, finite};
use formula_resolver_model::Scalar;

/// `ABS(x)`.
pub fn abs(args: &[Scalar]) -> Scalar {
    Scalar::Number(arg_number(args, 0).abs())
}

/// `SQRT(x)`, 0 for negative input.
pub fn sqrt(args: &[Scalar]) -> Scalar {
    let x = arg_number(args, 0);
    if x < 0.0 {
        return Scalar::Number(0.0);
    }
    finite(x.sqrt())
}

/// `POWER(x, y)`.
pub fn power(args: &[Scalar]) -> Scalar {
    finite(arg_number(args, 0).powf(arg_number(args, 1)))
}

/// `MOD(x, y)`, 0 when the divisor is 0. The result carries the dividend's
/// sign.
pub fn modulo(args: &[Scalar]) -> Scalar {
    let y = arg_number(args, 1);
    if y == 0.0 {
        return Scalar::Number(0.0);
    }
    finite(arg_number(args, 0) % y)
}

/// `LOG(x, [base])`, base 10 by default; 0 for non-positive input or a
/// degenerate base.
pub fn log(args: &[Scalar]) -> Scalar {
    let x = arg_number(args, 0);
    let base = if args.len() > 1 { arg_number(args, 1) } else { 10.0 };
    if x <= 0.0 || base <= 0.0 || base == 1.0 {
        return Scalar::Number(0.0);
    }
    finite(x.ln() / base.ln())
}

/// `DIVIDE(x, y)`, 0 when the divisor is 0.
pub fn divide(args: &[Scalar]) -> Scalar {
    let y = arg_number(args, 1);
    if y == 0.0 {
        return Scalar::Number(0.0);
    }
    finite(arg_number(args, 0) / y)
}

/// `MULTIPLY(x, y)`.
pub fn multiply(args: &[Scalar]) -> Scalar {
    finite(arg_number(args, 0) * arg_number(args, 1))
}

/// `MINUS(x, y)`.
pub fn minus(args: &[Scalar]) -> Scalar {
    finite(arg_number(args, 0) - arg_number(args, 1))
}

/// `ADD(x, y)`.
pub fn add(args: &[Scalar]) -> Scalar {
    finite(arg_number(args, 0) + arg_number(args, 1))
}

/// `PI()`.
pub fn pi(_args: &[Scalar]) -> Scalar {
    Scalar::Number(std::f64::consts::PI)
}
