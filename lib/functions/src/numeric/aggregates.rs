use formula_resolver_model::Scalar;

/// `SUM(x1, …, xn)`: arguments that do not parse numerically contribute 0.
pub fn sum(args: &[Scalar]) -> Scalar {
    Scalar::Number(args.iter().map(Scalar::to_number_or_zero).sum())
}

/// `AVERAGE(x1, …, xn)` over the arguments that coerce to numbers.
pub fn average(args: &[Scalar]) -> Scalar {
    let numbers: Vec<f64> = args.iter().filter_map(Scalar::to_number).collect();
    if numbers.is_empty() {
        return Scalar::Number(0.0);
    }
    Scalar::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// `COUNT(x1, …, xn)`: how many arguments coerce to numbers.
pub fn count(args: &[Scalar]) -> Scalar {
    Scalar::Number(args.iter().filter_map(Scalar::to_number).count() as f64)
}

/// `MAX(x1, …, xn)` over the coercible arguments, 0 when there are none.
pub fn max(args: &[Scalar]) -> Scalar {
    Scalar::Number(
        args.iter()
            .filter_map(Scalar::to_number)
            .fold(None, |acc: Option<f64>, n| {
                Some(acc.map_or(n, |a| a.max(n)))
            })
            .unwrap_or(0.0),
    )
}

/// `MIN(x1, …, xn)` over the coercible arguments, 0 when there are none.
pub fn min(args: &[Scalar]) -> Scalar {
    Scalar::Number(
        args.iter()
            .filter_map(Scalar::to_number)
            .fold(None, |acc: Option<f64>, n| {
                Some(acc.map_or(n, |a| a.min(n)))
            })
            .unwrap_or(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    #[test]
    fn sum_treats_unparseable_text_as_zero() {
        let args = [n(1.0), Scalar::text("2"), Scalar::text("abc"), Scalar::Empty];
        assert_eq!(sum(&args), n(3.0));
    }

    #[test]
    fn average_ignores_non_numeric() {
        let args = [n(10.0), Scalar::text("20"), Scalar::text("abc")];
        assert_eq!(average(&args), n(15.0));
        assert_eq!(average(&[]), n(0.0));
    }

    #[test]
    fn count_max_min() {
        let args = [n(3.0), Scalar::text("5"), Scalar::text("x"), n(-2.0)];
        assert_eq!(count(&args), n(3.0));
        assert_eq!(max(&args), n(5.0));
        assert_eq!(min(&args), n(-2.0));
        assert_eq!(max(&[]), n(0.0));
    }
}
