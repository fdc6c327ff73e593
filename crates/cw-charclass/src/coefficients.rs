use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{ClassType, FieldType};
use cw_series::{AnalyticFunction, Complex64, PowerSeries, ZERO_TOL};
use tracing::debug;

/// Highest power of the curvature matrix that can contribute on a manifold of
/// dimension `dim`.
pub fn truncation_order(dim: usize) -> usize {
    dim / 2
}

/// Coefficients `c[k]` multiplying the `k`-th power of the normalized
/// curvature matrix.
///
/// Real classes are expanded in `x^2`: the additive case uses `f(x^2)/2`, the
/// multiplicative case `sqrt(f(x^2))`, and the Pfaffian case the odd part of
/// `f`. Trailing zeros are dropped, keeping at least one entry.
pub fn extract_coefficients(
    function: &dyn AnalyticFunction,
    class_type: ClassType,
    field: FieldType,
    order: usize,
) -> Result<Vec<Complex64>, CwError> {
    let series = match field {
        FieldType::Complex => function.taylor(order)?,
        FieldType::Real => match class_type {
            ClassType::Additive => {
                squared_argument(function, order)?.scale(Complex64::new(0.5, 0.0))
            }
            ClassType::Multiplicative => squared_argument(function, order)?.sqrt()?,
            ClassType::Pfaffian => function.taylor(order)?.odd_part(),
        },
        FieldType::NeitherRealNorComplex => {
            return Err(CwError::Validation(
                ErrorInfo::new(
                    "invalid-field",
                    "the vector bundle must either be real or complex",
                )
                .with_context("field", field),
            ))
        }
    };
    let coeffs = series.truncate(order).dense_coefficients(ZERO_TOL);
    debug!(
        function = %function.describe(),
        class_type = %class_type,
        field = %field,
        order,
        retained = coeffs.len(),
        "extracted class coefficients"
    );
    Ok(coeffs)
}

fn squared_argument(function: &dyn AnalyticFunction, order: usize) -> Result<PowerSeries, CwError> {
    function
        .taylor(order / 2)?
        .substitute_monomial(Complex64::new(1.0, 0.0), 2, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Normed;
    use cw_series::{ExponentialFunction, Polynomial};

    fn re(values: &[Complex64]) -> Vec<f64> {
        values.iter().map(|c| c.re).collect()
    }

    fn assert_close(actual: &[Complex64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - Complex64::new(*e, 0.0)).norm() < 1e-12, "{actual:?}");
        }
    }

    #[test]
    fn complex_classes_use_plain_taylor_coefficients() {
        let coeffs = extract_coefficients(
            &Polynomial::one_plus_x(),
            ClassType::Multiplicative,
            FieldType::Complex,
            2,
        )
        .unwrap();
        assert_eq!(re(&coeffs), vec![1.0, 1.0]);
    }

    #[test]
    fn real_additive_halves_the_squared_argument() {
        let coeffs =
            extract_coefficients(&ExponentialFunction, ClassType::Additive, FieldType::Real, 4)
                .unwrap();
        assert_close(&coeffs, &[0.5, 0.0, 0.5, 0.0, 0.25]);
    }

    #[test]
    fn real_multiplicative_takes_square_root() {
        let coeffs = extract_coefficients(
            &Polynomial::one_plus_x(),
            ClassType::Multiplicative,
            FieldType::Real,
            4,
        )
        .unwrap();
        assert_close(&coeffs, &[1.0, 0.0, 0.5, 0.0, -0.125]);
    }

    #[test]
    fn pfaffian_keeps_odd_part() {
        let coeffs = extract_coefficients(
            &Polynomial::from_real(&[3.0, 1.0, 5.0]),
            ClassType::Pfaffian,
            FieldType::Real,
            2,
        )
        .unwrap();
        assert_eq!(re(&coeffs), vec![0.0, 1.0]);
    }

    #[test]
    fn multiplicative_real_needs_nonzero_constant_term() {
        let err = extract_coefficients(
            &Polynomial::identity(),
            ClassType::Multiplicative,
            FieldType::Real,
            2,
        )
        .unwrap_err();
        assert_eq!(err.code(), "zero-constant-term");
    }

    #[test]
    fn neither_field_is_rejected() {
        let err = extract_coefficients(
            &Polynomial::one_plus_x(),
            ClassType::Additive,
            FieldType::NeitherRealNorComplex,
            1,
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid-field");
    }

    #[test]
    fn order_zero_keeps_constant_term() {
        let coeffs = extract_coefficients(
            &Polynomial::one_plus_x(),
            ClassType::Multiplicative,
            FieldType::Complex,
            0,
        )
        .unwrap();
        assert_eq!(re(&coeffs), vec![1.0]);
        assert_eq!(truncation_order(3), 1);
    }
}
