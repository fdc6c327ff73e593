use std::f64::consts::PI;

use cw_core::ClassType;
use cw_forms::{Complex64, FormMatrix};

/// Scalar applied to curvature before insertion: `1/(2 pi)` for Pfaffian
/// classes, `1/(2 pi i)` otherwise.
pub fn normalization_factor(class_type: ClassType) -> Complex64 {
    match class_type {
        ClassType::Pfaffian => Complex64::new(1.0 / (2.0 * PI), 0.0),
        ClassType::Additive | ClassType::Multiplicative => Complex64::new(0.0, -1.0 / (2.0 * PI)),
    }
}

/// Returns a scaled copy of `curvature`; the input is left untouched.
pub fn normalize_matrix(curvature: &FormMatrix, class_type: ClassType) -> FormMatrix {
    curvature.scale(normalization_factor(class_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_forms::DiffForm;

    #[test]
    fn complex_normalization_divides_by_two_pi_i() {
        let omega = DiffForm::monomial(2, &[0, 1], Complex64::new(1.0, 0.0)).unwrap();
        let matrix = FormMatrix::from_rows(2, vec![vec![omega.clone()]]).unwrap();
        let normalized = normalize_matrix(&matrix, ClassType::Multiplicative);
        let expected = omega.scale(Complex64::new(1.0, 0.0) / Complex64::new(0.0, 2.0 * PI));
        assert!(normalized.get(0, 0).unwrap().max_abs_diff(&expected) < 1e-15);
        assert_eq!(matrix.get(0, 0), Some(&omega));
    }

    #[test]
    fn pfaffian_normalization_is_real() {
        let factor = normalization_factor(ClassType::Pfaffian);
        assert_eq!(factor.im, 0.0);
        assert!((factor.re * 2.0 * PI - 1.0).abs() < 1e-15);
    }
}
