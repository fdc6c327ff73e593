use cw_core::errors::CwError;
use cw_core::ClassType;
use cw_forms::{DiffForm, FormMatrix};

/// Collapses a matrix of forms to a single form: trace for additive classes,
/// determinant for multiplicative ones, Pfaffian otherwise.
pub fn reduce(matrix: &FormMatrix, class_type: ClassType) -> Result<DiffForm, CwError> {
    match class_type {
        ClassType::Additive => Ok(matrix.trace()),
        ClassType::Multiplicative => matrix.determinant(),
        ClassType::Pfaffian => matrix.pfaffian(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Normed;
    use cw_forms::Complex64;

    fn scalar_matrix(rows: &[[f64; 2]; 2]) -> FormMatrix {
        FormMatrix::from_rows(
            0,
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|v| DiffForm::scalar(0, Complex64::new(*v, 0.0)))
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn additive_and_multiplicative_differ_on_non_scalar_matrix() {
        let matrix = scalar_matrix(&[[1.0, 2.0], [3.0, 4.0]]);
        let trace = reduce(&matrix, ClassType::Additive).unwrap();
        let det = reduce(&matrix, ClassType::Multiplicative).unwrap();
        assert!((trace.scalar_part() - Complex64::new(5.0, 0.0)).norm() < 1e-12);
        assert!((det.scalar_part() - Complex64::new(-2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn pfaffian_of_odd_size_is_unsupported() {
        let matrix = FormMatrix::identity(3, 0);
        let err = reduce(&matrix, ClassType::Pfaffian).unwrap_err();
        assert!(matches!(err, CwError::Reduction(_)));
        assert_eq!(err.code(), "odd-pfaffian");
    }

    #[test]
    fn pfaffian_of_two_by_two_is_upper_entry() {
        let matrix = scalar_matrix(&[[0.0, 7.0], [-7.0, 0.0]]);
        let pf = reduce(&matrix, ClassType::Pfaffian).unwrap();
        assert!((pf.scalar_part() - Complex64::new(7.0, 0.0)).norm() < 1e-12);
    }
}
