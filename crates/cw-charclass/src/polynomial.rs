use cw_core::errors::CwError;
use cw_forms::{Complex64, FormMatrix};

/// Evaluates `sum_k coeffs[k] * matrix^k`.
///
/// Powers are built iteratively as `M^(k+1) = M * M^k`, so `d` coefficients
/// beyond the constant cost `d` products. An empty slice yields the zero matrix.
pub fn insert_in_polynomial(
    matrix: &FormMatrix,
    coeffs: &[Complex64],
) -> Result<FormMatrix, CwError> {
    let (size, dim) = (matrix.size(), matrix.dim());
    let mut power = FormMatrix::identity(size, dim);
    let mut result = FormMatrix::zeros(size, dim);
    for (k, coeff) in coeffs.iter().enumerate() {
        if k > 0 {
            power = matrix.mul(&power)?;
        }
        result = result.add(&power.scale(*coeff))?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_forms::DiffForm;

    fn two_form(dim: usize, i: usize, j: usize, value: f64) -> DiffForm {
        DiffForm::monomial(dim, &[i, j], Complex64::new(value, 0.0)).unwrap()
    }

    #[test]
    fn constant_polynomial_is_scaled_identity() {
        let matrix = FormMatrix::from_rows(
            4,
            vec![
                vec![two_form(4, 0, 1, 1.0), two_form(4, 2, 3, 2.0)],
                vec![two_form(4, 1, 2, 3.0), DiffForm::zero(4)],
            ],
        )
        .unwrap();
        let c0 = Complex64::new(3.0, 1.0);
        let result = insert_in_polynomial(&matrix, &[c0]).unwrap();
        assert_eq!(result, FormMatrix::identity(2, 4).scale(c0));
    }

    #[test]
    fn linear_and_quadratic_terms() {
        let omega = two_form(4, 0, 1, 1.0);
        let eta = two_form(4, 2, 3, 1.0);
        let matrix = FormMatrix::from_rows(4, vec![vec![&omega + &eta]]).unwrap();
        let one = Complex64::new(1.0, 0.0);
        let result = insert_in_polynomial(&matrix, &[one, one, one]).unwrap();
        let entry = result.get(0, 0).unwrap();
        assert_eq!(entry.scalar_part(), one);
        let top = DiffForm::monomial(4, &[0, 1, 2, 3], Complex64::new(2.0, 0.0)).unwrap();
        let expected = &(&DiffForm::one(4) + &(&omega + &eta)) + &top;
        assert!(entry.max_abs_diff(&expected) < 1e-15);
    }

    #[test]
    fn empty_coefficients_give_zero() {
        let matrix = FormMatrix::identity(2, 2);
        assert_eq!(
            insert_in_polynomial(&matrix, &[]).unwrap(),
            FormMatrix::zeros(2, 2)
        );
    }
}
