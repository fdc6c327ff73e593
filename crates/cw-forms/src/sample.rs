use cw_core::errors::CwError;
use cw_core::RngHandle;

use crate::form::DiffForm;
use crate::matrix::FormMatrix;
use crate::Complex64;

fn random_two_form(dim: usize, rng: &mut RngHandle, complex: bool) -> Result<DiffForm, CwError> {
    let mut form = DiffForm::zero(dim);
    for i in 0..dim {
        for j in (i + 1)..dim {
            let re = rng.next_signed_unit();
            let im = if complex { rng.next_signed_unit() } else { 0.0 };
            form = &form + &DiffForm::monomial(dim, &[i, j], Complex64::new(re, im))?;
        }
    }
    Ok(form)
}

/// Seeded `rank × rank` matrix of complex 2-forms on a `dim`-manifold.
pub fn random_curvature(rank: usize, dim: usize, rng: &mut RngHandle) -> Result<FormMatrix, CwError> {
    let entries = (0..rank * rank)
        .map(|_| random_two_form(dim, rng, true))
        .collect::<Result<Vec<_>, _>>()?;
    FormMatrix::new(rank, dim, entries)
}

/// Seeded real skew-symmetric `rank × rank` matrix of 2-forms, as produced by a metric connection.
pub fn random_skew_curvature(
    rank: usize,
    dim: usize,
    rng: &mut RngHandle,
) -> Result<FormMatrix, CwError> {
    let mut matrix = FormMatrix::zeros(rank, dim);
    for i in 0..rank {
        for j in (i + 1)..rank {
            let form = random_two_form(dim, rng, false)?;
            matrix.set(j, i, -&form)?;
            matrix.set(i, j, form)?;
        }
    }
    Ok(matrix)
}
