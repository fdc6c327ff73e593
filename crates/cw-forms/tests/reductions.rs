use nalgebra::Normed;
use cw_core::RngHandle;
use cw_forms::{
    random_curvature, random_skew_curvature, Complex64, DiffForm, FormMatrix,
};
use nalgebra::DMatrix;
use proptest::prelude::*;

fn scalar_matrix(size: usize, values: &[(f64, f64)]) -> FormMatrix {
    let entries = values
        .iter()
        .map(|&(re, im)| DiffForm::scalar(1, Complex64::new(re, im)))
        .collect();
    FormMatrix::new(size, 1, entries).unwrap()
}

proptest! {
    #[test]
    fn determinant_matches_nalgebra(
        size in 1usize..5,
        values in prop::collection::vec((-2.0f64..2.0, -2.0f64..2.0), 16),
    ) {
        let matrix = scalar_matrix(size, &values[..size * size]);
        let expected = matrix.scalar_part().determinant();
        let got = matrix.determinant().unwrap().scalar_part();
        prop_assert!((got - expected).norm() < 1e-8 * (1.0 + expected.norm()));
    }

    #[test]
    fn pfaffian_squares_to_determinant(seed in any::<u64>(), half in 1usize..3) {
        let mut rng = RngHandle::from_seed(seed);
        let rank = 2 * half;
        let matrix = random_skew_curvature(rank, 2 * rank, &mut rng).unwrap();
        let pf = matrix.pfaffian().unwrap();
        let det = matrix.determinant().unwrap();
        prop_assert!(pf.wedge(&pf).max_abs_diff(&det) < 1e-9);
    }
}

#[test]
fn determinant_is_gauge_invariant() {
    let mut rng = RngHandle::from_seed(11);
    let curvature = random_curvature(3, 6, &mut rng).unwrap();
    let g = DMatrix::from_row_slice(
        3,
        3,
        &[
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(3.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
        ],
    );
    let moved = curvature.gauge_transform(&g).unwrap();
    let shifted = FormMatrix::identity(3, 6).add(&curvature).unwrap();
    let shifted_moved = FormMatrix::identity(3, 6).add(&moved).unwrap();
    let det = shifted.determinant().unwrap();
    let det_moved = shifted_moved.determinant().unwrap();
    assert!(det.max_abs_diff(&det_moved) < 1e-9);
    assert!(curvature.trace().max_abs_diff(&moved.trace()) < 1e-9);
}

#[test]
fn determinant_of_two_by_two_two_forms() {
    let dx01 = DiffForm::monomial(4, &[0, 1], Complex64::new(1.0, 0.0)).unwrap();
    let dx23 = DiffForm::monomial(4, &[2, 3], Complex64::new(1.0, 0.0)).unwrap();
    let matrix = FormMatrix::from_rows(
        4,
        vec![
            vec![dx01.clone(), DiffForm::zero(4)],
            vec![DiffForm::zero(4), dx23.clone()],
        ],
    )
    .unwrap();
    let det = matrix.determinant().unwrap();
    assert!(det.max_abs_diff(&dx01.wedge(&dx23)) < 1e-12);
    assert_eq!(det.degrees(), vec![4]);
}

#[test]
fn gauge_transform_rejects_singular_matrices() {
    let curvature = FormMatrix::identity(2, 2);
    let g = DMatrix::from_element(2, 2, Complex64::new(1.0, 0.0));
    assert_eq!(
        curvature.gauge_transform(&g).unwrap_err().code(),
        "singular-gauge"
    );
}
