use nalgebra::Normed;
use cw_series::{
    AHatFunction, AnalyticFunction, Complex64, ExponentialFunction, HirzebruchFunction,
    PowerSeries, ToddFunction,
};
use proptest::prelude::*;

fn assert_coeffs(series: &PowerSeries, expected: &[f64]) {
    for (k, value) in expected.iter().enumerate() {
        let got = series.coefficient(k);
        assert!(
            (got - Complex64::new(*value, 0.0)).norm() < 1e-12,
            "coefficient {k}: got {got}, expected {value}"
        );
    }
}

#[test]
fn todd_expansion() {
    let series = ToddFunction.taylor(4).unwrap();
    assert_coeffs(&series, &[1.0, 0.5, 1.0 / 12.0, 0.0, -1.0 / 720.0]);
}

#[test]
fn hirzebruch_expansion() {
    let series = HirzebruchFunction.taylor(3).unwrap();
    assert_coeffs(&series, &[1.0, 1.0 / 3.0, -1.0 / 45.0, 2.0 / 945.0]);
}

#[test]
fn ahat_expansion() {
    let series = AHatFunction.taylor(2).unwrap();
    assert_coeffs(&series, &[1.0, -1.0 / 24.0, 7.0 / 5760.0]);
}

#[test]
fn exponential_expansion() {
    let series = ExponentialFunction.taylor(4).unwrap();
    assert_coeffs(&series, &[1.0, 1.0, 0.5, 1.0 / 6.0, 1.0 / 24.0]);
}

fn arb_unit_series() -> impl Strategy<Value = PowerSeries> {
    prop::collection::vec(-2.0f64..2.0, 1..6).prop_map(|tail| {
        let mut coeffs = vec![1.0];
        coeffs.extend(tail);
        let order = coeffs.len() - 1;
        PowerSeries::from_real(&coeffs, order)
    })
}

proptest! {
    #[test]
    fn reciprocal_is_multiplicative_inverse(series in arb_unit_series()) {
        let product = &series * &series.reciprocal().unwrap();
        let one = PowerSeries::one(series.order());
        for k in 0..=series.order() {
            prop_assert!((product.coefficient(k) - one.coefficient(k)).norm() < 1e-9);
        }
    }

    #[test]
    fn sqrt_squares_back(series in arb_unit_series()) {
        let root = series.sqrt().unwrap();
        let square = &root * &root;
        for k in 0..=series.order() {
            prop_assert!((square.coefficient(k) - series.coefficient(k)).norm() < 1e-9);
        }
    }

    #[test]
    fn odd_and_even_parts_sum_to_series(series in arb_unit_series()) {
        let sum = &series.odd_part() + &series.even_part();
        prop_assert_eq!(sum, series);
    }
}
