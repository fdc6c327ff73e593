use nalgebra::Normed;
use std::fmt;
use std::sync::Arc;

use cw_core::errors::CwError;

use crate::series::{Complex64, PowerSeries, ZERO_TOL};

/// Capability required from the defining function of a characteristic class.
///
/// Implementors must be analytic at zero; `taylor(order)` returns the
/// expansion at `x = 0` truncated after `x^order`.
pub trait AnalyticFunction: fmt::Debug + Send + Sync {
    /// Taylor expansion at zero up to and including `x^order`.
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError>;

    /// Human readable expression, e.g. `x + 1`.
    fn describe(&self) -> String;
}

fn inverse_factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc / k as f64)
}

fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

/// Polynomial with complex coefficients, constant term first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<Complex64>,
}

impl Polynomial {
    /// Creates a polynomial from complex coefficients.
    pub fn new(coeffs: Vec<Complex64>) -> Self {
        Self { coeffs }
    }

    /// Creates a polynomial from real coefficients.
    pub fn from_real(coeffs: &[f64]) -> Self {
        Self::new(coeffs.iter().map(|&c| real(c)).collect())
    }

    /// `1 + x`, the defining function of Chern and Pontryagin classes.
    pub fn one_plus_x() -> Self {
        Self::from_real(&[1.0, 1.0])
    }

    /// `x`, the defining function of the Euler class.
    pub fn identity() -> Self {
        Self::from_real(&[0.0, 1.0])
    }

    /// Coefficients, constant term first.
    pub fn coefficients(&self) -> &[Complex64] {
        &self.coeffs
    }
}

fn format_scalar(value: Complex64) -> String {
    let fmt_real = |v: f64| {
        if v.fract() == 0.0 && v.abs() < 1e15 {
            format!("{}", v as i64)
        } else {
            format!("{v}")
        }
    };
    if value.im == 0.0 {
        fmt_real(value.re)
    } else if value.re == 0.0 {
        format!("{}*I", fmt_real(value.im))
    } else {
        format!("({} + {}*I)", fmt_real(value.re), fmt_real(value.im))
    }
}

impl AnalyticFunction for Polynomial {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        Ok(PowerSeries::from_coefficients(&self.coeffs, order))
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        for (power, coeff) in self.coeffs.iter().enumerate().rev() {
            if coeff.norm() <= ZERO_TOL {
                continue;
            }
            let negative = coeff.im == 0.0 && coeff.re < 0.0;
            let magnitude = if negative { -*coeff } else { *coeff };
            if out.is_empty() {
                if negative {
                    out.push('-');
                }
            } else {
                out.push_str(if negative { " - " } else { " + " });
            }
            let unit = magnitude == real(1.0);
            let monomial = match power {
                0 => String::new(),
                1 => "x".to_string(),
                p => format!("x^{p}"),
            };
            if power == 0 {
                out.push_str(&format_scalar(magnitude));
            } else if unit {
                out.push_str(&monomial);
            } else {
                out.push_str(&format!("{}*{monomial}", format_scalar(magnitude)));
            }
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }
}

/// `e^x`, the defining function of the Chern character.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExponentialFunction;

impl AnalyticFunction for ExponentialFunction {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        Ok(PowerSeries::exponential(order))
    }

    fn describe(&self) -> String {
        "e^x".to_string()
    }
}

/// `x / (1 - e^(-x))`, the defining function of the Todd class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToddFunction;

impl AnalyticFunction for ToddFunction {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        // (1 - e^(-x)) / x = sum (-1)^k x^k / (k+1)!
        let denominator = PowerSeries::from_fn(order, |k| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            real(sign * inverse_factorial(k + 1))
        });
        denominator.reciprocal()
    }

    fn describe(&self) -> String {
        "x/(1 - e^(-x))".to_string()
    }
}

/// `(sqrt(x)/2) / sinh(sqrt(x)/2)`, the defining function of the Â class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AHatFunction;

impl AnalyticFunction for AHatFunction {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        // sinh(t)/t with t^2 = x/4
        let denominator = PowerSeries::from_fn(order, |k| {
            real(0.25f64.powi(k as i32) * inverse_factorial(2 * k + 1))
        });
        denominator.reciprocal()
    }

    fn describe(&self) -> String {
        "1/2*sqrt(x)/sinh(1/2*sqrt(x))".to_string()
    }
}

/// `sqrt(x) / tanh(sqrt(x))`, the defining function of the Hirzebruch L class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HirzebruchFunction;

impl AnalyticFunction for HirzebruchFunction {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        let cosh = PowerSeries::from_fn(order, |k| real(inverse_factorial(2 * k)));
        let sinh_over = PowerSeries::from_fn(order, |k| real(inverse_factorial(2 * k + 1)));
        cosh.divide(&sinh_over)
    }

    fn describe(&self) -> String {
        "sqrt(x)/tanh(sqrt(x))".to_string()
    }
}

/// Analytic function given by a coefficient rule `k -> a_k`.
#[derive(Clone)]
pub struct SeriesFunction {
    label: String,
    term: Arc<dyn Fn(usize) -> Complex64 + Send + Sync>,
}

impl SeriesFunction {
    /// Creates a function from its label and Taylor coefficient rule.
    pub fn new(
        label: impl Into<String>,
        term: impl Fn(usize) -> Complex64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            term: Arc::new(term),
        }
    }
}

impl fmt::Debug for SeriesFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesFunction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl AnalyticFunction for SeriesFunction {
    fn taylor(&self, order: usize) -> Result<PowerSeries, CwError> {
        Ok(PowerSeries::from_fn(order, |k| (self.term)(k)))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
