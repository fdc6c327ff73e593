use nalgebra::{ComplexField, Normed};
use std::ops::{Add, Mul, Neg, Sub};

use cw_core::errors::{CwError, ErrorInfo};

/// Complex scalar used for every coefficient in the engine.
pub type Complex64 = nalgebra::Complex<f64>;

/// Magnitude below which a coefficient is treated as an exact zero.
pub const ZERO_TOL: f64 = 1e-14;

fn series_error(code: &str, message: impl Into<String>) -> CwError {
    CwError::Series(ErrorInfo::new(code, message))
}

fn zero() -> Complex64 {
    Complex64::new(0.0, 0.0)
}

fn one() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

/// Power series in one variable truncated after the `x^order` term.
///
/// Binary operations work at the smaller of the two truncation orders, so the
/// result never claims more precision than its inputs carry.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSeries {
    coeffs: Vec<Complex64>,
}

impl PowerSeries {
    /// Series whose coefficients are all zero.
    pub fn zero(order: usize) -> Self {
        Self {
            coeffs: vec![zero(); order + 1],
        }
    }

    /// Constant series `1`.
    pub fn one(order: usize) -> Self {
        let mut series = Self::zero(order);
        series.coeffs[0] = one();
        series
    }

    /// The expansion variable `x`.
    pub fn variable(order: usize) -> Self {
        let mut series = Self::zero(order);
        if order >= 1 {
            series.coeffs[1] = one();
        }
        series
    }

    /// Builds a series from leading coefficients, padding with zeros or truncating to `order`.
    pub fn from_coefficients(coeffs: &[Complex64], order: usize) -> Self {
        let mut series = Self::zero(order);
        for (slot, value) in series.coeffs.iter_mut().zip(coeffs) {
            *slot = *value;
        }
        series
    }

    /// Builds a series from real leading coefficients.
    pub fn from_real(coeffs: &[f64], order: usize) -> Self {
        let complex: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect();
        Self::from_coefficients(&complex, order)
    }

    /// Builds the series `Σ term(k) x^k` for `k = 0..=order`.
    pub fn from_fn(order: usize, term: impl Fn(usize) -> Complex64) -> Self {
        Self {
            coeffs: (0..=order).map(term).collect(),
        }
    }

    /// `e^x`.
    pub fn exponential(order: usize) -> Self {
        let mut coeffs = Vec::with_capacity(order + 1);
        let mut value = 1.0;
        for k in 0..=order {
            if k > 0 {
                value /= k as f64;
            }
            coeffs.push(Complex64::new(value, 0.0));
        }
        Self { coeffs }
    }

    /// Truncation order of the series.
    pub fn order(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Coefficient of `x^k`; zero past the truncation order.
    pub fn coefficient(&self, k: usize) -> Complex64 {
        self.coeffs.get(k).copied().unwrap_or_else(zero)
    }

    /// All retained coefficients, constant term first.
    pub fn coefficients(&self) -> &[Complex64] {
        &self.coeffs
    }

    /// Coefficients with trailing (near) zeros dropped; at least one entry is kept.
    pub fn dense_coefficients(&self, tol: f64) -> Vec<Complex64> {
        let mut coeffs = self.coeffs.clone();
        while coeffs.len() > 1 && coeffs.last().map_or(false, |c| c.norm() <= tol) {
            coeffs.pop();
        }
        coeffs
    }

    /// Drops every term above `x^order`.
    pub fn truncate(&self, order: usize) -> Self {
        Self::from_coefficients(&self.coeffs, order)
    }

    /// Multiplies every coefficient by `factor`.
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| *c * factor).collect(),
        }
    }

    /// Multiplicative inverse; the constant term must not vanish.
    pub fn reciprocal(&self) -> Result<Self, CwError> {
        let a0 = self.coeffs[0];
        if a0.norm() <= ZERO_TOL {
            return Err(series_error(
                "zero-constant-term",
                "series with vanishing constant term has no reciprocal",
            ));
        }
        let inv = one() / a0;
        let mut out = vec![zero(); self.coeffs.len()];
        out[0] = inv;
        for n in 1..out.len() {
            let mut acc = zero();
            for k in 1..=n {
                acc += self.coeffs[k] * out[n - k];
            }
            out[n] = -acc * inv;
        }
        Ok(Self { coeffs: out })
    }

    /// Quotient `self / other`.
    pub fn divide(&self, other: &PowerSeries) -> Result<Self, CwError> {
        Ok(self * &other.reciprocal()?)
    }

    /// Principal square root; the constant term must not vanish.
    pub fn sqrt(&self) -> Result<Self, CwError> {
        let a0 = self.coeffs[0];
        if a0.norm() <= ZERO_TOL {
            return Err(CwError::Series(
                ErrorInfo::new(
                    "zero-constant-term",
                    "series with vanishing constant term has no analytic square root",
                )
                .with_hint("a real multiplicative class needs f(0) != 0"),
            ));
        }
        let b0 = a0.sqrt();
        let denom = b0 * 2.0;
        let mut out = vec![zero(); self.coeffs.len()];
        out[0] = b0;
        for n in 1..out.len() {
            let mut acc = self.coeffs[n];
            for k in 1..n {
                acc -= out[k] * out[n - k];
            }
            out[n] = acc / denom;
        }
        Ok(Self { coeffs: out })
    }

    /// Substitutes `x -> factor * x^power`, truncated to `order`.
    ///
    /// Fails when the series is too short to populate every requested term.
    pub fn substitute_monomial(
        &self,
        factor: Complex64,
        power: usize,
        order: usize,
    ) -> Result<Self, CwError> {
        if power == 0 {
            return Err(series_error(
                "order-mismatch",
                "substitution power must be positive",
            ));
        }
        let needed = order / power;
        if self.order() < needed {
            return Err(CwError::Series(
                ErrorInfo::new("order-mismatch", "series too short for substitution")
                    .with_context("available", self.order())
                    .with_context("needed", needed),
            ));
        }
        let mut out = Self::zero(order);
        let mut scale = one();
        for k in 0..=needed {
            out.coeffs[k * power] = self.coeffs[k] * scale;
            scale *= factor;
        }
        Ok(out)
    }

    /// Odd projection `(f(x) - f(-x)) / 2`.
    pub fn odd_part(&self) -> Self {
        Self {
            coeffs: self
                .coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| if k % 2 == 1 { *c } else { zero() })
                .collect(),
        }
    }

    /// Even projection `(f(x) + f(-x)) / 2`.
    pub fn even_part(&self) -> Self {
        Self {
            coeffs: self
                .coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| if k % 2 == 0 { *c } else { zero() })
                .collect(),
        }
    }

    /// Evaluates the truncated polynomial at `x` with Horner's rule.
    pub fn evaluate(&self, x: Complex64) -> Complex64 {
        self.coeffs.iter().rev().fold(zero(), |acc, c| acc * x + *c)
    }

    fn zip_with(&self, other: &PowerSeries, op: impl Fn(Complex64, Complex64) -> Complex64) -> Self {
        let order = self.order().min(other.order());
        Self::from_fn(order, |k| op(self.coeffs[k], other.coeffs[k]))
    }
}

impl Add for &PowerSeries {
    type Output = PowerSeries;

    fn add(self, rhs: &PowerSeries) -> PowerSeries {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &PowerSeries {
    type Output = PowerSeries;

    fn sub(self, rhs: &PowerSeries) -> PowerSeries {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for &PowerSeries {
    type Output = PowerSeries;

    fn mul(self, rhs: &PowerSeries) -> PowerSeries {
        let order = self.order().min(rhs.order());
        PowerSeries::from_fn(order, |n| {
            (0..=n).fold(zero(), |acc, k| acc + self.coeffs[k] * rhs.coeffs[n - k])
        })
    }
}

impl Neg for &PowerSeries {
    type Output = PowerSeries;

    fn neg(self) -> PowerSeries {
        self.scale(-one())
    }
}
