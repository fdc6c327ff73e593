use nalgebra::Normed;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use cw_series::ZERO_TOL;

use crate::blade::{Blade, MAX_DIM};
use crate::Complex64;

fn forms_error(code: &str, message: impl Into<String>) -> CwError {
    CwError::Forms(ErrorInfo::new(code, message))
}

/// Inhomogeneous complex differential form on a `dim`-dimensional manifold,
/// evaluated at a point and expanded in the coordinate coframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FormRepr", from = "FormRepr")]
pub struct DiffForm {
    dim: usize,
    terms: BTreeMap<Blade, Complex64>,
}

#[derive(Serialize, Deserialize)]
struct FormTerm {
    blade: u64,
    re: f64,
    im: f64,
}

#[derive(Serialize, Deserialize)]
struct FormRepr {
    dim: usize,
    terms: Vec<FormTerm>,
}

impl From<DiffForm> for FormRepr {
    fn from(form: DiffForm) -> Self {
        FormRepr {
            dim: form.dim,
            terms: form
                .terms
                .iter()
                .map(|(blade, c)| FormTerm {
                    blade: blade.mask(),
                    re: c.re,
                    im: c.im,
                })
                .collect(),
        }
    }
}

impl From<FormRepr> for DiffForm {
    fn from(repr: FormRepr) -> Self {
        let mut form = DiffForm::zero(repr.dim);
        for term in repr.terms {
            form.accumulate(Blade::from_mask(term.blade), Complex64::new(term.re, term.im));
        }
        form
    }
}

impl DiffForm {
    /// The zero form.
    pub fn zero(dim: usize) -> Self {
        Self {
            dim,
            terms: BTreeMap::new(),
        }
    }

    /// A constant function (0-form).
    pub fn scalar(dim: usize, value: Complex64) -> Self {
        let mut form = Self::zero(dim);
        form.accumulate(Blade::SCALAR, value);
        form
    }

    /// The constant function 1.
    pub fn one(dim: usize) -> Self {
        Self::scalar(dim, Complex64::new(1.0, 0.0))
    }

    /// Monomial `value * dx^{i1} ∧ … ∧ dx^{ik}` for zero-based, possibly unsorted indices.
    pub fn monomial(dim: usize, indices: &[usize], value: Complex64) -> Result<Self, CwError> {
        if dim > MAX_DIM {
            return Err(CwError::Forms(
                ErrorInfo::new("dimension-limit", "manifold dimension exceeds the blade width")
                    .with_context("dim", dim),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= dim) {
            return Err(CwError::Forms(
                ErrorInfo::new("blade-range", "coframe index out of range")
                    .with_context("index", bad)
                    .with_context("dim", dim),
            ));
        }
        let mut form = Self::zero(dim);
        if let Some((blade, sign)) = Blade::from_indices(indices) {
            form.accumulate(blade, value * sign);
        }
        Ok(form)
    }

    /// Dimension of the underlying manifold.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coefficient of a basis blade.
    pub fn coefficient(&self, blade: Blade) -> Complex64 {
        self.terms
            .get(&blade)
            .copied()
            .unwrap_or_else(|| Complex64::new(0.0, 0.0))
    }

    /// Non-zero terms in blade order.
    pub fn terms(&self) -> impl Iterator<Item = (Blade, Complex64)> + '_ {
        self.terms.iter().map(|(blade, c)| (*blade, *c))
    }

    /// Coefficient of the empty blade.
    pub fn scalar_part(&self) -> Complex64 {
        self.coefficient(Blade::SCALAR)
    }

    /// Whether every stored coefficient is negligible.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Degrees carrying at least one term, ascending.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees: Vec<usize> = self.terms.keys().map(Blade::degree).collect();
        degrees.sort_unstable();
        degrees.dedup();
        degrees
    }

    /// True when every term has even degree, so the form is central.
    pub fn is_even(&self) -> bool {
        self.terms.keys().all(|blade| blade.degree() % 2 == 0)
    }

    /// Homogeneous component of degree `k`.
    pub fn homogeneous(&self, k: usize) -> Self {
        Self {
            dim: self.dim,
            terms: self
                .terms
                .iter()
                .filter(|(blade, _)| blade.degree() == k)
                .map(|(blade, c)| (*blade, *c))
                .collect(),
        }
    }

    /// Multiplies by a scalar.
    pub fn scale(&self, factor: Complex64) -> Self {
        let mut out = Self::zero(self.dim);
        for (blade, c) in &self.terms {
            out.accumulate(*blade, *c * factor);
        }
        out
    }

    /// Drops coefficients whose magnitude is at most `tol`.
    pub fn prune(&self, tol: f64) -> Self {
        Self {
            dim: self.dim,
            terms: self
                .terms
                .iter()
                .filter(|(_, c)| c.norm() > tol)
                .map(|(blade, c)| (*blade, *c))
                .collect(),
        }
    }

    /// Largest coefficient magnitude of `self - other`.
    pub fn max_abs_diff(&self, other: &DiffForm) -> f64 {
        (self - other)
            .terms
            .values()
            .map(|c| c.norm())
            .fold(0.0, f64::max)
    }

    /// Wedge product `self ∧ other`.
    pub fn wedge(&self, other: &DiffForm) -> Self {
        let mut out = Self::zero(self.dim.max(other.dim));
        for (a, ca) in &self.terms {
            for (b, cb) in &other.terms {
                if let Some((blade, sign)) = a.wedge(*b) {
                    out.accumulate(blade, *ca * *cb * sign);
                }
            }
        }
        out
    }

    /// Checks that the form lives on a manifold of dimension `dim`.
    pub fn ensure_dim(&self, dim: usize) -> Result<(), CwError> {
        match self.terms.keys().map(Blade::span).max() {
            Some(span) if span > dim => Err(CwError::Forms(
                ErrorInfo::new("dimension-mismatch", "form uses coframe indices beyond the manifold")
                    .with_context("span", span)
                    .with_context("dim", dim),
            )),
            _ if self.dim != dim => Err(forms_error(
                "dimension-mismatch",
                format!("form declared on dimension {} instead of {dim}", self.dim),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn accumulate(&mut self, blade: Blade, value: Complex64) {
        let entry = self
            .terms
            .entry(blade)
            .or_insert_with(|| Complex64::new(0.0, 0.0));
        *entry += value;
        if entry.norm() <= ZERO_TOL {
            self.terms.remove(&blade);
        }
    }
}

fn fmt_coefficient(value: Complex64) -> String {
    if value.im == 0.0 {
        format!("{}", value.re)
    } else if value.re == 0.0 {
        format!("{}*I", value.im)
    } else {
        format!("({} + {}*I)", value.re, value.im)
    }
}

impl fmt::Display for DiffForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (idx, (blade, c)) in self.terms.iter().enumerate() {
            if idx > 0 {
                f.write_str(" + ")?;
            }
            f.write_str(&fmt_coefficient(*c))?;
            if blade.degree() > 0 {
                let factors: Vec<String> =
                    blade.indices().iter().map(|i| format!("dx{}", i + 1)).collect();
                write!(f, " {}", factors.join("/\\"))?;
            }
        }
        Ok(())
    }
}

impl Add for &DiffForm {
    type Output = DiffForm;

    fn add(self, rhs: &DiffForm) -> DiffForm {
        let mut out = self.clone();
        out.dim = self.dim.max(rhs.dim);
        for (blade, c) in &rhs.terms {
            out.accumulate(*blade, *c);
        }
        out
    }
}

impl Sub for &DiffForm {
    type Output = DiffForm;

    fn sub(self, rhs: &DiffForm) -> DiffForm {
        let mut out = self.clone();
        out.dim = self.dim.max(rhs.dim);
        for (blade, c) in &rhs.terms {
            out.accumulate(*blade, -*c);
        }
        out
    }
}

impl Neg for &DiffForm {
    type Output = DiffForm;

    fn neg(self) -> DiffForm {
        self.scale(Complex64::new(-1.0, 0.0))
    }
}

impl Mul for &DiffForm {
    type Output = DiffForm;

    fn mul(self, rhs: &DiffForm) -> DiffForm {
        self.wedge(rhs)
    }
}
