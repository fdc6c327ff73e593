use std::collections::HashMap;

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use nalgebra::DMatrix;

use crate::form::DiffForm;
use crate::Complex64;

fn reduction_error(code: &str, message: impl Into<String>) -> CwError {
    CwError::Reduction(ErrorInfo::new(code, message))
}

/// Square matrix of differential forms stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormMatrix {
    size: usize,
    dim: usize,
    entries: Vec<DiffForm>,
}

impl FormMatrix {
    /// Builds a matrix from row-major entries, all living on a `dim`-manifold.
    pub fn new(size: usize, dim: usize, entries: Vec<DiffForm>) -> Result<Self, CwError> {
        if entries.len() != size * size {
            return Err(CwError::Forms(
                ErrorInfo::new("matrix-shape", "entry count does not match a square matrix")
                    .with_context("size", size)
                    .with_context("entries", entries.len()),
            ));
        }
        for entry in &entries {
            entry.ensure_dim(dim)?;
        }
        Ok(Self { size, dim, entries })
    }

    /// Builds a matrix from nested rows.
    pub fn from_rows(dim: usize, rows: Vec<Vec<DiffForm>>) -> Result<Self, CwError> {
        let size = rows.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != size) {
            return Err(CwError::Forms(
                ErrorInfo::new("matrix-shape", "rows must all have the matrix size")
                    .with_context("size", size)
                    .with_context("row_len", bad.len()),
            ));
        }
        Self::new(size, dim, rows.into_iter().flatten().collect())
    }

    /// Matrix of zero forms.
    pub fn zeros(size: usize, dim: usize) -> Self {
        Self {
            size,
            dim,
            entries: vec![DiffForm::zero(dim); size * size],
        }
    }

    /// Identity matrix.
    pub fn identity(size: usize, dim: usize) -> Self {
        let mut matrix = Self::zeros(size, dim);
        for i in 0..size {
            matrix.entries[i * size + i] = DiffForm::one(dim);
        }
        matrix
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Dimension of the manifold the entries live on.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry at `(row, col)`, zero-based.
    pub fn get(&self, row: usize, col: usize) -> Option<&DiffForm> {
        if row < self.size && col < self.size {
            self.entries.get(row * self.size + col)
        } else {
            None
        }
    }

    /// Replaces the entry at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: DiffForm) -> Result<(), CwError> {
        if row >= self.size || col >= self.size {
            return Err(CwError::Forms(
                ErrorInfo::new("matrix-index", "entry index outside the matrix")
                    .with_context("row", row)
                    .with_context("col", col)
                    .with_context("size", self.size),
            ));
        }
        value.ensure_dim(self.dim)?;
        self.entries[row * self.size + col] = value;
        Ok(())
    }

    /// Multiplies every entry by a scalar, leaving `self` untouched.
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            size: self.size,
            dim: self.dim,
            entries: self.entries.iter().map(|e| e.scale(factor)).collect(),
        }
    }

    /// Entry-wise sum.
    pub fn add(&self, other: &FormMatrix) -> Result<Self, CwError> {
        self.ensure_same_shape(other)?;
        Ok(Self {
            size: self.size,
            dim: self.dim,
            entries: self
                .entries
                .iter()
                .zip(&other.entries)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Matrix product with entries multiplied by the wedge product.
    pub fn mul(&self, other: &FormMatrix) -> Result<Self, CwError> {
        self.ensure_same_shape(other)?;
        let n = self.size;
        let mut entries = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                let mut acc = DiffForm::zero(self.dim);
                for k in 0..n {
                    let lhs = &self.entries[row * n + k];
                    let rhs = &other.entries[k * n + col];
                    if lhs.is_zero() || rhs.is_zero() {
                        continue;
                    }
                    acc = &acc + &lhs.wedge(rhs);
                }
                entries.push(acc);
            }
        }
        Ok(Self {
            size: n,
            dim: self.dim,
            entries,
        })
    }

    /// Transposed matrix.
    pub fn transpose(&self) -> Self {
        let n = self.size;
        let mut entries = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                entries.push(self.entries[col * n + row].clone());
            }
        }
        Self {
            size: n,
            dim: self.dim,
            entries,
        }
    }

    /// Whether `A^T = -A` up to `tol`.
    pub fn is_skew_symmetric(&self, tol: f64) -> bool {
        let n = self.size;
        (0..n).all(|row| {
            (row..n).all(|col| {
                let sum = &self.entries[row * n + col] + &self.entries[col * n + row];
                sum.max_abs_diff(&DiffForm::zero(self.dim)) <= tol
            })
        })
    }

    /// True when every entry has only even-degree terms.
    pub fn is_even(&self) -> bool {
        self.entries.iter().all(DiffForm::is_even)
    }

    /// Scalar (0-form) parts as a dense nalgebra matrix.
    pub fn scalar_part(&self) -> DMatrix<Complex64> {
        DMatrix::from_fn(self.size, self.size, |row, col| {
            self.entries[row * self.size + col].scalar_part()
        })
    }

    /// Change of frame `g⁻¹ A g` by a constant invertible matrix `g`.
    pub fn gauge_transform(&self, g: &DMatrix<Complex64>) -> Result<Self, CwError> {
        if g.nrows() != self.size || g.ncols() != self.size {
            return Err(CwError::Forms(
                ErrorInfo::new("matrix-shape", "gauge matrix must match the matrix size")
                    .with_context("size", self.size)
                    .with_context("gauge_rows", g.nrows()),
            ));
        }
        let inverse = g.clone().try_inverse().ok_or_else(|| {
            CwError::Forms(ErrorInfo::new("singular-gauge", "gauge matrix is not invertible"))
        })?;
        let lift = |m: &DMatrix<Complex64>| {
            let entries = (0..self.size)
                .flat_map(|row| (0..self.size).map(move |col| (row, col)))
                .map(|(row, col)| DiffForm::scalar(self.dim, m[(row, col)]))
                .collect();
            Self {
                size: self.size,
                dim: self.dim,
                entries,
            }
        };
        lift(&inverse).mul(self)?.mul(&lift(g))
    }

    /// Sum of the diagonal entries.
    pub fn trace(&self) -> DiffForm {
        (0..self.size).fold(DiffForm::zero(self.dim), |acc, i| {
            &acc + &self.entries[i * self.size + i]
        })
    }

    /// Determinant over the commutative algebra of even forms.
    ///
    /// Uses the Newton identities `k e_k = Σ_{i=1..k} (-1)^{i-1} e_{k-i} p_i`
    /// with power sums `p_i = tr(A^i)`, which only divide by integers.
    pub fn determinant(&self) -> Result<DiffForm, CwError> {
        self.ensure_even("determinant")?;
        let n = self.size;
        let mut power_sums = Vec::with_capacity(n);
        let mut power = self.clone();
        for i in 0..n {
            if i > 0 {
                power = power.mul(self)?;
            }
            power_sums.push(power.trace());
        }
        let mut elementary = vec![DiffForm::one(self.dim)];
        for k in 1..=n {
            let mut acc = DiffForm::zero(self.dim);
            for i in 1..=k {
                let term = elementary[k - i].wedge(&power_sums[i - 1]);
                acc = if i % 2 == 1 { &acc + &term } else { &acc - &term };
            }
            elementary.push(acc.scale(Complex64::new(1.0 / k as f64, 0.0)));
        }
        Ok(elementary.pop().unwrap_or_else(|| DiffForm::one(self.dim)))
    }

    /// Pfaffian of an even-sized matrix of even forms.
    ///
    /// Skew-symmetry is not checked; only the strict upper triangle is read.
    pub fn pfaffian(&self) -> Result<DiffForm, CwError> {
        if self.size % 2 != 0 {
            return Err(CwError::Reduction(
                ErrorInfo::new("odd-pfaffian", "the Pfaffian needs an even-sized matrix")
                    .with_context("size", self.size),
            ));
        }
        if self.size > 64 {
            return Err(reduction_error(
                "size-limit",
                "Pfaffian expansion supports at most 64 rows",
            ));
        }
        self.ensure_even("pfaffian")?;
        let full = if self.size == 64 {
            u64::MAX
        } else {
            (1u64 << self.size) - 1
        };
        let mut memo = HashMap::new();
        Ok(self.pfaffian_of(full, &mut memo))
    }

    fn pfaffian_of(&self, mask: u64, memo: &mut HashMap<u64, DiffForm>) -> DiffForm {
        if mask == 0 {
            return DiffForm::one(self.dim);
        }
        if let Some(hit) = memo.get(&mask) {
            return hit.clone();
        }
        let first = mask.trailing_zeros() as usize;
        let rest = mask & !(1u64 << first);
        let mut acc = DiffForm::zero(self.dim);
        let mut remaining = rest;
        let mut position = 0usize;
        while remaining != 0 {
            let j = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            let entry = &self.entries[first * self.size + j];
            if !entry.is_zero() {
                let minor = self.pfaffian_of(rest & !(1u64 << j), memo);
                let term = entry.wedge(&minor);
                acc = if position % 2 == 0 { &acc + &term } else { &acc - &term };
            }
            position += 1;
        }
        memo.insert(mask, acc.clone());
        acc
    }

    fn ensure_even(&self, operation: &str) -> Result<(), CwError> {
        if self.is_even() {
            return Ok(());
        }
        Err(CwError::Reduction(
            ErrorInfo::new(
                "odd-degree-entry",
                "entries must have even degree so that they commute",
            )
            .with_context("operation", operation),
        ))
    }

    fn ensure_same_shape(&self, other: &FormMatrix) -> Result<(), CwError> {
        if self.size == other.size && self.dim == other.dim {
            return Ok(());
        }
        Err(CwError::Forms(
            ErrorInfo::new("dimension-mismatch", "matrices differ in size or manifold")
                .with_context("lhs", format!("{}x{} on dim {}", self.size, self.size, self.dim))
                .with_context("rhs", format!("{}x{} on dim {}", other.size, other.size, other.dim)),
        ))
    }
}
