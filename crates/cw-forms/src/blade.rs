use serde::{Deserialize, Serialize};

/// Largest supported manifold dimension (one bit per coframe element).
pub const MAX_DIM: usize = 64;

/// Basis element `dx^{i1} ∧ … ∧ dx^{ik}` stored as a bitmask with `i1 < … < ik`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Blade(u64);

impl Blade {
    /// The empty blade, i.e. the constant function 1.
    pub const SCALAR: Blade = Blade(0);

    /// Creates a blade from its raw bitmask.
    pub fn from_mask(mask: u64) -> Self {
        Self(mask)
    }

    /// Raw bitmask.
    pub fn mask(&self) -> u64 {
        self.0
    }

    /// Number of coframe factors.
    pub fn degree(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Sorted zero-based coframe indices.
    pub fn indices(&self) -> Vec<usize> {
        (0..MAX_DIM).filter(|&i| self.0 >> i & 1 == 1).collect()
    }

    /// Highest coframe index used plus one, zero for the scalar blade.
    pub fn span(&self) -> usize {
        (u64::BITS - self.0.leading_zeros()) as usize
    }

    /// Builds a blade from unordered indices, returning it with the sign of the
    /// sorting permutation, or `None` when an index repeats.
    pub fn from_indices(indices: &[usize]) -> Option<(Blade, f64)> {
        let mut mask = 0u64;
        let mut inversions = 0usize;
        for (pos, &idx) in indices.iter().enumerate() {
            if idx >= MAX_DIM || mask >> idx & 1 == 1 {
                return None;
            }
            inversions += indices[..pos].iter().filter(|&&prev| prev > idx).count();
            mask |= 1 << idx;
        }
        let sign = if inversions % 2 == 0 { 1.0 } else { -1.0 };
        Some((Blade(mask), sign))
    }

    /// Wedge product of two blades with its reordering sign; `None` if they share a factor.
    pub fn wedge(self, other: Blade) -> Option<(Blade, f64)> {
        if self.0 & other.0 != 0 {
            return None;
        }
        let mut swaps = 0u32;
        let mut rest = other.0;
        while rest != 0 {
            let j = rest.trailing_zeros();
            swaps += self.0.checked_shr(j + 1).unwrap_or(0).count_ones();
            rest &= rest - 1;
        }
        let sign = if swaps % 2 == 0 { 1.0 } else { -1.0 };
        Some((Blade(self.0 | other.0), sign))
    }
}
