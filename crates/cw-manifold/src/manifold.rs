use std::collections::BTreeSet;

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use cw_core::DomainId;

/// Partial order on domains used to find minimal coverings.
pub trait DomainOrder {
    /// Whether `a ⊆ b`.
    fn is_subset(&self, a: DomainId, b: DomainId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DomainRecord {
    name: String,
    parent: Option<DomainId>,
}

/// Differentiable manifold together with the open subsets declared on it.
///
/// Subsets form a tree rooted at the manifold itself. Intersections between
/// incomparable subsets are declared explicitly and inherited by supersets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifold {
    name: String,
    latex_name: String,
    dim: usize,
    start_index: usize,
    domains: Vec<DomainRecord>,
    overlaps: BTreeSet<(DomainId, DomainId)>,
}

fn manifold_error(code: &str, message: impl Into<String>) -> CwError {
    CwError::Manifold(ErrorInfo::new(code, message))
}

impl Manifold {
    /// Creates a `dim`-dimensional manifold whose coordinate indices start at 1.
    pub fn new(dim: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            latex_name: name.clone(),
            domains: vec![DomainRecord {
                name: name.clone(),
                parent: None,
            }],
            name,
            dim,
            start_index: 1,
            overlaps: BTreeSet::new(),
        }
    }

    /// Overrides the first index of coordinate and bundle index ranges.
    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    /// Overrides the LaTeX name.
    pub fn with_latex_name(mut self, latex_name: impl Into<String>) -> Self {
        self.latex_name = latex_name.into();
        self
    }

    /// Manifold name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// LaTeX name.
    pub fn latex_name(&self) -> &str {
        &self.latex_name
    }

    /// Dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// First index of index ranges.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// The domain standing for the whole manifold.
    pub fn root(&self) -> DomainId {
        DomainId::from_raw(0)
    }

    /// Whether `domain` was declared on this manifold.
    pub fn contains(&self, domain: DomainId) -> bool {
        (domain.as_raw() as usize) < self.domains.len()
    }

    /// Name of a declared domain.
    pub fn domain_name(&self, domain: DomainId) -> Option<&str> {
        self.record(domain).map(|r| r.name.as_str())
    }

    /// Declares an open subset of `parent`. Domain names are unique on a
    /// manifold, the manifold's own name included.
    pub fn open_subset(
        &mut self,
        parent: DomainId,
        name: impl Into<String>,
    ) -> Result<DomainId, CwError> {
        self.ensure_domain(parent)?;
        let name = name.into();
        if self.domains.iter().any(|record| record.name == name) {
            return Err(CwError::Manifold(
                ErrorInfo::new("duplicate-domain", "a domain with this name already exists")
                    .with_context("name", &name)
                    .with_context("manifold", &self.name),
            ));
        }
        let id = DomainId::from_raw(self.domains.len() as u64);
        self.domains.push(DomainRecord {
            name,
            parent: Some(parent),
        });
        Ok(id)
    }

    /// Records that two domains have non-empty intersection.
    pub fn declare_overlap(&mut self, a: DomainId, b: DomainId) -> Result<(), CwError> {
        self.ensure_domain(a)?;
        self.ensure_domain(b)?;
        self.overlaps.insert((a.min(b), a.max(b)));
        Ok(())
    }

    /// Whether the two domains are known to intersect.
    pub fn intersects(&self, a: DomainId, b: DomainId) -> bool {
        if self.is_subset(a, b) || self.is_subset(b, a) {
            return true;
        }
        self.overlaps.iter().any(|&(x, y)| {
            (self.is_subset(x, a) && self.is_subset(y, b))
                || (self.is_subset(y, a) && self.is_subset(x, b))
        })
    }

    /// Human readable description, e.g. `2-dimensional differentiable manifold M`.
    pub fn description(&self) -> String {
        format!("{}-dimensional differentiable manifold {}", self.dim, self.name)
    }

    fn record(&self, domain: DomainId) -> Option<&DomainRecord> {
        self.domains.get(domain.as_raw() as usize)
    }

    fn ensure_domain(&self, domain: DomainId) -> Result<(), CwError> {
        if self.contains(domain) {
            Ok(())
        } else {
            Err(manifold_error(
                "unknown-domain",
                format!("domain {} is not declared on {}", domain.as_raw(), self.name),
            ))
        }
    }
}

impl DomainOrder for Manifold {
    fn is_subset(&self, a: DomainId, b: DomainId) -> bool {
        let mut cursor = Some(a);
        while let Some(current) = cursor {
            if current == b {
                return true;
            }
            cursor = self.record(current).and_then(|r| r.parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_follows_parent_chain() {
        let mut m = Manifold::new(2, "M");
        let u = m.open_subset(m.root(), "U").unwrap();
        let w = m.open_subset(u, "W").unwrap();
        let v = m.open_subset(m.root(), "V").unwrap();
        assert!(m.is_subset(w, m.root()));
        assert!(m.is_subset(w, u));
        assert!(!m.is_subset(u, w));
        assert!(!m.is_subset(u, v));
        assert_eq!(m.domain_name(w), Some("W"));
    }

    #[test]
    fn declared_overlaps_are_inherited_by_supersets() {
        let mut m = Manifold::new(2, "M");
        let u = m.open_subset(m.root(), "U").unwrap();
        let v = m.open_subset(m.root(), "V").unwrap();
        let w = m.open_subset(u, "W").unwrap();
        let z = m.open_subset(v, "Z").unwrap();
        assert!(!m.intersects(u, v));
        m.declare_overlap(w, z).unwrap();
        assert!(m.intersects(u, v));
        assert!(m.intersects(v, w));
        assert!(m.intersects(m.root(), u));
    }

    #[test]
    fn unknown_domains_are_rejected() {
        let mut m = Manifold::new(2, "M");
        let err = m.open_subset(DomainId::from_raw(9), "X").unwrap_err();
        assert_eq!(err.code(), "unknown-domain");
    }

    #[test]
    fn domain_names_are_unique() {
        let mut m = Manifold::new(2, "M");
        let u = m.open_subset(m.root(), "U").unwrap();
        let err = m.open_subset(u, "U").unwrap_err();
        assert_eq!(err.code(), "duplicate-domain");
        assert_eq!(m.open_subset(u, "M").unwrap_err().code(), "duplicate-domain");
        assert!(m.open_subset(u, "W").is_ok());
    }
}
