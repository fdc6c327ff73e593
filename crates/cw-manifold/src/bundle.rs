use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{DomainId, FieldType, FrameId};

use crate::manifold::Manifold;

/// Local frame (trivialization) of a vector bundle over a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Identifier, unique within the bundle.
    pub id: FrameId,
    /// Domain on which the frame is defined.
    pub domain: DomainId,
    /// Display name.
    pub name: String,
}

/// Distinguishes the tangent bundle from general vector bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleKind {
    /// Tangent bundle of the base manifold; affine connections apply.
    Tangent,
    /// Any other vector bundle; bundle connections apply.
    General,
}

/// Differentiable vector bundle over a manifold.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorBundle {
    name: String,
    latex_name: String,
    rank: usize,
    field: FieldType,
    kind: BundleKind,
    base: Arc<Manifold>,
    frames: Vec<Frame>,
}

impl VectorBundle {
    /// Creates a general vector bundle of the given rank and field.
    pub fn new(base: Arc<Manifold>, rank: usize, name: impl Into<String>, field: FieldType) -> Self {
        let name = name.into();
        Self {
            latex_name: name.clone(),
            name,
            rank,
            field,
            kind: BundleKind::General,
            base,
            frames: Vec::new(),
        }
    }

    /// Real tangent bundle `TM` of `base`.
    pub fn tangent(base: Arc<Manifold>) -> Self {
        let name = format!("T{}", base.name());
        let latex_name = format!("T{}", base.latex_name());
        Self {
            name,
            latex_name,
            rank: base.dim(),
            field: FieldType::Real,
            kind: BundleKind::Tangent,
            base,
            frames: Vec::new(),
        }
    }

    /// Overrides the LaTeX name.
    pub fn with_latex_name(mut self, latex_name: impl Into<String>) -> Self {
        self.latex_name = latex_name.into();
        self
    }

    /// Registers a local frame on `domain`.
    pub fn local_frame(
        &mut self,
        name: impl Into<String>,
        domain: DomainId,
    ) -> Result<FrameId, CwError> {
        if !self.base.contains(domain) {
            return Err(CwError::Manifold(
                ErrorInfo::new("unknown-domain", "frame domain is not declared on the base")
                    .with_context("domain", domain.as_raw())
                    .with_context("manifold", self.base.name()),
            ));
        }
        let id = FrameId::from_raw(self.frames.len() as u64);
        self.frames.push(Frame {
            id,
            domain,
            name: name.into(),
        });
        Ok(id)
    }

    /// Bundle name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// LaTeX name.
    pub fn latex_name(&self) -> &str {
        &self.latex_name
    }

    /// Fibre dimension.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Base field of the fibres.
    pub fn field_type(&self) -> FieldType {
        self.field
    }

    /// Tangent or general bundle.
    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    /// Whether this is the tangent bundle of its base.
    pub fn is_tangent(&self) -> bool {
        self.kind == BundleKind::Tangent
    }

    /// Base manifold.
    pub fn base(&self) -> &Arc<Manifold> {
        &self.base
    }

    /// Index range of the local trivialization, starting at the base's start index.
    pub fn irange(&self) -> Range<usize> {
        let start = self.base.start_index();
        start..start + self.rank
    }

    /// Registered frames in creation order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Looks up a frame by identifier.
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.as_raw() as usize)
    }
}

impl fmt::Display for VectorBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BundleKind::Tangent => write!(
                f,
                "Tangent bundle {} over the {}",
                self.name,
                self.base.description()
            ),
            BundleKind::General => write!(
                f,
                "Differentiable {} vector bundle {} -> {} of rank {} over the base space {}",
                self.field,
                self.name,
                self.base.name(),
                self.rank,
                self.base.description()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_bundle_takes_base_dimension() {
        let m = Arc::new(Manifold::new(4, "M"));
        let tm = VectorBundle::tangent(m);
        assert_eq!(tm.rank(), 4);
        assert_eq!(tm.field_type(), FieldType::Real);
        assert_eq!(tm.irange(), 1..5);
        assert_eq!(
            tm.to_string(),
            "Tangent bundle TM over the 4-dimensional differentiable manifold M"
        );
    }

    #[test]
    fn general_bundle_description() {
        let m = Arc::new(Manifold::new(2, "M"));
        let e = VectorBundle::new(m, 1, "E", FieldType::Complex);
        assert_eq!(
            e.to_string(),
            "Differentiable complex vector bundle E -> M of rank 1 over the base space \
             2-dimensional differentiable manifold M"
        );
    }

    #[test]
    fn frames_require_declared_domains() {
        let m = Arc::new(Manifold::new(2, "M"));
        let root = m.root();
        let mut e = VectorBundle::new(m, 2, "E", FieldType::Real);
        let frame = e.local_frame("e", root).unwrap();
        assert_eq!(e.frame(frame).map(|f| f.name.as_str()), Some("e"));
        let err = e.local_frame("f", DomainId::from_raw(5)).unwrap_err();
        assert_eq!(err.code(), "unknown-domain");
    }
}
