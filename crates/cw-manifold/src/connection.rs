use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{ConnectionId, FrameId};
use cw_forms::{DiffForm, FormMatrix};
use tracing::debug;

use crate::bundle::VectorBundle;

/// Kind of connection, which decides what it may be paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Affine connection on the tangent bundle.
    Affine,
    /// Connection on a general vector bundle.
    Bundle,
    /// Anything else (e.g. a connection on a principal bundle).
    Other,
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionKind::Affine => "affine",
            ConnectionKind::Bundle => "bundle",
            ConnectionKind::Other => "other",
        })
    }
}

/// Source of curvature 2-forms, indexed by bundle indices and local frame.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Kind of the connection.
    fn kind(&self) -> ConnectionKind;

    /// Display name, if any.
    fn name(&self) -> Option<&str>;

    /// LaTeX name, if any.
    fn latex_name(&self) -> Option<&str> {
        self.name()
    }

    /// Frames on which the connection is known.
    fn frames(&self) -> Vec<FrameId>;

    /// Curvature 2-form `Ω^i_j` with respect to `frame`; indices follow the bundle's `irange`.
    fn curvature_form(&self, i: usize, j: usize, frame: FrameId) -> Result<DiffForm, CwError>;
}

/// Connection given by explicit curvature matrices per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedConnection {
    name: Option<String>,
    latex_name: Option<String>,
    kind: ConnectionKind,
    indices: Range<usize>,
    dim: usize,
    curvature: BTreeMap<FrameId, FormMatrix>,
}

impl TabulatedConnection {
    /// Creates a connection of `kind` for `bundle` with no curvature data yet.
    pub fn new(kind: ConnectionKind, bundle: &VectorBundle, name: Option<String>) -> Self {
        Self {
            latex_name: name.clone(),
            name,
            kind,
            indices: bundle.irange(),
            dim: bundle.base().dim(),
            curvature: BTreeMap::new(),
        }
    }

    /// Affine connection on a tangent bundle.
    pub fn affine(bundle: &VectorBundle, name: impl Into<String>) -> Self {
        Self::new(ConnectionKind::Affine, bundle, Some(name.into()))
    }

    /// Bundle connection.
    pub fn bundle(bundle: &VectorBundle, name: impl Into<String>) -> Self {
        Self::new(ConnectionKind::Bundle, bundle, Some(name.into()))
    }

    /// Overrides the LaTeX name.
    pub fn with_latex_name(mut self, latex_name: impl Into<String>) -> Self {
        self.latex_name = Some(latex_name.into());
        self
    }

    /// Stores the full curvature matrix for `frame`.
    pub fn set_curvature_matrix(
        &mut self,
        frame: FrameId,
        matrix: FormMatrix,
    ) -> Result<(), CwError> {
        let rank = self.indices.len();
        if matrix.size() != rank || matrix.dim() != self.dim {
            return Err(CwError::Validation(
                ErrorInfo::new("matrix-shape", "curvature matrix does not fit the bundle")
                    .with_context("rank", rank)
                    .with_context("size", matrix.size())
                    .with_context("frame", frame.as_raw()),
            ));
        }
        self.curvature.insert(frame, matrix);
        Ok(())
    }

    /// Stores a single curvature form `Ω^i_j` for `frame`.
    pub fn set_curvature_form(
        &mut self,
        i: usize,
        j: usize,
        frame: FrameId,
        form: DiffForm,
    ) -> Result<(), CwError> {
        let (row, col) = self.offsets(i, j)?;
        let rank = self.indices.len();
        let dim = self.dim;
        self.curvature
            .entry(frame)
            .or_insert_with(|| FormMatrix::zeros(rank, dim))
            .set(row, col, form)
    }

    /// Stored curvature matrices in frame order.
    pub fn curvature_matrices(&self) -> impl Iterator<Item = (FrameId, &FormMatrix)> + '_ {
        self.curvature.iter().map(|(frame, matrix)| (*frame, matrix))
    }

    fn offsets(&self, i: usize, j: usize) -> Result<(usize, usize), CwError> {
        if !self.indices.contains(&i) || !self.indices.contains(&j) {
            return Err(CwError::Validation(
                ErrorInfo::new("index-range", "curvature index outside the bundle index range")
                    .with_context("i", i)
                    .with_context("j", j)
                    .with_context(
                        "range",
                        format!("{}..{}", self.indices.start, self.indices.end),
                    ),
            ));
        }
        Ok((i - self.indices.start, j - self.indices.start))
    }
}

impl Connection for TabulatedConnection {
    fn kind(&self) -> ConnectionKind {
        self.kind
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn latex_name(&self) -> Option<&str> {
        self.latex_name.as_deref()
    }

    fn frames(&self) -> Vec<FrameId> {
        self.curvature.keys().copied().collect()
    }

    fn curvature_form(&self, i: usize, j: usize, frame: FrameId) -> Result<DiffForm, CwError> {
        let (row, col) = self.offsets(i, j)?;
        let matrix = self.curvature.get(&frame).ok_or_else(|| {
            CwError::Manifold(
                ErrorInfo::new("unknown-frame", "no curvature known in this frame")
                    .with_context("frame", frame.as_raw()),
            )
        })?;
        Ok(matrix
            .get(row, col)
            .cloned()
            .unwrap_or_else(|| DiffForm::zero(self.dim)))
    }
}

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(0);

/// Owner of connections; hands out [`ConnectionId`] handles that are unique
/// across every arena in the process.
///
/// Cloning shares the registered connections together with their handles.
#[derive(Debug, Default, Clone)]
pub struct ConnectionArena {
    entries: BTreeMap<ConnectionId, Arc<dyn Connection>>,
}

impl ConnectionArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its handle.
    pub fn insert(&mut self, connection: impl Connection + 'static) -> ConnectionId {
        self.insert_arc(Arc::new(connection))
    }

    /// Registers a shared connection and returns its handle.
    pub fn insert_arc(&mut self, connection: Arc<dyn Connection>) -> ConnectionId {
        let id = ConnectionId::from_raw(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed));
        debug!(
            connection = id.as_raw(),
            kind = %connection.kind(),
            "registered connection"
        );
        self.entries.insert(id, connection);
        id
    }

    /// Resolves a handle.
    pub fn get(&self, id: ConnectionId) -> Result<&dyn Connection, CwError> {
        self.entries
            .get(&id)
            .map(|c| c.as_ref())
            .ok_or_else(|| {
                CwError::Manifold(
                    ErrorInfo::new("unknown-connection", "connection handle not issued by this arena")
                        .with_context("connection", id.as_raw()),
                )
            })
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
