use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{ClassType, ConnectionId, FieldType, FrameId};
use cw_forms::{Complex64, FormMatrix, MixedForm};
use cw_manifold::{Connection, ConnectionArena, ConnectionKind, VectorBundle};
use cw_series::AnalyticFunction;
use tracing::{debug, info, warn};

use crate::coefficients::{extract_coefficients, truncation_order};
use crate::config::CharClassConfig;
use crate::frames::select_min_frames;
use crate::normalize::normalize_matrix;
use crate::polynomial::insert_in_polynomial;
use crate::reduction::reduce;

/// Curvature matrices keyed by the local frame they are expressed in.
pub type CurvatureMatrices = BTreeMap<FrameId, FormMatrix>;

/// Characteristic class of a vector bundle, evaluated on connections via
/// Chern-Weil theory.
///
/// The Taylor coefficients of the defining function are computed once at
/// construction. Forms are computed lazily per connection and kept until
/// [`CharacteristicClass::clear_cache`] is called.
pub struct CharacteristicClass {
    bundle: Arc<VectorBundle>,
    function: Arc<dyn AnalyticFunction>,
    class_type: ClassType,
    name: Option<String>,
    latex_name: Option<String>,
    coefficients: Vec<Complex64>,
    config: CharClassConfig,
    forms: Mutex<BTreeMap<ConnectionId, Arc<MixedForm>>>,
}

impl fmt::Debug for CharacteristicClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacteristicClass")
            .field("bundle", &self.bundle.name())
            .field("function", &self.function)
            .field("class_type", &self.class_type)
            .field("name", &self.name)
            .field("coefficients", &self.coefficients)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl CharacteristicClass {
    /// Builds a class from its defining function.
    ///
    /// The bundle must be real or complex, and Pfaffian classes need a real
    /// bundle of even rank. The LaTeX name falls back to `name`.
    pub fn new(
        bundle: Arc<VectorBundle>,
        function: Arc<dyn AnalyticFunction>,
        class_type: ClassType,
        name: Option<String>,
        latex_name: Option<String>,
    ) -> Result<Self, CwError> {
        let field = bundle.field_type();
        if field == FieldType::NeitherRealNorComplex {
            return Err(CwError::Validation(
                ErrorInfo::new(
                    "invalid-field",
                    "the vector bundle must either be real or complex",
                )
                .with_context("bundle", bundle.name()),
            ));
        }
        if class_type == ClassType::Pfaffian
            && (field != FieldType::Real || bundle.rank() % 2 != 0)
        {
            return Err(CwError::Validation(
                ErrorInfo::new(
                    "pfaffian-rank",
                    "Pfaffian classes can only be defined for real vector bundles of even rank",
                )
                .with_context("field", field)
                .with_context("rank", bundle.rank()),
            ));
        }
        let order = truncation_order(bundle.base().dim());
        let coefficients = extract_coefficients(function.as_ref(), class_type, field, order)?;
        let latex_name = latex_name.or_else(|| name.clone());
        Ok(Self {
            bundle,
            function,
            class_type,
            name,
            latex_name,
            coefficients,
            config: CharClassConfig::default(),
            forms: Mutex::new(BTreeMap::new()),
        })
    }

    /// Replaces the evaluation settings.
    pub fn with_config(mut self, config: CharClassConfig) -> Self {
        self.config = config;
        self
    }

    /// Defining function.
    pub fn function(&self) -> &Arc<dyn AnalyticFunction> {
        &self.function
    }

    /// Additive, multiplicative or Pfaffian.
    pub fn class_type(&self) -> ClassType {
        self.class_type
    }

    /// Base field of the bundle.
    pub fn field_type(&self) -> FieldType {
        self.bundle.field_type()
    }

    /// Bundle the class is defined on.
    pub fn bundle(&self) -> &Arc<VectorBundle> {
        &self.bundle
    }

    /// Coefficients of the powers of the normalized curvature matrix.
    pub fn coefficients(&self) -> &[Complex64] {
        &self.coefficients
    }

    /// Short name, e.g. `c`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// LaTeX name, e.g. `\hat{A}`.
    pub fn latex_name(&self) -> Option<&str> {
        self.latex_name.as_deref()
    }

    /// Evaluation settings.
    pub fn config(&self) -> &CharClassConfig {
        &self.config
    }

    /// LaTeX rendering, e.g. `c(E)`.
    pub fn latex(&self) -> String {
        format!(
            "{}({})",
            self.latex_name.as_deref().unwrap_or_default(),
            self.bundle.latex_name()
        )
    }

    /// Drops every cached form.
    pub fn clear_cache(&self) {
        let mut forms = self.lock_forms();
        debug!(dropped = forms.len(), "cleared characteristic form cache");
        forms.clear();
    }

    /// Number of connections with a cached form.
    pub fn cached_len(&self) -> usize {
        self.lock_forms().len()
    }

    /// Characteristic form of the connection registered under `connection_id`.
    ///
    /// Repeated calls for the same handle return the cached `Arc`. When
    /// `curvature` is `None` the matrices are read from the connection on a
    /// minimal set of covering frames; Pfaffian classes always need them
    /// supplied since skew-symmetry cannot be derived here.
    pub fn get_form(
        &self,
        arena: &ConnectionArena,
        connection_id: ConnectionId,
        curvature: Option<&CurvatureMatrices>,
    ) -> Result<Arc<MixedForm>, CwError> {
        let mut forms = self.lock_forms();
        if let Some(cached) = forms.get(&connection_id) {
            debug!(connection = connection_id.as_raw(), "characteristic form cache hit");
            return Ok(Arc::clone(cached));
        }
        debug!(connection = connection_id.as_raw(), "characteristic form cache miss");

        let connection = arena.get(connection_id)?;
        self.check_connection(connection)?;
        let derived;
        let matrices = match curvature {
            Some(supplied) => {
                self.check_matrices(supplied)?;
                supplied
            }
            None => {
                derived = self.derive_matrices(connection)?;
                &derived
            }
        };

        let form = self.assemble(connection, matrices)?;
        if self.config.verify_overlaps {
            let base = self.bundle.base();
            if let Err(err) =
                form.check_overlaps(|a, b| base.intersects(a, b), self.config.overlap_tolerance)
            {
                warn!(
                    connection = connection_id.as_raw(),
                    error = %err,
                    "restrictions disagree on overlapping frames"
                );
                return Err(err);
            }
        }

        let form = Arc::new(form);
        forms.insert(connection_id, Arc::clone(&form));
        info!(
            class = self.name.as_deref().unwrap_or("unnamed"),
            connection = connection_id.as_raw(),
            frames = matrices.len(),
            "computed characteristic form"
        );
        Ok(form)
    }

    fn lock_forms(&self) -> MutexGuard<'_, BTreeMap<ConnectionId, Arc<MixedForm>>> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent.
        self.forms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_connection(&self, connection: &dyn Connection) -> Result<(), CwError> {
        let accepted = match connection.kind() {
            ConnectionKind::Affine => self.bundle.is_tangent(),
            ConnectionKind::Bundle => true,
            ConnectionKind::Other => false,
        };
        if accepted {
            return Ok(());
        }
        Err(CwError::TypeMismatch(
            ErrorInfo::new(
                "connection-kind",
                "argument must be an affine connection on the manifold or a bundle connection on the vector bundle",
            )
            .with_context("kind", connection.kind())
            .with_context("bundle", self.bundle.name()),
        ))
    }

    fn check_matrices(&self, matrices: &CurvatureMatrices) -> Result<(), CwError> {
        let rank = self.bundle.rank();
        let dim = self.bundle.base().dim();
        for (frame, matrix) in matrices {
            if self.bundle.frame(*frame).is_none() {
                return Err(unknown_frame(*frame, self.bundle.name()));
            }
            if matrix.size() != rank || matrix.dim() != dim {
                return Err(CwError::Validation(
                    ErrorInfo::new(
                        "matrix-shape",
                        "curvature matrix must be rank x rank on the base manifold",
                    )
                    .with_context("frame", frame.as_raw())
                    .with_context("size", matrix.size())
                    .with_context("rank", rank),
                ));
            }
        }
        Ok(())
    }

    fn derive_matrices(&self, connection: &dyn Connection) -> Result<CurvatureMatrices, CwError> {
        if self.class_type == ClassType::Pfaffian {
            return Err(CwError::NotSupported(
                ErrorInfo::new(
                    "pfaffian-curvature",
                    "Pfaffian classes need the curvature matrices to be supplied",
                )
                .with_hint("pass skew-symmetric curvature matrices for each frame"),
            ));
        }
        let frames = connection
            .frames()
            .into_iter()
            .map(|id| {
                self.bundle
                    .frame(id)
                    .ok_or_else(|| unknown_frame(id, self.bundle.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dim = self.bundle.base().dim();
        let indices = self.bundle.irange();
        let mut matrices = CurvatureMatrices::new();
        for frame in select_min_frames(frames, self.bundle.base().as_ref()) {
            let rows = indices
                .clone()
                .map(|i| {
                    indices
                        .clone()
                        .map(|j| connection.curvature_form(i, j, frame.id))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            matrices.insert(frame.id, FormMatrix::from_rows(dim, rows)?);
        }
        Ok(matrices)
    }

    fn assemble(
        &self,
        connection: &dyn Connection,
        matrices: &CurvatureMatrices,
    ) -> Result<MixedForm, CwError> {
        let (name, latex_name) = match (&self.name, connection.name()) {
            (Some(name), Some(con)) => (
                Some(format!("{name}({}, {con})", self.bundle.name())),
                self.latex_name.as_ref().map(|latex| {
                    format!(
                        "{latex}({}, {})",
                        self.bundle.latex_name(),
                        connection.latex_name().unwrap_or(con)
                    )
                }),
            ),
            _ => (self.name.clone(), self.latex_name.clone()),
        };
        let mut form = MixedForm::new(self.bundle.base().dim(), name, latex_name);
        self.label_components(&mut form, connection)?;

        for (frame_id, curvature) in matrices {
            let frame = self
                .bundle
                .frame(*frame_id)
                .ok_or_else(|| unknown_frame(*frame_id, self.bundle.name()))?;
            let normalized = normalize_matrix(curvature, self.class_type);
            let polynomial = insert_in_polynomial(&normalized, &self.coefficients)?;
            let reduced = reduce(&polynomial, self.class_type)?.prune(self.config.prune_tolerance);
            form.set_restriction(frame.domain, &reduced)?;
        }
        Ok(form)
    }

    /// Degrees that can carry data are multiples of the stride; the rest
    /// (and degree 0 for Pfaffian classes) are flagged zero.
    fn label_components(
        &self,
        form: &mut MixedForm,
        connection: &dyn Connection,
    ) -> Result<(), CwError> {
        let stride = self.degree_stride();
        for k in 0..=form.dim() {
            if k % stride != 0 || (k == 0 && self.class_type == ClassType::Pfaffian) {
                form.mark_zero(k)?;
                continue;
            }
            let Some(name) = &self.name else {
                continue;
            };
            let index = k / stride;
            let mut label = format!("{name}_{index}({}", self.bundle.name());
            let mut latex = self
                .latex_name
                .as_ref()
                .map(|latex| format!("{latex}_{{{index}}}({}", self.bundle.latex_name()));
            if let Some(con) = connection.name() {
                label.push_str(&format!(", {con}"));
                if let Some(latex) = latex.as_mut() {
                    latex.push_str(&format!(", {}", connection.latex_name().unwrap_or(con)));
                }
            }
            label.push(')');
            if let Some(latex) = latex.as_mut() {
                latex.push(')');
            }
            form.set_component_name(k, Some(label), latex)?;
        }
        Ok(())
    }

    fn degree_stride(&self) -> usize {
        match (self.class_type, self.bundle.field_type()) {
            (ClassType::Pfaffian, _) => self.bundle.rank().max(1),
            (_, FieldType::Real) => 4,
            (_, FieldType::Complex) => 2,
            (_, FieldType::NeitherRealNorComplex) => 1,
        }
    }
}

impl fmt::Display for CharacteristicClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Characteristic class ")?;
        if let Some(name) = &self.name {
            write!(f, "{name} ")?;
        }
        write!(
            f,
            "of {} type associated to {} on the {}",
            self.class_type,
            self.function.describe(),
            self.bundle
        )
    }
}

fn unknown_frame(frame: FrameId, bundle: &str) -> CwError {
    CwError::Validation(
        ErrorInfo::new("unknown-frame", "frame is not registered on the bundle")
            .with_context("frame", frame.as_raw())
            .with_context("bundle", bundle),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_forms::DiffForm;
    use cw_manifold::{Manifold, TabulatedConnection};
    use cw_series::Polynomial;

    fn line_bundle() -> (Arc<VectorBundle>, FrameId) {
        let base = Arc::new(Manifold::new(2, "M"));
        let root = base.root();
        let mut bundle = VectorBundle::new(base, 1, "E", FieldType::Complex);
        let frame = bundle.local_frame("e", root).unwrap();
        (Arc::new(bundle), frame)
    }

    fn chern(bundle: Arc<VectorBundle>) -> CharacteristicClass {
        CharacteristicClass::new(
            bundle,
            Arc::new(Polynomial::one_plus_x()),
            ClassType::Multiplicative,
            Some("c".into()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn display_and_latex() {
        let (bundle, _) = line_bundle();
        let class = chern(bundle);
        assert_eq!(
            class.to_string(),
            "Characteristic class c of multiplicative type associated to x + 1 on the \
             Differentiable complex vector bundle E -> M of rank 1 over the base space \
             2-dimensional differentiable manifold M"
        );
        assert_eq!(class.latex(), "c(E)");
        assert_eq!(class.latex_name(), Some("c"));
    }

    #[test]
    fn component_names_follow_stride() {
        let (bundle, frame) = line_bundle();
        let class = chern(Arc::clone(&bundle));
        let mut connection = TabulatedConnection::bundle(&bundle, "nabla");
        let omega = DiffForm::monomial(2, &[0, 1], Complex64::new(1.0, 0.0)).unwrap();
        connection.set_curvature_form(1, 1, frame, omega).unwrap();
        let mut arena = ConnectionArena::new();
        let id = arena.insert(connection);
        let form = class.get_form(&arena, id, None).unwrap();
        assert_eq!(form.name(), Some("c(E, nabla)"));
        assert_eq!(
            form.display(),
            "c(E, nabla) = c_0(E, nabla) + zero + c_1(E, nabla)"
        );
        assert_eq!(
            form.component(2).unwrap().latex_name.as_deref(),
            Some("c_{1}(E, nabla)")
        );
    }

    #[test]
    fn lock_survives_cache_clear() {
        let (bundle, _) = line_bundle();
        let class = chern(bundle);
        assert_eq!(class.cached_len(), 0);
        class.clear_cache();
        assert_eq!(class.cached_len(), 0);
    }
}
