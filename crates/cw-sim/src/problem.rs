//! YAML problem files: a manifold with its open subsets, a bundle with local
//! frames, one tabulated connection and the class to evaluate on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use cw_charclass::{CharClassConfig, CharacteristicClass, CurvatureMatrices};
use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{ClassType, ConnectionId, DomainId, FieldType, FrameId};
use cw_forms::{Complex64, DiffForm, FormMatrix};
use cw_manifold::{ConnectionArena, ConnectionKind, Manifold, TabulatedConnection, VectorBundle};
use cw_series::Polynomial;
use serde::{Deserialize, Serialize};

/// Top-level problem description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub manifold: ManifoldSpec,
    pub bundle: BundleSpec,
    pub connection: ConnectionSpec,
    pub class: ClassSpec,
    /// Hand the curvature matrices to the class explicitly instead of letting
    /// it query the connection. Pfaffian classes need this.
    #[serde(default)]
    pub supply_curvature: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifoldSpec {
    pub name: String,
    #[serde(default)]
    pub latex_name: Option<String>,
    pub dim: usize,
    #[serde(default = "default_start_index")]
    pub start_index: usize,
    /// Open subsets in declaration order; a parent must be declared first.
    #[serde(default)]
    pub domains: Vec<DomainSpec>,
    #[serde(default)]
    pub overlaps: Vec<(String, String)>,
}

fn default_start_index() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    /// Defaults to the whole manifold.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKindSpec {
    Tangent,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSpec {
    pub kind: BundleKindSpec,
    /// Ignored for tangent bundles.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latex_name: Option<String>,
    /// Ignored for tangent bundles.
    #[serde(default)]
    pub rank: Option<usize>,
    /// Ignored for tangent bundles.
    #[serde(default)]
    pub field: Option<FieldType>,
    pub frames: Vec<FrameSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub name: String,
    /// Defaults to the whole manifold.
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub kind: ConnectionKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latex_name: Option<String>,
    #[serde(default)]
    pub curvature: Vec<FrameCurvatureSpec>,
}

/// Non-zero curvature entries in one frame; missing entries are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCurvatureSpec {
    pub frame: String,
    pub entries: Vec<CurvatureEntrySpec>,
}

/// `Ω^i_j` in bundle indices, as a sum of coordinate monomials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvatureEntrySpec {
    pub i: usize,
    pub j: usize,
    pub terms: Vec<TermSpec>,
}

/// `(re + i im) dx^{indices}` with coordinate indices counted from the start index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    pub indices: Vec<usize>,
    #[serde(default)]
    pub re: f64,
    #[serde(default)]
    pub im: f64,
}

/// Either a predefined class key or a real polynomial with a class type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    #[serde(default)]
    pub predefined: Option<String>,
    /// Coefficients, constant term first.
    #[serde(default)]
    pub polynomial: Option<Vec<f64>>,
    #[serde(default)]
    pub class_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latex_name: Option<String>,
}

/// Runtime objects built from a [`Problem`].
#[derive(Debug)]
pub struct Assembled {
    pub class: CharacteristicClass,
    pub arena: ConnectionArena,
    pub connection: ConnectionId,
    pub connection_name: Option<String>,
    /// Present when the problem asks for explicit curvature.
    pub curvature: Option<CurvatureMatrices>,
}

fn problem_error(code: &str, message: impl Into<String>) -> CwError {
    CwError::Validation(ErrorInfo::new(code, message))
}

fn named_error(code: &str, message: &str, name: &str) -> CwError {
    CwError::Validation(ErrorInfo::new(code, message).with_context("name", name))
}

impl Problem {
    pub fn from_yaml_str(contents: &str) -> Result<Self, CwError> {
        serde_yaml::from_str(contents)
            .map_err(|err| CwError::Serde(ErrorInfo::new("yaml-read", err.to_string())))
    }

    pub fn assemble(&self, config: CharClassConfig) -> Result<Assembled, CwError> {
        let (manifold, domains) = self.manifold.build()?;
        let manifold = Arc::new(manifold);
        let (bundle, frames) = self.bundle.build(Arc::clone(&manifold), &domains)?;
        let bundle = Arc::new(bundle);

        let connection = self.connection.build(&bundle, &frames)?;
        let curvature = if self.supply_curvature {
            Some(
                connection
                    .curvature_matrices()
                    .map(|(frame, matrix)| (frame, matrix.clone()))
                    .collect(),
            )
        } else {
            None
        };
        let mut arena = ConnectionArena::new();
        let id = arena.insert(connection);

        let class = self.class.build(Arc::clone(&bundle))?.with_config(config);
        Ok(Assembled {
            class,
            arena,
            connection: id,
            connection_name: self.connection.name.clone(),
            curvature,
        })
    }
}

impl ManifoldSpec {
    fn build(&self) -> Result<(Manifold, BTreeMap<String, DomainId>), CwError> {
        let mut manifold =
            Manifold::new(self.dim, self.name.clone()).with_start_index(self.start_index);
        if let Some(latex) = &self.latex_name {
            manifold = manifold.with_latex_name(latex.clone());
        }
        let mut domains = BTreeMap::from([(self.name.clone(), manifold.root())]);
        for domain in &self.domains {
            let parent = match &domain.parent {
                Some(parent) => lookup(&domains, parent, "domain")?,
                None => manifold.root(),
            };
            let id = manifold.open_subset(parent, domain.name.clone())?;
            domains.insert(domain.name.clone(), id);
        }
        for (a, b) in &self.overlaps {
            manifold.declare_overlap(lookup(&domains, a, "domain")?, lookup(&domains, b, "domain")?)?;
        }
        Ok((manifold, domains))
    }
}

impl BundleSpec {
    fn build(
        &self,
        base: Arc<Manifold>,
        domains: &BTreeMap<String, DomainId>,
    ) -> Result<(VectorBundle, BTreeMap<String, FrameId>), CwError> {
        let root = base.root();
        let mut bundle = match self.kind {
            BundleKindSpec::Tangent => VectorBundle::tangent(base),
            BundleKindSpec::General => {
                let rank = self
                    .rank
                    .ok_or_else(|| problem_error("missing-field", "general bundles need a rank"))?;
                let field = self.field.ok_or_else(|| {
                    problem_error("missing-field", "general bundles need a field")
                })?;
                let name = self.name.clone().unwrap_or_else(|| "E".to_string());
                VectorBundle::new(base, rank, name, field)
            }
        };
        if let Some(latex) = &self.latex_name {
            bundle = bundle.with_latex_name(latex.clone());
        }
        let mut frames = BTreeMap::new();
        for frame in &self.frames {
            let domain = match &frame.domain {
                Some(name) => lookup(domains, name, "domain")?,
                None => root,
            };
            if frames.contains_key(&frame.name) {
                return Err(named_error("duplicate-name", "frame declared twice", &frame.name));
            }
            let id = bundle.local_frame(frame.name.clone(), domain)?;
            frames.insert(frame.name.clone(), id);
        }
        Ok((bundle, frames))
    }
}

impl ConnectionSpec {
    fn build(
        &self,
        bundle: &VectorBundle,
        frames: &BTreeMap<String, FrameId>,
    ) -> Result<TabulatedConnection, CwError> {
        let mut connection = TabulatedConnection::new(self.kind, bundle, self.name.clone());
        if let Some(latex) = &self.latex_name {
            connection = connection.with_latex_name(latex.clone());
        }
        let dim = bundle.base().dim();
        let start = bundle.base().start_index();
        for block in &self.curvature {
            let frame = lookup(frames, &block.frame, "frame")?;
            connection.set_curvature_matrix(frame, FormMatrix::zeros(bundle.rank(), dim))?;
            for entry in &block.entries {
                let mut form = DiffForm::zero(dim);
                for term in &entry.terms {
                    let indices = term
                        .indices
                        .iter()
                        .map(|&idx| {
                            idx.checked_sub(start).ok_or_else(|| {
                                CwError::Validation(
                                    ErrorInfo::new(
                                        "index-range",
                                        "coordinate index below the start index",
                                    )
                                    .with_context("index", idx)
                                    .with_context("start", start),
                                )
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let monomial =
                        DiffForm::monomial(dim, &indices, Complex64::new(term.re, term.im))?;
                    form = &form + &monomial;
                }
                connection.set_curvature_form(entry.i, entry.j, frame, form)?;
            }
        }
        Ok(connection)
    }
}

impl ClassSpec {
    fn build(&self, bundle: Arc<VectorBundle>) -> Result<CharacteristicClass, CwError> {
        if let Some(key) = &self.predefined {
            return CharacteristicClass::predefined(bundle, key);
        }
        let coeffs = self.polynomial.as_ref().ok_or_else(|| {
            problem_error(
                "missing-field",
                "a class needs either a predefined key or polynomial coefficients",
            )
        })?;
        let class_type = match &self.class_type {
            Some(raw) => raw.parse()?,
            None => ClassType::default(),
        };
        CharacteristicClass::new(
            bundle,
            Arc::new(Polynomial::from_real(coeffs)),
            class_type,
            self.name.clone(),
            self.latex_name.clone(),
        )
    }
}

fn lookup<T: Copy>(table: &BTreeMap<String, T>, name: &str, what: &str) -> Result<T, CwError> {
    table.get(name).copied().ok_or_else(|| {
        CwError::Validation(
            ErrorInfo::new(format!("unknown-{what}"), format!("no {what} named '{name}'"))
                .with_context("name", name),
        )
    })
}
