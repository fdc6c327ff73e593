use std::collections::BTreeMap;

use cw_core::errors::CwError;
use cw_core::{ClassType, FieldType, SchemaVersion};
use cw_forms::MixedForm;
use serde::{Deserialize, Serialize};

use crate::class::CharacteristicClass;

/// Class metadata recorded alongside a computed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Short name, if any.
    pub name: Option<String>,
    /// LaTeX rendering of the class on its bundle.
    pub latex: String,
    /// Reduction used by the class.
    pub class_type: ClassType,
    /// Base field of the bundle.
    pub field: FieldType,
    /// Defining function.
    pub function: String,
    /// Bundle name.
    pub bundle: String,
    /// Bundle rank.
    pub rank: usize,
    /// Dimension of the base manifold.
    pub dim: usize,
    /// Curvature polynomial coefficients as `[re, im]` pairs.
    pub coefficients: Vec<[f64; 2]>,
}

/// Serializable result of one `evaluate` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    /// Schema of this payload.
    pub schema_version: SchemaVersion,
    /// Class metadata.
    pub class: ClassSummary,
    /// Name of the connection the form was computed for.
    pub connection: Option<String>,
    /// Symbolic display of the form.
    pub display: String,
    /// Expanded display per domain name.
    pub expansions: BTreeMap<String, String>,
    /// The computed form.
    pub form: MixedForm,
    /// Stable hash of `form`.
    pub form_hash: String,
}

/// Collects the class metadata and the computed form into a report.
pub fn build_report(
    class: &CharacteristicClass,
    form: &MixedForm,
    connection: Option<&str>,
) -> Result<ClassReport, CwError> {
    let bundle = class.bundle();
    let base = bundle.base();
    let mut expansions = BTreeMap::new();
    for domain in form.domains() {
        let label = base
            .domain_name(domain)
            .map(str::to_string)
            .unwrap_or_else(|| format!("domain-{}", domain.as_raw()));
        expansions.insert(label, form.display_expansion(domain)?);
    }
    Ok(ClassReport {
        schema_version: SchemaVersion::default(),
        class: ClassSummary {
            name: class.name().map(str::to_string),
            latex: class.latex(),
            class_type: class.class_type(),
            field: class.field_type(),
            function: class.function().describe(),
            bundle: bundle.name().to_string(),
            rank: bundle.rank(),
            dim: base.dim(),
            coefficients: class.coefficients().iter().map(|c| [c.re, c.im]).collect(),
        },
        connection: connection.map(str::to_string),
        display: form.display(),
        expansions,
        form_hash: form.content_hash()?,
        form: form.clone(),
    })
}
