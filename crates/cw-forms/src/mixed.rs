use std::collections::{BTreeMap, BTreeSet};

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use cw_core::DomainId;

use crate::form::DiffForm;

/// Homogeneous component of a [`MixedForm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormComponent {
    /// Form degree of the component.
    pub degree: usize,
    /// Display name, e.g. `c_1(E, nabla)`.
    pub name: Option<String>,
    /// LaTeX name.
    pub latex_name: Option<String>,
    /// Set when the component is identically zero by construction.
    pub is_zero: bool,
    restrictions: BTreeMap<DomainId, DiffForm>,
}

impl FormComponent {
    fn new(degree: usize) -> Self {
        Self {
            degree,
            name: None,
            latex_name: None,
            is_zero: false,
            restrictions: BTreeMap::new(),
        }
    }

    /// Value of the component on `domain`, if one was assigned.
    pub fn restriction(&self, domain: DomainId) -> Option<&DiffForm> {
        self.restrictions.get(&domain)
    }

    /// All assigned restrictions in domain order.
    pub fn restrictions(&self) -> impl Iterator<Item = (DomainId, &DiffForm)> + '_ {
        self.restrictions.iter().map(|(domain, form)| (*domain, form))
    }
}

/// Form with components in every degree `0..=dim`, defined piecewise over domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedForm {
    name: Option<String>,
    latex_name: Option<String>,
    dim: usize,
    components: Vec<FormComponent>,
}

fn degree_error(degree: usize, dim: usize) -> CwError {
    CwError::Forms(
        ErrorInfo::new("degree-range", "degree exceeds the manifold dimension")
            .with_context("degree", degree)
            .with_context("dim", dim),
    )
}

impl MixedForm {
    /// Creates an empty mixed form on a `dim`-dimensional manifold.
    pub fn new(dim: usize, name: Option<String>, latex_name: Option<String>) -> Self {
        Self {
            name,
            latex_name,
            dim,
            components: (0..=dim).map(FormComponent::new).collect(),
        }
    }

    /// Name of the whole form.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// LaTeX name of the whole form.
    pub fn latex_name(&self) -> Option<&str> {
        self.latex_name.as_deref()
    }

    /// Dimension of the base manifold.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Component of degree `k`.
    pub fn component(&self, k: usize) -> Option<&FormComponent> {
        self.components.get(k)
    }

    /// Components ordered by degree.
    pub fn components(&self) -> &[FormComponent] {
        &self.components
    }

    /// Names the component of degree `k`.
    pub fn set_component_name(
        &mut self,
        k: usize,
        name: Option<String>,
        latex_name: Option<String>,
    ) -> Result<(), CwError> {
        let dim = self.dim;
        let component = self
            .components
            .get_mut(k)
            .ok_or_else(|| degree_error(k, dim))?;
        component.name = name;
        component.latex_name = latex_name;
        Ok(())
    }

    /// Flags the component of degree `k` as identically zero and drops its data.
    pub fn mark_zero(&mut self, k: usize) -> Result<(), CwError> {
        let dim = self.dim;
        let component = self
            .components
            .get_mut(k)
            .ok_or_else(|| degree_error(k, dim))?;
        component.is_zero = true;
        component.name = Some("zero".to_string());
        component.latex_name = Some("0".to_string());
        component.restrictions.clear();
        Ok(())
    }

    /// Assigns the value of the form on `domain`, split by degree.
    ///
    /// Components flagged zero keep no data.
    pub fn set_restriction(&mut self, domain: DomainId, form: &DiffForm) -> Result<(), CwError> {
        form.ensure_dim(self.dim)?;
        for component in self.components.iter_mut().filter(|c| !c.is_zero) {
            component
                .restrictions
                .insert(domain, form.homogeneous(component.degree));
        }
        Ok(())
    }

    /// Domains carrying a restriction.
    pub fn domains(&self) -> BTreeSet<DomainId> {
        self.components
            .iter()
            .flat_map(|c| c.restrictions.keys().copied())
            .collect()
    }

    /// Full (all degrees) value on `domain`, if assigned.
    pub fn restriction(&self, domain: DomainId) -> Option<DiffForm> {
        if !self.domains().contains(&domain) {
            return None;
        }
        Some(
            self.components
                .iter()
                .filter_map(|c| c.restrictions.get(&domain))
                .fold(DiffForm::zero(self.dim), |acc, form| &acc + form),
        )
    }

    /// Verifies that restrictions on intersecting domains agree within `tol`.
    pub fn check_overlaps(
        &self,
        intersects: impl Fn(DomainId, DomainId) -> bool,
        tol: f64,
    ) -> Result<(), CwError> {
        let domains: Vec<DomainId> = self.domains().into_iter().collect();
        for (idx, &a) in domains.iter().enumerate() {
            for &b in &domains[idx + 1..] {
                if !intersects(a, b) {
                    continue;
                }
                for component in &self.components {
                    let (Some(fa), Some(fb)) =
                        (component.restrictions.get(&a), component.restrictions.get(&b))
                    else {
                        continue;
                    };
                    let diff = fa.max_abs_diff(fb);
                    if diff > tol {
                        return Err(CwError::Consistency(
                            ErrorInfo::new(
                                "overlap-mismatch",
                                "restrictions disagree on intersecting domains",
                            )
                            .with_context("degree", component.degree)
                            .with_context("domains", format!("{}/{}", a.as_raw(), b.as_raw()))
                            .with_context("difference", diff),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Symbolic display, e.g. `c(E, nabla) = c_0(E, nabla) + zero + c_1(E, nabla)`.
    pub fn display(&self) -> String {
        let terms: Vec<String> = self
            .components
            .iter()
            .map(|c| c.name.clone().unwrap_or_else(|| format!("[{}]", c.degree)))
            .collect();
        format!("{} = {}", self.name.as_deref().unwrap_or("unnamed"), terms.join(" + "))
    }

    /// Expanded display of the restriction on `domain`, e.g. `c(E, nabla) = [1] + [0] + [...]`.
    pub fn display_expansion(&self, domain: DomainId) -> Result<String, CwError> {
        if !self.domains().contains(&domain) {
            return Err(CwError::Forms(
                ErrorInfo::new("unknown-domain", "no restriction assigned on domain")
                    .with_context("domain", domain.as_raw()),
            ));
        }
        let terms: Vec<String> = self
            .components
            .iter()
            .map(|c| match c.restrictions.get(&domain) {
                Some(form) => format!("[{form}]"),
                None => "[0]".to_string(),
            })
            .collect();
        Ok(format!(
            "{} = {}",
            self.name.as_deref().unwrap_or("unnamed"),
            terms.join(" + ")
        ))
    }
}
