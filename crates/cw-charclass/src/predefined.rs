use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cw_core::errors::{CwError, ErrorInfo};
use cw_core::{ClassType, FieldType};
use cw_manifold::VectorBundle;
use cw_series::{
    AHatFunction, AnalyticFunction, ExponentialFunction, HirzebruchFunction, Polynomial,
    ToddFunction,
};
use serde::{Deserialize, Serialize};

use crate::class::CharacteristicClass;

/// Classes that can be built by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PredefinedClass {
    /// Chern character `ch`, complex additive, `e^x`.
    ChernChar,
    /// Todd class `Td`, complex additive, `x/(1 - e^(-x))`.
    Todd,
    /// Chern class `c`, complex multiplicative, `1 + x`.
    Chern,
    /// Pontryagin class `p`, real multiplicative, `1 + x`.
    Pontryagin,
    /// A-hat class, real multiplicative.
    AHat,
    /// Hirzebruch L class, real multiplicative.
    Hirzebruch,
    /// Euler class `e`, real Pfaffian, `x`.
    Euler,
}

/// Everything needed to build a predefined class on a compatible bundle.
#[derive(Debug, Clone)]
pub struct ClassSignature {
    /// Required base field of the bundle.
    pub field: FieldType,
    /// Reduction used by the class.
    pub class_type: ClassType,
    /// Short name.
    pub name: &'static str,
    /// LaTeX name.
    pub latex_name: &'static str,
    /// Defining function.
    pub function: Arc<dyn AnalyticFunction>,
}

/// Serializable listing entry for a predefined class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedSummary {
    /// Lookup key.
    pub key: String,
    /// Required base field.
    pub field: FieldType,
    /// Reduction used by the class.
    pub class_type: ClassType,
    /// Short name.
    pub name: String,
    /// LaTeX name.
    pub latex_name: String,
    /// Defining function.
    pub function: String,
}

impl PredefinedClass {
    /// Every predefined class in listing order.
    pub const ALL: [PredefinedClass; 7] = [
        PredefinedClass::ChernChar,
        PredefinedClass::Todd,
        PredefinedClass::Chern,
        PredefinedClass::Pontryagin,
        PredefinedClass::AHat,
        PredefinedClass::Hirzebruch,
        PredefinedClass::Euler,
    ];

    /// Lookup key, e.g. `ChernChar`.
    pub fn key(&self) -> &'static str {
        match self {
            PredefinedClass::ChernChar => "ChernChar",
            PredefinedClass::Todd => "Todd",
            PredefinedClass::Chern => "Chern",
            PredefinedClass::Pontryagin => "Pontryagin",
            PredefinedClass::AHat => "AHat",
            PredefinedClass::Hirzebruch => "Hirzebruch",
            PredefinedClass::Euler => "Euler",
        }
    }

    /// Field, type, names and function of the class.
    pub fn signature(&self) -> ClassSignature {
        let (field, class_type, name, latex_name) = match self {
            PredefinedClass::ChernChar => {
                (FieldType::Complex, ClassType::Additive, "ch", "\\mathrm{ch}")
            }
            PredefinedClass::Todd => (FieldType::Complex, ClassType::Additive, "Td", "\\mathrm{Td}"),
            PredefinedClass::Chern => (FieldType::Complex, ClassType::Multiplicative, "c", "c"),
            PredefinedClass::Pontryagin => (FieldType::Real, ClassType::Multiplicative, "p", "p"),
            PredefinedClass::AHat => (FieldType::Real, ClassType::Multiplicative, "A^", "\\hat{A}"),
            PredefinedClass::Hirzebruch => (FieldType::Real, ClassType::Multiplicative, "L", "L"),
            PredefinedClass::Euler => (FieldType::Real, ClassType::Pfaffian, "e", "e"),
        };
        ClassSignature {
            field,
            class_type,
            name,
            latex_name,
            function: self.function(),
        }
    }

    fn function(&self) -> Arc<dyn AnalyticFunction> {
        match self {
            PredefinedClass::ChernChar => Arc::new(ExponentialFunction),
            PredefinedClass::Todd => Arc::new(ToddFunction),
            PredefinedClass::Chern | PredefinedClass::Pontryagin => {
                Arc::new(Polynomial::one_plus_x())
            }
            PredefinedClass::AHat => Arc::new(AHatFunction),
            PredefinedClass::Hirzebruch => Arc::new(HirzebruchFunction),
            PredefinedClass::Euler => Arc::new(Polynomial::identity()),
        }
    }

    /// Listing entry for the class.
    pub fn summary(&self) -> PredefinedSummary {
        let signature = self.signature();
        PredefinedSummary {
            key: self.key().to_string(),
            field: signature.field,
            class_type: signature.class_type,
            name: signature.name.to_string(),
            latex_name: signature.latex_name.to_string(),
            function: signature.function.describe(),
        }
    }
}

impl fmt::Display for PredefinedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PredefinedClass {
    type Err = CwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PredefinedClass::ALL
            .into_iter()
            .find(|class| class.key() == s)
            .ok_or_else(|| {
                CwError::Validation(
                    ErrorInfo::new(
                        "unknown-class",
                        format!("the characteristic class '{s}' is not predefined yet"),
                    )
                    .with_hint("use one of ChernChar, Todd, Chern, Pontryagin, AHat, Hirzebruch, Euler"),
                )
            })
    }
}

impl CharacteristicClass {
    /// Builds the predefined class `key` on `bundle`.
    ///
    /// The bundle's field must match the one the class is defined over.
    pub fn predefined(bundle: Arc<VectorBundle>, key: &str) -> Result<Self, CwError> {
        let class: PredefinedClass = key.parse()?;
        let signature = class.signature();
        if bundle.field_type() != signature.field {
            return Err(CwError::Validation(
                ErrorInfo::new(
                    "field-mismatch",
                    format!(
                        "base field must be {} for class '{}'",
                        signature.field, class
                    ),
                )
                .with_context("bundle", bundle.name())
                .with_context("field", bundle.field_type()),
            ));
        }
        Self::new(
            bundle,
            signature.function,
            signature.class_type,
            Some(signature.name.to_string()),
            Some(signature.latex_name.to_string()),
        )
    }
}
