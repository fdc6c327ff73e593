use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CwError, ErrorInfo};

/// Base field of a vector bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Real vector bundle.
    Real,
    /// Complex vector bundle.
    Complex,
    /// Bundle over a field that is neither the reals nor the complexes.
    NeitherRealNorComplex,
}

impl FieldType {
    /// Stable lowercase label used in reports and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Real => "real",
            FieldType::Complex => "complex",
            FieldType::NeitherRealNorComplex => "neither_real_nor_complex",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CwError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "real" => Ok(FieldType::Real),
            "complex" => Ok(FieldType::Complex),
            "neither_real_nor_complex" => Ok(FieldType::NeitherRealNorComplex),
            other => Err(CwError::Validation(
                ErrorInfo::new("invalid-field", "the field must be 'real' or 'complex'")
                    .with_context("field", other),
            )),
        }
    }
}

/// Kind of invariant polynomial a characteristic class is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassType {
    /// Trace of the matrix polynomial.
    #[serde(rename = "additive")]
    Additive,
    /// Determinant of the matrix polynomial.
    #[serde(rename = "multiplicative")]
    Multiplicative,
    /// Pfaffian of the matrix polynomial.
    #[serde(rename = "Pfaffian")]
    Pfaffian,
}

impl ClassType {
    /// Label used by the host system ("additive", "multiplicative", "Pfaffian").
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Additive => "additive",
            ClassType::Multiplicative => "multiplicative",
            ClassType::Pfaffian => "Pfaffian",
        }
    }
}

impl Default for ClassType {
    fn default() -> Self {
        ClassType::Multiplicative
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassType {
    type Err = CwError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "additive" => Ok(ClassType::Additive),
            "multiplicative" => Ok(ClassType::Multiplicative),
            "Pfaffian" | "pfaffian" => Ok(ClassType::Pfaffian),
            other => Err(CwError::Validation(
                ErrorInfo::new(
                    "invalid-class-type",
                    "the class type must either be 'additive', 'multiplicative' or 'Pfaffian'",
                )
                .with_context("class_type", other),
            )),
        }
    }
}
