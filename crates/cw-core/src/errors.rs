//! Structured error types shared across CW crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CwError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (ranks, frame names, degrees, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the Chern-Weil engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CwError {
    /// Invalid field, class type, rank or curvature input.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// A connection of the wrong kind was supplied.
    #[error("type mismatch: {0}")]
    TypeMismatch(ErrorInfo),
    /// The requested computation is not available for this class.
    #[error("not supported: {0}")]
    NotSupported(ErrorInfo),
    /// Trace, determinant or Pfaffian could not be applied.
    #[error("reduction error: {0}")]
    Reduction(ErrorInfo),
    /// Power series arithmetic errors.
    #[error("series error: {0}")]
    Series(ErrorInfo),
    /// Exterior algebra and form matrix errors.
    #[error("forms error: {0}")]
    Forms(ErrorInfo),
    /// Manifold, domain, frame and connection lookup errors.
    #[error("manifold error: {0}")]
    Manifold(ErrorInfo),
    /// Restrictions on intersecting domains disagree.
    #[error("consistency error: {0}")]
    Consistency(ErrorInfo),
    /// Serialization and configuration errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CwError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CwError::Validation(info)
            | CwError::TypeMismatch(info)
            | CwError::NotSupported(info)
            | CwError::Reduction(info)
            | CwError::Series(info)
            | CwError::Forms(info)
            | CwError::Manifold(info)
            | CwError::Consistency(info)
            | CwError::Serde(info) => info,
        }
    }

    /// Shorthand for the stable code carried by the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Builds a [`CwError::Validation`] from a code and message.
    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        CwError::Validation(ErrorInfo::new(code, message))
    }
}
