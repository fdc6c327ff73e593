use cw_core::errors::{CwError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// YAML-configurable knobs for form evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharClassConfig {
    /// Compare restrictions on intersecting frame domains after assembly.
    #[serde(default)]
    pub verify_overlaps: bool,
    /// Largest coefficient difference tolerated by the overlap check.
    #[serde(default = "default_overlap_tolerance")]
    pub overlap_tolerance: f64,
    /// Coefficients at or below this magnitude are dropped from computed forms.
    #[serde(default = "default_prune_tolerance")]
    pub prune_tolerance: f64,
}

fn default_overlap_tolerance() -> f64 {
    1e-9
}

fn default_prune_tolerance() -> f64 {
    1e-14
}

impl Default for CharClassConfig {
    fn default() -> Self {
        Self {
            verify_overlaps: false,
            overlap_tolerance: default_overlap_tolerance(),
            prune_tolerance: default_prune_tolerance(),
        }
    }
}

impl CharClassConfig {
    /// Parses a YAML document; missing fields take their defaults.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CwError> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|err| CwError::Serde(ErrorInfo::new("yaml-read", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects negative or non-finite tolerances.
    pub fn validate(&self) -> Result<(), CwError> {
        for (key, value) in [
            ("overlap_tolerance", self.overlap_tolerance),
            ("prune_tolerance", self.prune_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CwError::Validation(
                    ErrorInfo::new("invalid-config", "tolerances must be finite and non-negative")
                        .with_context(key, value),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fields_default() {
        let config = CharClassConfig::from_yaml_str("verify_overlaps: true\n").unwrap();
        assert!(config.verify_overlaps);
        assert_eq!(config.overlap_tolerance, 1e-9);
        assert_eq!(config.prune_tolerance, 1e-14);
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = CharClassConfig::from_yaml_str("overlap_tolerance: -1.0\n").unwrap_err();
        assert_eq!(err.code(), "invalid-config");
        let err = CharClassConfig::from_yaml_str("verify_overlaps: [\n").unwrap_err();
        assert_eq!(err.code(), "yaml-read");
    }
}
