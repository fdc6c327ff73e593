//! Canonical JSON for forms and reports: object keys sorted, and negative
//! zero folded into zero so that equal forms always hash alike.

use std::collections::BTreeMap;

use ::serde::{Deserialize, Serialize};
use cw_core::errors::{CwError, ErrorInfo};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::mixed::MixedForm;

fn json_error(code: &str, err: impl ToString) -> CwError {
    CwError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn canonical_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, val)| (key, canonical_value(val)))
                .collect();
            Value::Object(ordered.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical_value).collect()),
        Value::Number(n) if n.is_f64() && n.as_f64() == Some(0.0) => {
            Number::from_f64(0.0).map_or(Value::Number(n), Value::Number)
        }
        other => other,
    }
}

/// Serializes `value` as canonical JSON bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CwError> {
    let value = serde_json::to_value(value).map_err(|err| json_error("json-encode", err))?;
    serde_json::to_vec(&canonical_value(value)).map_err(|err| json_error("json-write", err))
}

/// Parses JSON written by [`to_canonical_json_bytes`] (or any other JSON).
pub fn from_json_slice<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, CwError> {
    serde_json::from_slice(data).map_err(|err| json_error("json-read", err))
}

/// Lowercase hex SHA-256 of the canonical JSON of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, CwError> {
    let digest = Sha256::digest(to_canonical_json_bytes(value)?);
    Ok(format!("{digest:x}"))
}

impl MixedForm {
    /// Canonical JSON encoding of the form.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CwError> {
        to_canonical_json_bytes(self)
    }

    /// Content hash: equal forms (names and every restriction) hash alike.
    pub fn content_hash(&self) -> Result<String, CwError> {
        stable_hash_string(self)
    }
}
