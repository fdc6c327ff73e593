#![deny(missing_docs)]
#![doc = "Complexified exterior algebra at a point, square matrices of forms, and mixed-degree forms."]

mod blade;
mod canonical;
mod form;
mod matrix;
mod mixed;
mod sample;

pub use blade::{Blade, MAX_DIM};
pub use canonical::{from_json_slice, stable_hash_string, to_canonical_json_bytes};
pub use form::DiffForm;
pub use matrix::FormMatrix;
pub use mixed::{FormComponent, MixedForm};
pub use sample::{random_curvature, random_skew_curvature};

pub use cw_series::Complex64;
