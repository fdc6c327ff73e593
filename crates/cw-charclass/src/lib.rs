#![deny(missing_docs)]
#![doc = "Chern-Weil characteristic classes of vector bundles.\n\nA class turns the curvature matrix of a connection into a mixed-degree form by normalizing it, inserting it into the Taylor polynomial of the defining function, and reducing the result with the trace, the determinant or the Pfaffian."]

mod class;
mod coefficients;
mod config;
mod frames;
mod normalize;
mod polynomial;
mod predefined;
mod reduction;
mod report;

pub use class::{CharacteristicClass, CurvatureMatrices};
pub use coefficients::{extract_coefficients, truncation_order};
pub use config::CharClassConfig;
pub use frames::select_min_frames;
pub use normalize::{normalization_factor, normalize_matrix};
pub use polynomial::insert_in_polynomial;
pub use predefined::{ClassSignature, PredefinedClass, PredefinedSummary};
pub use reduction::reduce;
pub use report::{build_report, ClassReport, ClassSummary};
