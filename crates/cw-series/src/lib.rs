#![deny(missing_docs)]
#![doc = "Truncated power series arithmetic and the analytic functions that define characteristic classes."]

mod function;
mod series;

pub use function::{
    AHatFunction, AnalyticFunction, ExponentialFunction, HirzebruchFunction, Polynomial,
    SeriesFunction, ToddFunction,
};
pub use series::{Complex64, PowerSeries, ZERO_TOL};
