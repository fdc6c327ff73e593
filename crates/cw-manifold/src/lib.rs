#![deny(missing_docs)]
#![doc = "Base manifolds with their open subsets, vector bundles with local frames, and connections."]

mod bundle;
mod connection;
mod manifold;

pub use bundle::{BundleKind, Frame, VectorBundle};
pub use connection::{Connection, ConnectionArena, ConnectionKind, TabulatedConnection};
pub use manifold::{DomainOrder, Manifold};
