//! Store adapter layer
//!
//! Uniform search interface over the two evidence stores. Each adapter
//! translates a `SearchRequest` into its driver's query shape and maps
//! driver rows into normalized `EvidenceItem`s. Adapters hold no retrieval
//! state of their own; one instance per process, passed by reference.

mod graph;
pub mod mock;
mod traits;
mod vector;

pub use graph::{GraphAdapter, GRAPH_FACT_SCORE};
pub use traits::{
    DriverError, GraphDriver, GraphQuery, GraphRow, GraphRowKind, RelationshipType, ScoredDocument,
    SearchRequest, VectorDriver, VectorQuery,
};
pub use vector::VectorAdapter;
