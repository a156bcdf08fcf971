//! Shared fixtures for integration tests.
//!
//! Two engine builders: `demo_engine` runs against the seeded reference
//! stores (SQLite graph + in-memory vectors), `mock_engine` wires the
//! preconfigured mock drivers for call-counting and failure injection.

use conflux::adapter::mock::{MockGraphDriver, MockVectorDriver};
use conflux::adapter::{GraphRow, GraphRowKind, ScoredDocument};
use conflux::store::seed::{demo_vocabulary, seed_graph, seed_vectors};
use conflux::store::{MemoryVectorDriver, SqliteGraphDriver};
use conflux::{ConfluxEngine, RetrievalConfig};
use std::sync::Arc;

/// Engine over the seeded demo corpus.
pub fn demo_engine() -> ConfluxEngine {
    let graph = SqliteGraphDriver::open_in_memory().expect("in-memory graph store");
    seed_graph(&graph).expect("seed graph");
    let vector = MemoryVectorDriver::with_hash_embedder();
    seed_vectors(&vector).expect("seed vectors");
    ConfluxEngine::new(
        Arc::new(demo_vocabulary()),
        Arc::new(graph),
        Arc::new(vector),
        RetrievalConfig::default(),
    )
}

/// Engine over mock drivers, for asserting on call counts and failures.
pub fn mock_engine(
    graph: Arc<MockGraphDriver>,
    vector: Arc<MockVectorDriver>,
    config: RetrievalConfig,
) -> ConfluxEngine {
    ConfluxEngine::new(Arc::new(demo_vocabulary()), graph, vector, config)
}

/// A vector document at the given raw distance.
pub fn doc(id: &str, distance: f32) -> ScoredDocument {
    ScoredDocument {
        id: id.into(),
        text: format!("评论内容 {id}"),
        metadata: serde_json::json!({}),
        distance,
    }
}

/// A graph node row.
pub fn node(id: &str) -> GraphRow {
    GraphRow {
        id: id.into(),
        kind: GraphRowKind::Node,
        label: id.into(),
        payload: serde_json::json!({"name": id}),
    }
}
