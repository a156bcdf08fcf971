//! Conflux: hybrid graph + vector retrieval orchestration.
//!
//! Answers natural-language questions about EV products by routing each
//! query to a knowledge graph, a vector store, or both, escalating through
//! retrieval tiers until confidence clears the floor, and fusing the
//! results into one citable evidence bundle for generation.
//!
//! # Core Concepts
//!
//! - **Routing**: every query gets a deterministic `RoutingDecision`
//!   saying which store(s) to hit and how deep to start.
//! - **Tiers**: bounded retrieval depths (`quick`/`standard`/`deep`);
//!   low-confidence results escalate, never the other way.
//! - **Evidence**: fused, deduplicated items with provenance keys, ready
//!   to cite.
//!
//! # Example
//!
//! ```no_run
//! use conflux::{ConfluxEngine, RetrievalConfig, TargetMode};
//! use conflux::retriever::CancellationToken;
//! use conflux::store::{seed, MemoryVectorDriver, SqliteGraphDriver};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = SqliteGraphDriver::open_in_memory()?;
//! seed::seed_graph(&graph)?;
//! let vector = MemoryVectorDriver::with_hash_embedder();
//! seed::seed_vectors(&vector)?;
//!
//! let engine = ConfluxEngine::new(
//!     Arc::new(seed::demo_vocabulary()),
//!     Arc::new(graph),
//!     Arc::new(vector),
//!     RetrievalConfig::default(),
//! );
//! let session = engine.open_session();
//! let result = engine
//!     .run(&session, "Model Y的内饰评价怎么样", TargetMode::UserInsight, &CancellationToken::new())
//!     .await?;
//! println!("{}", result.outcome.fallback_answer());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod analyzer;
pub mod assembler;
pub mod config;
mod engine;
pub mod evidence;
pub mod retriever;
pub mod session;
pub mod store;
pub mod vocab;

pub use analyzer::{Query, QueryAnalyzer, RoutingDecision, RoutingTarget, TargetMode};
pub use assembler::{AssembledEvidence, Assembler, EmptyEvidence};
pub use config::{ConfigError, RetrievalConfig, TierCeilings};
pub use engine::{ConfluxEngine, CycleOutcome, CycleResult, EngineError};
pub use evidence::{EvidenceBundle, EvidenceItem, ProvenanceKey, SourceKind, Tier};
pub use session::{SessionId, SessionRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
