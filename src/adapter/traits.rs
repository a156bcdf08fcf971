//! Store driver contracts.
//!
//! Drivers are the boundary to the external stores. Connection lifecycle,
//! pooling, and authentication are the driver's business; the core only
//! sees these traits. Drivers are stateless with respect to retrieval
//! and retain no query history.

use crate::analyzer::{ResolvedEntity, TargetMode};
use crate::evidence::Tier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a driver can raise.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Transient connectivity failure. Treated as zero confidence for the
    /// tier, never as a hard failure of the cycle.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something we cannot map to evidence.
    #[error("malformed store response: {0}")]
    Malformed(String),

    /// Structural misconfiguration (bad endpoint, missing schema).
    /// Non-retryable; escalated fatally to the caller.
    #[error("store misconfigured: {0}")]
    Misconfigured(String),
}

impl DriverError {
    /// Whether this error should abort the whole cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Misconfigured(_))
    }
}

/// Relationship types the graph store models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Model → Series
    BelongsToSeries,
    /// Series → Brand
    BelongsToBrand,
    /// Review → Model
    Evaluates,
    /// Review → Dimension (strengths/weaknesses per dimension)
    Mentions,
    /// Persona → Dimension (what a user group cares about)
    Prioritizes,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 5] = [
        RelationshipType::BelongsToSeries,
        RelationshipType::BelongsToBrand,
        RelationshipType::Evaluates,
        RelationshipType::Mentions,
        RelationshipType::Prioritizes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::BelongsToSeries => "BELONGS_TO_SERIES",
            RelationshipType::BelongsToBrand => "BELONGS_TO_BRAND",
            RelationshipType::Evaluates => "EVALUATES",
            RelationshipType::Mentions => "MENTIONS",
            RelationshipType::Prioritizes => "PRIORITIZES",
        }
    }
}

/// The structured query shape the graph driver accepts.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    /// Entities to filter by; empty means unfiltered.
    pub entity_filter: Vec<ResolvedEntity>,
    /// Relationship types to expand; empty means nodes only.
    pub relationship_types: Vec<RelationshipType>,
    pub limit: usize,
}

/// Whether a graph row is a node or a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphRowKind {
    Node,
    Relationship,
}

/// One row returned by the graph store, mappable to an `EvidenceItem`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRow {
    /// The store's record identifier.
    pub id: String,
    pub kind: GraphRowKind,
    /// Human-readable label ("特斯拉 Model Y", "科技尝鲜族 PRIORITIZES 智能化").
    pub label: String,
    /// Structured payload (properties, endpoint names).
    pub payload: serde_json::Value,
}

/// The query shape the vector driver accepts.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    /// Query text to embed and search with.
    pub text: String,
    /// Canonical entity names to filter on via document metadata;
    /// empty means unfiltered.
    pub entity_filter: Vec<String>,
    pub limit: usize,
}

/// One ranked document from the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub text: String,
    pub metadata: serde_json::Value,
    /// Raw store distance (smaller is closer). The adapter normalizes
    /// this into a [0,1] similarity.
    pub distance: f32,
}

/// Graph store driver contract.
#[async_trait]
pub trait GraphDriver: Send + Sync {
    async fn fetch(&self, query: &GraphQuery) -> Result<Vec<GraphRow>, DriverError>;
}

/// Vector store driver contract.
#[async_trait]
pub trait VectorDriver: Send + Sync {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<ScoredDocument>, DriverError>;
}

/// One adapter-facing search request. The adapters translate this into
/// their driver's query shape.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_text: String,
    pub entities: Vec<ResolvedEntity>,
    pub tier: Tier,
    pub mode: TargetMode,
    /// Result-count ceiling for the tier.
    pub limit: usize,
}
