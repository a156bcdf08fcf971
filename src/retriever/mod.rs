//! Hybrid retriever — the tiered escalation state machine.
//!
//! One retrieval cycle walks `TierQuery → ConfidenceCheck → {Escalate,
//! Fuse}`. Escalation is strictly monotonic (quick < standard < deep,
//! never revisited downward) and capped at `Deep`, so the machine always
//! terminates with a bundle, possibly a low-confidence or empty one.
//! Within a tier the two adapter calls are independent read-only
//! operations and run concurrently; across tiers everything is
//! sequential, gated by the confidence check.

mod cancel;
mod confidence;
mod fusion;

pub use cancel::CancellationToken;
pub use confidence::{
    score_distribution, ConfidencePolicy, TopKMeanPolicy, HIGH_RELEVANCE_FLOOR,
    MID_RELEVANCE_FLOOR,
};
pub use fusion::fuse;

use crate::adapter::{DriverError, GraphAdapter, SearchRequest, VectorAdapter};
use crate::analyzer::{Query, RoutingDecision, RoutingTarget};
use crate::config::RetrievalConfig;
use crate::evidence::{EvidenceBundle, EvidenceItem, TierDiagnostics};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a retrieval cycle.
///
/// Only structural misconfiguration is fatal; transient store failures
/// and timeouts degrade to empty results for the tier.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("store misconfigured: {0}")]
    Misconfigured(String),
}

/// Result of one adapter call within a tier.
struct CallOutcome {
    items: Vec<EvidenceItem>,
    timed_out: bool,
    unavailable: bool,
}

impl CallOutcome {
    fn skipped() -> Self {
        Self {
            items: Vec::new(),
            timed_out: false,
            unavailable: false,
        }
    }
}

/// Orchestrates tiered retrieval over the two adapters.
pub struct HybridRetriever {
    graph: GraphAdapter,
    vector: VectorAdapter,
    config: RetrievalConfig,
    policy: Arc<dyn ConfidencePolicy>,
}

impl HybridRetriever {
    /// Build with the default top-k-mean confidence policy.
    pub fn new(graph: GraphAdapter, vector: VectorAdapter, config: RetrievalConfig) -> Self {
        let policy = Arc::new(TopKMeanPolicy::new(config.confidence_top_k));
        Self::with_policy(graph, vector, config, policy)
    }

    pub fn with_policy(
        graph: GraphAdapter,
        vector: VectorAdapter,
        config: RetrievalConfig,
        policy: Arc<dyn ConfidencePolicy>,
    ) -> Self {
        Self {
            graph,
            vector,
            config,
            policy,
        }
    }

    /// Run one full retrieval cycle for an analyzed query.
    ///
    /// Always returns a bundle for non-fatal outcomes; a `NoRetrieval`
    /// decision short-circuits without touching either adapter.
    pub async fn retrieve(
        &self,
        query: &Query,
        decision: &RoutingDecision,
        cancel: &CancellationToken,
    ) -> Result<EvidenceBundle, RetrieveError> {
        if decision.target == RoutingTarget::NoRetrieval {
            return Ok(EvidenceBundle::empty());
        }

        let use_graph = matches!(
            decision.target,
            RoutingTarget::GraphOnly | RoutingTarget::Hybrid
        );
        let use_vector = matches!(
            decision.target,
            RoutingTarget::VectorOnly | RoutingTarget::Hybrid
        );

        let mut tier = decision.initial_tier;
        let mut tiers_used = Vec::new();
        let mut diagnostics = Vec::new();
        let mut escalated = false;
        let mut cancelled = false;
        let mut graph_items = Vec::new();
        let mut vector_items = Vec::new();

        loop {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let request = SearchRequest {
                query_text: query.text().to_string(),
                entities: decision.entities.clone(),
                tier,
                mode: query.mode(),
                limit: tier.ceiling(&self.config.tier_ceilings),
            };

            let (graph_outcome, vector_outcome) = tokio::join!(
                async {
                    if use_graph {
                        self.call_graph(&request).await
                    } else {
                        Ok(CallOutcome::skipped())
                    }
                },
                async {
                    if use_vector {
                        self.call_vector(&request).await
                    } else {
                        Ok(CallOutcome::skipped())
                    }
                },
            );
            let graph_outcome = graph_outcome?;
            let vector_outcome = vector_outcome?;

            let vector_confidence = self.policy.vector_confidence(&vector_outcome.items);
            let (high, mid, low) = score_distribution(&vector_outcome.items);
            let mut diag = TierDiagnostics::at(tier);
            diag.graph_items = graph_outcome.items.len();
            diag.vector_items = vector_outcome.items.len();
            diag.vector_confidence = vector_confidence;
            diag.high_relevance = high;
            diag.mid_relevance = mid;
            diag.low_relevance = low;
            diag.graph_timed_out = graph_outcome.timed_out;
            diag.vector_timed_out = vector_outcome.timed_out;
            diag.graph_unavailable = graph_outcome.unavailable;
            diag.vector_unavailable = vector_outcome.unavailable;
            diagnostics.push(diag);
            tiers_used.push(tier);

            // Confidence check gates escalation, on this tier's own results.
            let confident = if use_vector {
                vector_confidence >= self.config.vector_confidence_floor
            } else {
                self.policy.graph_confident(&graph_outcome.items)
            };

            // Keep the last non-empty result per store: a deeper tier that
            // degraded to empty (timeout, unavailable) must not erase
            // evidence a shallower tier already returned.
            if !graph_outcome.items.is_empty() {
                graph_items = graph_outcome.items;
            }
            if !vector_outcome.items.is_empty() {
                vector_items = vector_outcome.items;
            }

            match (confident, tier.next()) {
                (false, Some(next)) => {
                    tracing::debug!(
                        from = %tier,
                        to = %next,
                        vector_confidence,
                        floor = self.config.vector_confidence_floor,
                        "confidence below floor, escalating"
                    );
                    escalated = true;
                    tier = next;
                }
                _ => break,
            }
        }

        let items = fusion::fuse(graph_items, vector_items);
        tracing::debug!(
            items = items.len(),
            escalated,
            cancelled,
            tiers = tiers_used.len(),
            "retrieval cycle complete"
        );

        Ok(EvidenceBundle {
            items,
            tiers_used,
            escalated,
            cancelled,
            diagnostics,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.adapter_timeout_ms)
    }

    async fn call_graph(&self, request: &SearchRequest) -> Result<CallOutcome, RetrieveError> {
        match tokio::time::timeout(self.timeout(), self.graph.search(request)).await {
            Ok(Ok(items)) => Ok(CallOutcome {
                items,
                timed_out: false,
                unavailable: false,
            }),
            Ok(Err(err)) => degrade("graph", err),
            Err(_) => {
                tracing::warn!(tier = %request.tier, "graph adapter call timed out");
                Ok(CallOutcome {
                    items: Vec::new(),
                    timed_out: true,
                    unavailable: false,
                })
            }
        }
    }

    async fn call_vector(&self, request: &SearchRequest) -> Result<CallOutcome, RetrieveError> {
        match tokio::time::timeout(self.timeout(), self.vector.search(request)).await {
            Ok(Ok(items)) => Ok(CallOutcome {
                items,
                timed_out: false,
                unavailable: false,
            }),
            Ok(Err(err)) => degrade("vector", err),
            Err(_) => {
                tracing::warn!(tier = %request.tier, "vector adapter call timed out");
                Ok(CallOutcome {
                    items: Vec::new(),
                    timed_out: true,
                    unavailable: false,
                })
            }
        }
    }
}

/// Map a driver error to either a fatal cycle error or a degraded
/// zero-confidence outcome for the tier.
fn degrade(store: &str, err: DriverError) -> Result<CallOutcome, RetrieveError> {
    if err.is_fatal() {
        return Err(RetrieveError::Misconfigured(err.to_string()));
    }
    tracing::warn!(store, error = %err, "store failure degraded to empty tier result");
    Ok(CallOutcome {
        items: Vec::new(),
        timed_out: false,
        unavailable: true,
    })
}
