//! The retrieval data model: tiers, evidence items, and bundles.
//!
//! An `EvidenceBundle` is owned by exactly one retrieval cycle. It is built
//! once, never mutated afterwards, and replaced wholesale by the next cycle.

use serde::{Deserialize, Serialize};

/// A retrieval depth level. Totally ordered: `Quick < Standard < Deep`.
///
/// Escalation only ever moves to a strictly deeper tier within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Quick,
    Standard,
    Deep,
}

impl Tier {
    /// The next deeper tier, or `None` at `Deep`.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Quick => Some(Tier::Standard),
            Tier::Standard => Some(Tier::Deep),
            Tier::Deep => None,
        }
    }

    /// Result-count ceiling for this tier.
    pub fn ceiling(self, ceilings: &crate::config::TierCeilings) -> usize {
        match self {
            Tier::Quick => ceilings.quick,
            Tier::Standard => ceilings.standard,
            Tier::Deep => ceilings.deep,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Quick => "quick",
            Tier::Standard => "standard",
            Tier::Deep => "deep",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an evidence item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    GraphNode,
    GraphRelationship,
    VectorDocument,
}

impl SourceKind {
    pub fn is_graph(self) -> bool {
        matches!(self, SourceKind::GraphNode | SourceKind::GraphRelationship)
    }
}

/// Uniquely identifies the origin record of an evidence item.
///
/// Always non-empty: constructors prefix the raw store identifier with
/// its namespace (`node:`, `rel:`, `doc:`), so keys from different stores
/// never collide as keys. Cross-store identity goes through `record_id`:
/// a graph node and a vector document indexing the same review compare
/// equal there, and fusion keeps only one of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProvenanceKey(String);

impl ProvenanceKey {
    pub fn node(id: impl AsRef<str>) -> Self {
        Self(format!("node:{}", id.as_ref()))
    }

    pub fn relationship(id: impl AsRef<str>) -> Self {
        Self(format!("rel:{}", id.as_ref()))
    }

    pub fn document(id: impl AsRef<str>) -> Self {
        Self(format!("doc:{}", id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw store identifier, without the namespace prefix.
    pub fn origin_id(&self) -> &str {
        self.0
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or(&self.0)
    }

    /// The identity of the underlying record, comparable across stores.
    ///
    /// Node identifiers carry a kind prefix (`review:review-7`) while the
    /// vector store indexes the same record as plain `review-7`; this
    /// strips both the namespace and, for nodes, that kind prefix.
    pub fn record_id(&self) -> &str {
        match self.0.split_once(':') {
            Some(("node", rest)) => rest.split_once(':').map(|(_, id)| id).unwrap_or(rest),
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }
}

impl std::fmt::Display for ProvenanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The content carried by an evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Payload {
    /// Free text (review excerpts, spec prose).
    Text(String),
    /// Structured facts (graph rows).
    Structured(serde_json::Value),
}

impl Payload {
    /// Render the payload as display text.
    pub fn render(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Structured(value) => value.to_string(),
        }
    }
}

/// A single retrieved unit of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: SourceKind,
    /// Relevance, normalized to [0,1]. Graph facts carry 1.0.
    pub score: f32,
    pub payload: Payload,
    pub provenance: ProvenanceKey,
}

impl EvidenceItem {
    /// Build an item, clamping the score into [0,1].
    pub fn new(source: SourceKind, score: f32, payload: Payload, provenance: ProvenanceKey) -> Self {
        Self {
            source,
            score: score.clamp(0.0, 1.0),
            payload,
            provenance,
        }
    }
}

/// What happened at one tier of one retrieval cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDiagnostics {
    pub tier: Tier,
    pub graph_items: usize,
    pub vector_items: usize,
    /// Top-k mean similarity of the vector results at this tier.
    pub vector_confidence: f32,
    /// Score distribution of vector results: high / mid / low relevance.
    pub high_relevance: usize,
    pub mid_relevance: usize,
    pub low_relevance: usize,
    /// A timed-out call is treated as empty for the tier but recorded
    /// here so callers can tell "no match" from "store unreachable".
    pub graph_timed_out: bool,
    pub vector_timed_out: bool,
    pub graph_unavailable: bool,
    pub vector_unavailable: bool,
}

impl TierDiagnostics {
    pub fn at(tier: Tier) -> Self {
        Self {
            tier,
            graph_items: 0,
            vector_items: 0,
            vector_confidence: 0.0,
            high_relevance: 0,
            mid_relevance: 0,
            low_relevance: 0,
            graph_timed_out: false,
            vector_timed_out: false,
            graph_unavailable: false,
            vector_unavailable: false,
        }
    }
}

/// Deduplicated, ranked evidence for one retrieval cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Fused items: graph-sourced facts first, then vector text by
    /// descending similarity; no two items share a provenance key, and
    /// no vector document doubles a graph-returned record.
    pub items: Vec<EvidenceItem>,
    /// Tiers visited, in visit order (always non-decreasing).
    pub tiers_used: Vec<Tier>,
    /// Whether any escalation happened.
    pub escalated: bool,
    /// Whether the cycle was abandoned by cancellation.
    pub cancelled: bool,
    /// Per-tier diagnostics, one entry per visited tier.
    pub diagnostics: Vec<TierDiagnostics>,
}

impl EvidenceBundle {
    /// A bundle for a cycle that issued no retrieval at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The deepest tier that was visited, if any retrieval ran.
    pub fn deepest_tier(&self) -> Option<Tier> {
        self.tiers_used.iter().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_order_is_total() {
        assert!(Tier::Quick < Tier::Standard);
        assert!(Tier::Standard < Tier::Deep);
        assert_eq!(Tier::Deep.next(), None);
        assert_eq!(Tier::Quick.next(), Some(Tier::Standard));
    }

    #[test]
    fn tier_ceilings_resolve() {
        let ceilings = crate::config::TierCeilings::default();
        assert_eq!(Tier::Quick.ceiling(&ceilings), 15);
        assert_eq!(Tier::Standard.ceiling(&ceilings), 50);
        assert_eq!(Tier::Deep.ceiling(&ceilings), 100);
    }

    #[test]
    fn provenance_keys_are_namespaced_and_non_empty() {
        let node = ProvenanceKey::node("review-42");
        let doc = ProvenanceKey::document("review-42");
        assert_eq!(node.as_str(), "node:review-42");
        assert_eq!(doc.origin_id(), "review-42");
        assert_ne!(node, doc, "namespaces keep node and doc keys distinct");
        assert!(!node.as_str().is_empty());
    }

    #[test]
    fn record_id_matches_across_stores() {
        let node = ProvenanceKey::node("review:review-42");
        let doc = ProvenanceKey::document("review-42");
        assert_ne!(node, doc);
        assert_eq!(node.record_id(), doc.record_id());
        assert_eq!(node.record_id(), "review-42");
        // Relationship ids keep their full identity.
        let rel = ProvenanceKey::relationship("EVALUATES:review:r1->series:Model Y");
        assert_eq!(rel.record_id(), "EVALUATES:review:r1->series:Model Y");
    }

    #[test]
    fn same_record_same_namespace_collides() {
        assert_eq!(
            ProvenanceKey::document("r1"),
            ProvenanceKey::document("r1")
        );
    }

    #[test]
    fn evidence_score_is_clamped() {
        let item = EvidenceItem::new(
            SourceKind::VectorDocument,
            1.7,
            Payload::Text("x".into()),
            ProvenanceKey::document("d"),
        );
        assert_eq!(item.score, 1.0);
    }

    #[test]
    fn empty_bundle_has_no_tiers() {
        let bundle = EvidenceBundle::empty();
        assert!(bundle.is_empty());
        assert_eq!(bundle.deepest_tier(), None);
        assert!(!bundle.escalated);
    }
}
