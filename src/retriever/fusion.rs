//! Fusion — merge graph and vector evidence into one ranked, deduplicated list.
//!
//! Ranking rule: graph-sourced structured facts first (exact matches on
//! resolved entities outrank similarity guesses), then vector text by
//! descending similarity. Ties break on provenance key so the output is
//! fully deterministic. Items sharing a provenance key collapse to one,
//! and a vector document whose record the graph already returned is
//! dropped: the same review indexed in both stores is one piece of
//! evidence, and the structured fact wins.

use crate::evidence::EvidenceItem;
use std::collections::HashSet;

/// Fuse one tier's final graph and vector results.
pub fn fuse(graph: Vec<EvidenceItem>, vector: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut graph = graph;
    let mut vector = vector;

    // Deterministic order within each source.
    let by_score_then_key = |a: &EvidenceItem, b: &EvidenceItem| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.provenance.cmp(&b.provenance))
    };
    graph.sort_by(by_score_then_key);
    vector.sort_by(by_score_then_key);

    let mut seen: HashSet<String> = HashSet::new();
    let mut graph_records: HashSet<String> = HashSet::new();
    let mut fused = Vec::with_capacity(graph.len() + vector.len());

    for item in graph {
        if seen.insert(item.provenance.as_str().to_string()) {
            graph_records.insert(item.provenance.record_id().to_string());
            fused.push(item);
        }
    }
    for item in vector {
        if graph_records.contains(item.provenance.record_id()) {
            continue;
        }
        if seen.insert(item.provenance.as_str().to_string()) {
            fused.push(item);
        }
    }
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Payload, ProvenanceKey, SourceKind};

    fn graph_item(id: &str) -> EvidenceItem {
        EvidenceItem::new(
            SourceKind::GraphNode,
            1.0,
            Payload::Structured(serde_json::json!({"id": id})),
            ProvenanceKey::node(id),
        )
    }

    fn vector_item(id: &str, score: f32) -> EvidenceItem {
        EvidenceItem::new(
            SourceKind::VectorDocument,
            score,
            Payload::Text(id.into()),
            ProvenanceKey::document(id),
        )
    }

    #[test]
    fn graph_facts_rank_before_vector_text() {
        let fused = fuse(vec![graph_item("n1")], vec![vector_item("d1", 0.99)]);
        assert_eq!(fused[0].source, SourceKind::GraphNode);
        assert_eq!(fused[1].source, SourceKind::VectorDocument);
    }

    #[test]
    fn vector_items_rank_by_similarity_descending() {
        let fused = fuse(
            Vec::new(),
            vec![vector_item("low", 0.2), vector_item("high", 0.9)],
        );
        assert_eq!(fused[0].provenance, ProvenanceKey::document("high"));
    }

    #[test]
    fn duplicate_provenance_collapses_to_one() {
        // Same raw id in the same namespace: a re-ranked duplicate.
        let fused = fuse(
            Vec::new(),
            vec![vector_item("r1", 0.9), vector_item("r1", 0.9)],
        );
        assert_eq!(fused.len(), 1);
    }

    #[test]
    fn graph_record_suppresses_its_vector_double() {
        // The same review indexed in both stores: node `review:r1` in the
        // graph, document `r1` in the vector store.
        let graph = vec![EvidenceItem::new(
            SourceKind::GraphNode,
            1.0,
            Payload::Structured(serde_json::json!({"text": "内饰太简陋"})),
            ProvenanceKey::node("review:r1"),
        )];
        let fused = fuse(graph, vec![vector_item("r1", 0.9), vector_item("r2", 0.8)]);

        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].source, SourceKind::GraphNode);
        assert_eq!(fused[1].provenance, ProvenanceKey::document("r2"));
    }

    #[test]
    fn no_two_outputs_share_a_provenance_key() {
        let fused = fuse(
            vec![graph_item("a"), graph_item("b"), graph_item("a")],
            vec![vector_item("a", 0.5), vector_item("c", 0.4)],
        );
        let mut keys: Vec<&str> = fused.iter().map(|i| i.provenance.as_str()).collect();
        let before = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn equal_scores_break_ties_by_provenance_key() {
        let fused = fuse(
            Vec::new(),
            vec![vector_item("b", 0.5), vector_item("a", 0.5)],
        );
        assert_eq!(fused[0].provenance, ProvenanceKey::document("a"));
    }

    #[test]
    fn fusing_empties_is_empty() {
        assert!(fuse(Vec::new(), Vec::new()).is_empty());
    }
}
