//! Confidence signals — is this tier's result set good enough?
//!
//! The exact formula is a policy, not a constant of the system: the default
//! is the top-k mean similarity of the vector results (k from config), which
//! rewards a few strong hits without being diluted by the long tail a deep
//! tier drags in. Graph confidence is simply the presence of structured data.

use crate::evidence::EvidenceItem;

/// Similarity at or above which a hit counts as highly relevant.
pub const HIGH_RELEVANCE_FLOOR: f32 = 0.67;

/// Similarity at or above which a hit counts as moderately relevant.
pub const MID_RELEVANCE_FLOOR: f32 = 0.33;

/// Pluggable confidence formula for vector result sets.
pub trait ConfidencePolicy: Send + Sync {
    /// Confidence in [0,1] for a tier's vector results. Empty input is 0.
    fn vector_confidence(&self, items: &[EvidenceItem]) -> f32;

    /// Graph results are confident when any structured data matched.
    fn graph_confident(&self, items: &[EvidenceItem]) -> bool {
        !items.is_empty()
    }
}

/// Default policy: mean similarity of the k best-scoring items.
#[derive(Debug, Clone)]
pub struct TopKMeanPolicy {
    pub k: usize,
}

impl TopKMeanPolicy {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }
}

impl ConfidencePolicy for TopKMeanPolicy {
    fn vector_confidence(&self, items: &[EvidenceItem]) -> f32 {
        if items.is_empty() {
            return 0.0;
        }
        let mut scores: Vec<f32> = items.iter().map(|i| i.score).collect();
        scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let top = &scores[..scores.len().min(self.k)];
        top.iter().sum::<f32>() / top.len() as f32
    }
}

/// Count items in the high / mid / low relevance bands.
pub fn score_distribution(items: &[EvidenceItem]) -> (usize, usize, usize) {
    let mut high = 0;
    let mut mid = 0;
    let mut low = 0;
    for item in items {
        if item.score >= HIGH_RELEVANCE_FLOOR {
            high += 1;
        } else if item.score >= MID_RELEVANCE_FLOOR {
            mid += 1;
        } else {
            low += 1;
        }
    }
    (high, mid, low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Payload, ProvenanceKey, SourceKind};

    fn item(id: &str, score: f32) -> EvidenceItem {
        EvidenceItem::new(
            SourceKind::VectorDocument,
            score,
            Payload::Text(String::new()),
            ProvenanceKey::document(id),
        )
    }

    #[test]
    fn empty_results_have_zero_confidence() {
        assert_eq!(TopKMeanPolicy::new(10).vector_confidence(&[]), 0.0);
    }

    #[test]
    fn top_k_ignores_the_long_tail() {
        // Two strong hits plus a pile of noise: with k=2 the noise is invisible.
        let mut items = vec![item("a", 0.9), item("b", 0.8)];
        items.extend((0..20).map(|i| item(&format!("noise{i}"), 0.05)));

        let policy = TopKMeanPolicy::new(2);
        let confidence = policy.vector_confidence(&items);
        assert!((confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn k_larger_than_result_set_uses_all() {
        let items = vec![item("a", 0.4), item("b", 0.6)];
        let confidence = TopKMeanPolicy::new(10).vector_confidence(&items);
        assert!((confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn graph_confidence_is_presence() {
        let policy = TopKMeanPolicy::new(10);
        assert!(!policy.graph_confident(&[]));
        assert!(policy.graph_confident(&[item("g", 1.0)]));
    }

    #[test]
    fn distribution_bands_partition_items() {
        let items = vec![item("h", 0.9), item("m", 0.5), item("l", 0.1)];
        assert_eq!(score_distribution(&items), (1, 1, 1));
    }
}
