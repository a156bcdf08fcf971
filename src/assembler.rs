//! Result assembler — turn a fused bundle into a citable context block.
//!
//! The assembler is the seam between retrieval and generation: downstream
//! prompting consumes the rendered block verbatim, so structure matters.
//! Graph facts render first under their own header (they are authoritative),
//! vector excerpts follow under a header that marks them as supporting
//! material. Every item carries a stable citation label (`G1`, `V3`) tied
//! to its provenance key so answers can be traced back to store records.

use crate::evidence::{EvidenceBundle, EvidenceItem, ProvenanceKey, SourceKind, Tier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GRAPH_SECTION_HEADER: &str = "=== 结构化数据（知识图谱） ===";
const VECTOR_SECTION_HEADER: &str = "=== 相关评论与文档（语义检索，仅供参考） ===";

/// Every tier, including deep, came back empty.
///
/// Not a failure of the pipeline: the caller should answer honestly that
/// no evidence was found instead of letting generation improvise.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no evidence matched at any retrieval tier")]
pub struct EmptyEvidence;

/// One evidence item with its citation label attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitedItem {
    /// `G<n>` for graph facts, `V<n>` for vector excerpts.
    pub label: String,
    pub source: SourceKind,
    pub score: f32,
    pub text: String,
    pub provenance: ProvenanceKey,
}

/// The assembled output of one successful retrieval cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledEvidence {
    /// The rendered context block handed to generation.
    pub context_block: String,
    /// The cited items, in rendered order.
    pub items: Vec<CitedItem>,
    /// Whether items beyond the render cap were dropped.
    pub truncated: bool,
    /// The deepest tier the cycle visited.
    pub deepest_tier: Option<Tier>,
}

/// Renders fused evidence into the generation-facing context block.
pub struct Assembler {
    max_rendered: usize,
}

impl Assembler {
    pub fn new(max_rendered: usize) -> Self {
        Self {
            max_rendered: max_rendered.max(1),
        }
    }

    /// Assemble a bundle, or report that nothing matched.
    pub fn assemble(&self, bundle: &EvidenceBundle) -> Result<AssembledEvidence, EmptyEvidence> {
        if bundle.is_empty() {
            return Err(EmptyEvidence);
        }

        let truncated = bundle.items.len() > self.max_rendered;
        let rendered = &bundle.items[..bundle.items.len().min(self.max_rendered)];

        let mut items = Vec::with_capacity(rendered.len());
        let mut graph_count = 0usize;
        let mut vector_count = 0usize;
        for item in rendered {
            let label = if item.source.is_graph() {
                graph_count += 1;
                format!("G{graph_count}")
            } else {
                vector_count += 1;
                format!("V{vector_count}")
            };
            items.push(cite(label, item));
        }

        let mut block = String::new();
        let graph_items: Vec<&CitedItem> = items.iter().filter(|i| i.source.is_graph()).collect();
        let vector_items: Vec<&CitedItem> =
            items.iter().filter(|i| !i.source.is_graph()).collect();

        if !graph_items.is_empty() {
            block.push_str(GRAPH_SECTION_HEADER);
            block.push('\n');
            for item in &graph_items {
                block.push_str(&format!("[{}] {}\n", item.label, item.text));
            }
        }
        if !vector_items.is_empty() {
            if !block.is_empty() {
                block.push('\n');
            }
            block.push_str(VECTOR_SECTION_HEADER);
            block.push('\n');
            for item in &vector_items {
                block.push_str(&format!(
                    "[{}] (相关度 {:.2}) {}\n",
                    item.label, item.score, item.text
                ));
            }
        }
        if truncated {
            block.push_str(&format!(
                "\n（已截断：共 {} 条证据，仅展示前 {} 条）\n",
                bundle.items.len(),
                self.max_rendered
            ));
        }

        tracing::debug!(
            rendered = items.len(),
            total = bundle.items.len(),
            truncated,
            "assembled evidence context"
        );

        Ok(AssembledEvidence {
            context_block: block,
            items,
            truncated,
            deepest_tier: bundle.deepest_tier(),
        })
    }
}

fn cite(label: String, item: &EvidenceItem) -> CitedItem {
    CitedItem {
        label,
        source: item.source,
        score: item.score,
        text: item.payload.render(),
        provenance: item.provenance.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Payload;

    fn graph_item(id: &str) -> EvidenceItem {
        EvidenceItem::new(
            SourceKind::GraphNode,
            1.0,
            Payload::Structured(serde_json::json!({"name": id})),
            ProvenanceKey::node(id),
        )
    }

    fn vector_item(id: &str, score: f32) -> EvidenceItem {
        EvidenceItem::new(
            SourceKind::VectorDocument,
            score,
            Payload::Text(format!("评论 {id}")),
            ProvenanceKey::document(id),
        )
    }

    fn bundle(items: Vec<EvidenceItem>) -> EvidenceBundle {
        EvidenceBundle {
            items,
            tiers_used: vec![Tier::Quick],
            escalated: false,
            cancelled: false,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn empty_bundle_is_empty_evidence() {
        let assembler = Assembler::new(20);
        assert!(matches!(
            assembler.assemble(&EvidenceBundle::empty()),
            Err(EmptyEvidence)
        ));
    }

    #[test]
    fn labels_number_each_source_independently() {
        let assembler = Assembler::new(20);
        let assembled = assembler
            .assemble(&bundle(vec![
                graph_item("n1"),
                graph_item("n2"),
                vector_item("d1", 0.8),
            ]))
            .unwrap();

        let labels: Vec<&str> = assembled.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["G1", "G2", "V1"]);
    }

    #[test]
    fn graph_section_renders_before_vector_section() {
        let assembler = Assembler::new(20);
        let assembled = assembler
            .assemble(&bundle(vec![graph_item("n1"), vector_item("d1", 0.7)]))
            .unwrap();

        let graph_at = assembled.context_block.find("知识图谱").unwrap();
        let vector_at = assembled.context_block.find("语义检索").unwrap();
        assert!(graph_at < vector_at);
        assert!(assembled.context_block.contains("[G1]"));
        assert!(assembled.context_block.contains("[V1]"));
    }

    #[test]
    fn vector_only_bundle_omits_graph_header() {
        let assembler = Assembler::new(20);
        let assembled = assembler
            .assemble(&bundle(vec![vector_item("d1", 0.9)]))
            .unwrap();
        assert!(!assembled.context_block.contains("知识图谱"));
        assert!(assembled.context_block.contains("仅供参考"));
    }

    #[test]
    fn render_cap_truncates_and_flags() {
        let assembler = Assembler::new(3);
        let items: Vec<EvidenceItem> =
            (0..10).map(|i| vector_item(&format!("d{i}"), 0.5)).collect();
        let assembled = assembler.assemble(&bundle(items)).unwrap();

        assert!(assembled.truncated);
        assert_eq!(assembled.items.len(), 3);
        assert!(assembled.context_block.contains("已截断"));
    }

    #[test]
    fn provenance_survives_into_citations() {
        let assembler = Assembler::new(20);
        let assembled = assembler
            .assemble(&bundle(vec![vector_item("review-7", 0.6)]))
            .unwrap();
        assert_eq!(
            assembled.items[0].provenance,
            ProvenanceKey::document("review-7")
        );
    }
}
