//! Query analysis — classify, extract entities, score, route.
//!
//! `QueryAnalyzer::analyze` is a pure function of the (query, context
//! window) pair: identical inputs always produce the identical
//! `RoutingDecision`. No store is touched here.

mod complexity;
mod entities;
mod intent;
mod types;

pub use intent::{GREETING_RESPONSE, MALFORMED_RESPONSE, META_RESPONSE};
pub use types::{
    EntityOrigin, Query, QueryCategory, ResolvedEntity, RoutingDecision, RoutingTarget, TargetMode,
};

use crate::vocab::{EntityKind, EntityVocabulary};
use std::sync::Arc;
use thiserror::Error;

/// Keywords asking for structured vehicle attributes only.
const SPEC_KEYWORDS: &[&str] = &[
    "参数", "价格", "售价", "多少钱", "加速", "座位", "尺寸", "电池容量", "spec", "price",
];

/// Keywords asking for subjective feedback; these keep vector retrieval in.
const OPINION_KEYWORDS: &[&str] = &[
    "评价", "口碑", "怎么样", "觉得", "体验", "吐槽", "满意", "反馈", "评论", "review",
];

/// Errors the analyzer surfaces to the caller.
///
/// Ambiguity is the only analyzer error: the caller turns it into a
/// clarification prompt instead of guessing a resolution.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("ambiguous entity reference; candidates: {}", candidates.join(", "))]
    AmbiguousEntity { candidates: Vec<String> },
}

/// Produces a `RoutingDecision` for each query.
pub struct QueryAnalyzer {
    vocab: Arc<dyn EntityVocabulary>,
}

impl QueryAnalyzer {
    pub fn new(vocab: Arc<dyn EntityVocabulary>) -> Self {
        Self { vocab }
    }

    /// Analyze one query against its conversation window.
    pub fn analyze(&self, query: &Query) -> Result<RoutingDecision, AnalyzeError> {
        let text = query.text().trim();

        // Unparseable input routes to no-retrieval with a safe reply.
        if text.is_empty() || text.chars().all(|c| !c.is_alphanumeric()) {
            return Ok(RoutingDecision::no_retrieval(
                QueryCategory::Malformed,
                MALFORMED_RESPONSE,
            ));
        }

        let mut resolved = entities::extract_from_query(self.vocab.as_ref(), text);
        let inherited = entities::inherit_from_context(text, &resolved, query.history())
            .map_err(|candidates| AnalyzeError::AmbiguousEntity { candidates })?;
        resolved.extend(inherited);

        match intent::classify(text, !resolved.is_empty()) {
            QueryCategory::Greeting => {
                return Ok(RoutingDecision::no_retrieval(
                    QueryCategory::Greeting,
                    GREETING_RESPONSE,
                ));
            }
            QueryCategory::Meta => {
                return Ok(RoutingDecision::no_retrieval(
                    QueryCategory::Meta,
                    META_RESPONSE,
                ));
            }
            QueryCategory::Malformed => {
                return Ok(RoutingDecision::no_retrieval(
                    QueryCategory::Malformed,
                    MALFORMED_RESPONSE,
                ));
            }
            QueryCategory::Domain => {}
        }

        let comparison = complexity::is_comparison(text, &resolved);
        let score = complexity::score(text, resolved.len(), comparison);
        let target = route(query.mode(), text, &resolved);

        Ok(RoutingDecision {
            target,
            category: QueryCategory::Domain,
            complexity: score,
            entities: resolved,
            initial_tier: complexity::initial_tier(comparison),
            direct_response: None,
        })
    }
}

/// Pick the store target for a domain query.
///
/// - Pure structured-attribute questions about named vehicles go graph-only,
///   except in drafting mode: a document draft needs the full evidence base
///   even when the question reads like a spec lookup.
/// - Comparison queries with no resolved entities have nothing to filter
///   the graph by, so they go vector-only (the original skipped the graph
///   when no brand was extracted).
/// - Everything else is hybrid: user-insight always wants persona graph
///   data, drafting always wants the full evidence base, and hybrid is the
///   safe superset whenever classification is uncertain.
fn route(mode: TargetMode, text: &str, resolved: &[ResolvedEntity]) -> RoutingTarget {
    let lowered = text.to_lowercase();
    let wants_spec = SPEC_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    let wants_opinion = OPINION_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    let has_vehicle = resolved.iter().any(|e| {
        matches!(
            e.kind,
            EntityKind::Brand | EntityKind::Series | EntityKind::Model
        )
    });

    if mode != TargetMode::DocumentDrafting && wants_spec && !wants_opinion && has_vehicle {
        return RoutingTarget::GraphOnly;
    }
    if mode == TargetMode::CompetitorComparison && resolved.is_empty() {
        return RoutingTarget::VectorOnly;
    }
    RoutingTarget::Hybrid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Tier;
    use crate::session::Turn;
    use crate::vocab::StaticVocabulary;

    fn analyzer() -> QueryAnalyzer {
        let vocab = StaticVocabulary::new()
            .with_entity(EntityKind::Brand, "特斯拉", ["Tesla"])
            .with_entity(EntityKind::Brand, "理想汽车", ["理想"])
            .with_entity(EntityKind::Brand, "AITO 问界", ["问界"])
            .with_entity(EntityKind::Series, "Model Y", Vec::<String>::new())
            .with_entity(EntityKind::Series, "理想 L7", ["理想L7"])
            .with_entity(EntityKind::Series, "问界 M5", ["问界M5"]);
        QueryAnalyzer::new(Arc::new(vocab))
    }

    #[test]
    fn entity_question_routes_hybrid_at_quick() {
        let query = Query::new(
            "Model Y的用户对内饰有什么评价？",
            TargetMode::UserInsight,
        );
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::Hybrid);
        assert_eq!(decision.initial_tier, Tier::Quick);
        assert_eq!(decision.entity_names(), vec!["Model Y"]);
    }

    #[test]
    fn comparison_query_starts_at_standard() {
        let query = Query::new("对比问界M5和理想L7", TargetMode::CompetitorComparison);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.initial_tier, Tier::Standard);
        assert!(decision.entity_names().contains(&"问界 M5"));
        assert!(decision.entity_names().contains(&"理想 L7"));
    }

    #[test]
    fn greeting_bypasses_retrieval_with_direct_response() {
        let query = Query::new("你好", TargetMode::UserInsight);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::NoRetrieval);
        assert!(decision.direct_response.is_some());
    }

    #[test]
    fn malformed_input_routes_no_retrieval() {
        let query = Query::new("？！。。。", TargetMode::UserInsight);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::NoRetrieval);
        assert_eq!(decision.category, QueryCategory::Malformed);
    }

    #[test]
    fn pronoun_inherits_entity_from_history() {
        let history = vec![Turn::new("Model Y怎么样", "...")
            .with_entity(EntityKind::Series, "Model Y")];
        let query =
            Query::new("它的续航怎么样", TargetMode::UserInsight).with_history(history);
        let decision = analyzer().analyze(&query).unwrap();
        let inherited: Vec<_> = decision
            .entities
            .iter()
            .filter(|e| e.origin == EntityOrigin::Context)
            .collect();
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].name, "Model Y");
    }

    #[test]
    fn ambiguous_reference_surfaces_clarification() {
        let history = vec![Turn::new("对比", "...")
            .with_entity(EntityKind::Series, "Model Y")
            .with_entity(EntityKind::Series, "理想 L7")];
        let query =
            Query::new("它的续航怎么样", TargetMode::UserInsight).with_history(history);
        let err = analyzer().analyze(&query).unwrap_err();
        assert!(matches!(err, AnalyzeError::AmbiguousEntity { .. }));
    }

    #[test]
    fn spec_only_question_routes_graph_only() {
        let query = Query::new("Model Y的价格和加速参数", TargetMode::CompetitorComparison);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::GraphOnly);
    }

    #[test]
    fn drafting_mode_spec_question_stays_hybrid() {
        let query = Query::new("Model Y的价格和加速参数", TargetMode::DocumentDrafting);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::Hybrid);
    }

    #[test]
    fn comparison_mode_without_entities_routes_vector_only() {
        let query = Query::new("20万左右的纯电SUV有哪些值得买", TargetMode::CompetitorComparison);
        let decision = analyzer().analyze(&query).unwrap();
        assert_eq!(decision.target, RoutingTarget::VectorOnly);
    }

    #[test]
    fn decision_is_deterministic() {
        let query = Query::new("Model Y的用户对内饰有什么评价？", TargetMode::UserInsight);
        let a = analyzer().analyze(&query).unwrap();
        let b = analyzer().analyze(&query).unwrap();
        assert_eq!(a.target, b.target);
        assert_eq!(a.complexity, b.complexity);
        assert_eq!(a.entities, b.entities);
    }
}
