//! Graph adapter — structured evidence from the graph store.

use super::traits::{
    GraphDriver, GraphQuery, GraphRowKind, RelationshipType, SearchRequest,
};
use crate::analyzer::TargetMode;
use crate::evidence::{EvidenceItem, Payload, ProvenanceKey, SourceKind};
use std::sync::Arc;

/// Structured graph facts carry full relevance: they are exact matches on
/// resolved entities, not similarity guesses.
pub const GRAPH_FACT_SCORE: f32 = 1.0;

/// Translates search requests into graph queries and rows into evidence.
pub struct GraphAdapter {
    driver: Arc<dyn GraphDriver>,
}

impl GraphAdapter {
    pub fn new(driver: Arc<dyn GraphDriver>) -> Self {
        Self { driver }
    }

    /// Relationship types worth expanding for a given mode.
    ///
    /// User insight always wants persona priorities; comparison wants the
    /// brand/series/model spine for spec lookups plus review sentiment;
    /// drafting wants everything.
    fn relationship_types(mode: TargetMode) -> Vec<RelationshipType> {
        match mode {
            TargetMode::UserInsight => vec![
                RelationshipType::Prioritizes,
                RelationshipType::Evaluates,
                RelationshipType::Mentions,
            ],
            TargetMode::CompetitorComparison => vec![
                RelationshipType::BelongsToSeries,
                RelationshipType::BelongsToBrand,
                RelationshipType::Evaluates,
                RelationshipType::Mentions,
            ],
            TargetMode::DocumentDrafting => RelationshipType::ALL.to_vec(),
        }
    }

    /// Run one bounded search against the graph store.
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<EvidenceItem>, super::traits::DriverError> {
        let query = GraphQuery {
            entity_filter: request.entities.clone(),
            relationship_types: Self::relationship_types(request.mode),
            limit: request.limit,
        };

        let rows = self.driver.fetch(&query).await?;
        tracing::debug!(
            rows = rows.len(),
            tier = %request.tier,
            "graph adapter fetched rows"
        );

        Ok(rows
            .into_iter()
            .take(request.limit)
            .map(|row| {
                let (source, provenance) = match row.kind {
                    GraphRowKind::Node => {
                        (SourceKind::GraphNode, ProvenanceKey::node(&row.id))
                    }
                    GraphRowKind::Relationship => (
                        SourceKind::GraphRelationship,
                        ProvenanceKey::relationship(&row.id),
                    ),
                };
                let mut payload = row.payload;
                if let serde_json::Value::Object(ref mut map) = payload {
                    map.insert("label".into(), serde_json::Value::String(row.label));
                }
                EvidenceItem::new(source, GRAPH_FACT_SCORE, Payload::Structured(payload), provenance)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::MockGraphDriver;
    use crate::adapter::traits::GraphRow;
    use crate::evidence::Tier;

    fn request(limit: usize, mode: TargetMode) -> SearchRequest {
        SearchRequest {
            query_text: "Model Y".into(),
            entities: Vec::new(),
            tier: Tier::Quick,
            mode,
            limit,
        }
    }

    fn node_row(id: &str) -> GraphRow {
        GraphRow {
            id: id.into(),
            kind: GraphRowKind::Node,
            label: id.into(),
            payload: serde_json::json!({"name": id}),
        }
    }

    #[tokio::test]
    async fn rows_map_to_graph_evidence() {
        let driver = Arc::new(MockGraphDriver::with_rows(vec![
            node_row("model:Model Y"),
            GraphRow {
                id: "rel:1".into(),
                kind: GraphRowKind::Relationship,
                label: "Model Y BELONGS_TO_SERIES".into(),
                payload: serde_json::json!({}),
            },
        ]));
        let adapter = GraphAdapter::new(driver);

        let items = adapter
            .search(&request(10, TargetMode::CompetitorComparison))
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, SourceKind::GraphNode);
        assert_eq!(items[0].score, GRAPH_FACT_SCORE);
        assert_eq!(items[1].source, SourceKind::GraphRelationship);
        assert!(items.iter().all(|i| !i.provenance.as_str().is_empty()));
    }

    #[tokio::test]
    async fn results_are_bounded_by_limit() {
        let rows: Vec<GraphRow> = (0..20).map(|i| node_row(&format!("n{i}"))).collect();
        let adapter = GraphAdapter::new(Arc::new(MockGraphDriver::with_rows(rows)));

        let items = adapter
            .search(&request(5, TargetMode::UserInsight))
            .await
            .unwrap();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn user_insight_expands_persona_priorities() {
        let types = GraphAdapter::relationship_types(TargetMode::UserInsight);
        assert!(types.contains(&RelationshipType::Prioritizes));
    }
}
