//! Vector adapter — semantic evidence from the vector store.
//!
//! Driver distances are normalized to similarities with
//! `sim = clamp(1 - distance / max_distance, 0, 1)`, so a zero-distance hit
//! scores 1.0 and anything at or past `max_distance` scores 0.0.

use super::traits::{DriverError, SearchRequest, VectorDriver, VectorQuery};
use crate::evidence::{EvidenceItem, Payload, ProvenanceKey, SourceKind};
use std::sync::Arc;

/// Translates search requests into vector queries and ranked documents
/// into scored evidence.
pub struct VectorAdapter {
    driver: Arc<dyn VectorDriver>,
    max_distance: f32,
}

impl VectorAdapter {
    pub fn new(driver: Arc<dyn VectorDriver>, max_distance: f32) -> Self {
        Self {
            driver,
            max_distance,
        }
    }

    /// Normalize a raw store distance into a [0,1] similarity.
    pub fn normalize(&self, distance: f32) -> f32 {
        (1.0 - distance / self.max_distance).clamp(0.0, 1.0)
    }

    /// Run one bounded nearest-neighbor search.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<EvidenceItem>, DriverError> {
        let query = VectorQuery {
            text: request.query_text.clone(),
            entity_filter: request.entities.iter().map(|e| e.name.clone()).collect(),
            limit: request.limit,
        };

        let documents = self.driver.search(&query).await?;
        tracing::debug!(
            documents = documents.len(),
            tier = %request.tier,
            "vector adapter searched"
        );

        Ok(documents
            .into_iter()
            .take(request.limit)
            .map(|doc| {
                EvidenceItem::new(
                    SourceKind::VectorDocument,
                    self.normalize(doc.distance),
                    Payload::Text(doc.text),
                    ProvenanceKey::document(&doc.id),
                )
            })
            .collect())
    }
}
