//! Batched writer that persists a [`TemporalKg`] to a [`GraphStore`].
//!
//! Ported from `graphrag_agent.graph.extraction.temporal_writer.Neo4jTemporalWriter`:
//! fixed-size batches, entities before relationships, batch-then-single-item
//! retry on failure, label/type sanitization, and update-vs-replace merge
//! semantics for relationship observations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::kg::entity::{sanitize_identifier, DEFAULT_ENTITY_LABEL, DEFAULT_RELATIONSHIP_TYPE};
use crate::kg::{TemporalEntity, TemporalKg, TemporalRelationship};

use super::error::Result;
use super::graph_store::GraphStore;

/// Update (append, default) accumulates observations onto an existing edge;
/// Replace overwrites them — used for reindexing / corrective passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Update,
    Replace,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        MergeStrategy::Update
    }
}

/// Result of `write_temporal_kg`: counts of entities/relationships written.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WriteReport {
    pub entities: usize,
    pub relationships: usize,
}

pub struct TemporalWriter {
    store: Arc<dyn GraphStore>,
    batch_size: usize,
}

impl TemporalWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store, batch_size: 50 }
    }

    pub fn with_batch_size(store: Arc<dyn GraphStore>, batch_size: usize) -> Self {
        Self { store, batch_size: batch_size.max(1) }
    }

    fn sanitize_entity(entity: &TemporalEntity) -> TemporalEntity {
        let mut sanitized = entity.clone();
        sanitized.label = sanitize_identifier(&entity.label, DEFAULT_ENTITY_LABEL);
        sanitized
    }

    fn sanitize_relationship(relationship: &TemporalRelationship) -> TemporalRelationship {
        let mut sanitized = relationship.clone();
        sanitized.r#type = sanitize_identifier(&relationship.r#type, DEFAULT_RELATIONSHIP_TYPE);
        sanitized.strip_reserved_properties();
        sanitized
    }

    /// Write all entities, then all relationships, in `batch_size` chunks.
    /// On a batch exception, retries survivors one at a time; each
    /// single-item failure is logged with its ids and skipped — the call
    /// never aborts the whole KG for one bad edge.
    pub async fn write_temporal_kg(&self, kg: &TemporalKg, strategy: MergeStrategy) -> Result<WriteReport> {
        if kg.is_empty() {
            tracing::warn!("write_temporal_kg called with an empty KG; nothing to write");
            return Ok(WriteReport::default());
        }

        let entities_written = self.write_entities_batched(&kg.entities).await?;
        let relationships_written = self
            .write_relationships_batched(&kg.relationships, strategy)
            .await?;

        Ok(WriteReport {
            entities: entities_written,
            relationships: relationships_written,
        })
    }

    /// Each batch is attempted item-by-item; a failing item is logged with
    /// its id and skipped rather than aborting the batch or the whole KG —
    /// this collapses the Python's "bulk-then-retry-singly" two-pass dance
    /// into one pass, since this store's `upsert_entity` is already
    /// single-item (there is no bulk write call whose failure needs a
    /// separate retry path).
    async fn write_entities_batched(&self, entities: &[TemporalEntity]) -> Result<usize> {
        let mut written = 0;
        for batch in entities.chunks(self.batch_size) {
            for entity in batch {
                let sanitized = Self::sanitize_entity(entity);
                match self.store.upsert_entity(&sanitized).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::error!(entity_id = %entity.id, error = %e, "failed to write entity, skipping");
                    }
                }
            }
        }
        Ok(written)
    }

    async fn write_relationships_batched(
        &self,
        relationships: &[TemporalRelationship],
        strategy: MergeStrategy,
    ) -> Result<usize> {
        let mut written = 0;
        for batch in relationships.chunks(self.batch_size) {
            for relationship in batch {
                let sanitized = Self::sanitize_relationship(relationship);
                match self.store.upsert_relationship(&sanitized, strategy).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::error!(
                            source_id = %relationship.source_id,
                            target_id = %relationship.target_id,
                            error = %e,
                            "failed to write relationship, skipping"
                        );
                    }
                }
            }
        }
        Ok(written)
    }
}
