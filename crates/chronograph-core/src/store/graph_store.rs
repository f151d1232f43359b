//! The `GraphStore` trait: the labeled-property graph backing store this
//! crate writes to and reads from. Shape grounded on the async-trait
//! `GraphStore`/`LlmConnector` pattern used for pluggable storage backends —
//! `Send + Sync` trait objects so callers can hold `Arc<dyn GraphStore>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::kg::{TemporalEntity, TemporalKg, TemporalRelationship};

use super::error::Result;
use super::writer::MergeStrategy;

/// §3.2 Community node.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    pub level: i64,
    pub title: String,
    pub summary: String,
    pub full_content: String,
    pub weight: f64,
    pub summary_tokens: i64,
    pub updated_at: Option<String>,
    pub last_compacted_at: Option<String>,
}

/// §3.2 CommunityDelta status. `Compacted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaStatus {
    Pending,
    Compacted,
}

impl DeltaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaStatus::Pending => "pending",
            DeltaStatus::Compacted => "compacted",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "compacted" => DeltaStatus::Compacted,
            _ => DeltaStatus::Pending,
        }
    }
}

/// §3.2 CommunityDelta node, attached to a Community via `HAS_DELTA`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDelta {
    pub id: String,
    pub community_id: String,
    pub summary: String,
    pub summary_tokens: i64,
    pub related_entities: Vec<String>,
    pub created_at: String,
    pub compacted_at: Option<String>,
    pub status: DeltaStatus,
}

/// The graph store this crate persists a [`TemporalKg`] into and reads
/// community/delta state from. One implementation, [`super::SqliteGraphStore`].
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_entity(&self, entity: &TemporalEntity) -> Result<()>;

    async fn upsert_relationship(
        &self,
        relationship: &TemporalRelationship,
        strategy: MergeStrategy,
    ) -> Result<()>;

    async fn get_entity(&self, id: &str) -> Result<Option<TemporalEntity>>;

    async fn get_relationship(&self, source_id: &str, target_id: &str, r#type: &str)
        -> Result<Option<TemporalRelationship>>;

    async fn get_community(&self, id: &str) -> Result<Option<Community>>;

    async fn list_communities(&self, level: i64) -> Result<Vec<Community>>;

    /// Every entity in the store, for export/dedup sweeps that need the
    /// full set rather than a single community's membership.
    async fn list_entities(&self) -> Result<Vec<TemporalEntity>>;

    /// Every relationship in the store.
    async fn list_relationships(&self) -> Result<Vec<TemporalRelationship>>;

    /// Every community (any level) with at least one `pending` delta,
    /// the sweep set `compact_all` drives its per-threshold checks over.
    async fn communities_with_pending_deltas(&self) -> Result<Vec<Community>>;

    async fn upsert_community(&self, community: &Community) -> Result<()>;

    async fn community_member_ids(&self, community_id: &str) -> Result<Vec<String>>;

    async fn set_community_members(&self, community_id: &str, entity_ids: &[String]) -> Result<()>;

    /// Relationships whose both endpoints are in `entity_ids`, excluding
    /// community-membership edges (there are none in this store — membership
    /// is a dedicated table, not an edge type, so this is a plain filter).
    async fn relationships_among(&self, entity_ids: &[String]) -> Result<Vec<TemporalRelationship>>;

    async fn insert_delta(&self, delta: &CommunityDelta) -> Result<()>;

    async fn pending_deltas(&self, community_id: &str) -> Result<Vec<CommunityDelta>>;

    async fn mark_deltas_compacted(&self, delta_ids: &[String], compacted_at: &str) -> Result<()>;

    async fn delete_compacted_deltas_older_than(&self, cutoff: &str) -> Result<u64>;

    async fn health_check(&self) -> Result<()>;
}

/// Persist every entity and relationship in `kg`, without batching or retry
/// policy — that lives in [`super::TemporalWriter`], which drives this trait.
#[async_trait]
pub trait GraphStoreExt: GraphStore {
    async fn write_kg_unbatched(&self, kg: &TemporalKg, strategy: MergeStrategy) -> Result<()> {
        for entity in &kg.entities {
            self.upsert_entity(entity).await?;
        }
        for relationship in &kg.relationships {
            self.upsert_relationship(relationship, strategy).await?;
        }
        Ok(())
    }
}

impl<T: GraphStore + ?Sized> GraphStoreExt for T {}
