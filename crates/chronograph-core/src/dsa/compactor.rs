//! Merges accumulated deltas back into a community's `full_content`.
//!
//! Ported from `graphrag_agent.community.summary.compactor.CommunityCompactor`.

use std::sync::Arc;

use chrono::Utc;

use crate::llm::{approximate_token_count, LlmClient};
use crate::store::{Community, CommunityDelta, GraphStore};

use super::error::{DsaError, Result};

const MERGE_PROMPT_PREFIX: &str =
    "Merge the base summary with the updates below into one unified summary, \
preserving overall structure:\n\n";

pub struct CommunityCompactor {
    store: Arc<dyn GraphStore>,
    llm: Arc<dyn LlmClient>,
    delta_count_threshold: usize,
    delta_token_threshold: i64,
}

impl CommunityCompactor {
    pub fn new(store: Arc<dyn GraphStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            store,
            llm,
            delta_count_threshold: 5,
            delta_token_threshold: 1000,
        }
    }

    pub fn with_thresholds(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmClient>,
        delta_count_threshold: usize,
        delta_token_threshold: i64,
    ) -> Self {
        Self {
            store,
            llm,
            delta_count_threshold,
            delta_token_threshold,
        }
    }

    fn needs_compaction(&self, deltas: &[CommunityDelta]) -> bool {
        let token_sum: i64 = deltas.iter().map(|d| d.summary_tokens).sum();
        deltas.len() > self.delta_count_threshold || token_sum > self.delta_token_threshold
    }

    /// Returns `Ok(None)` if there were no pending deltas to merge (a no-op,
    /// not an error). The deltas transitioned to `compacted` are exactly the
    /// id list read at the top of this call — anything inserted after that
    /// read is left `pending` for the next round, never silently absorbed.
    pub async fn compact_community(&self, community_id: &str) -> Result<Option<Community>> {
        let mut community = self
            .store
            .get_community(community_id)
            .await?
            .ok_or_else(|| DsaError::NoSuchCommunity(community_id.to_string()))?;

        let pending = self.store.pending_deltas(community_id).await?;
        if pending.is_empty() {
            return Ok(None);
        }

        let base = if community.full_content.is_empty() {
            community.summary.clone()
        } else {
            community.full_content.clone()
        };

        let bullets = pending.iter().map(|d| format!("- {}", d.summary)).collect::<Vec<_>>().join("\n");
        let merged = self
            .llm
            .complete(MERGE_PROMPT_PREFIX, &format!("{base}\n\n{bullets}"))
            .await
            .map_err(|e| DsaError::Llm(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        community.full_content = merged.clone();
        community.summary_tokens = approximate_token_count(&merged) as i64;
        community.last_compacted_at = Some(now.clone());
        self.store.upsert_community(&community).await?;

        let delta_ids: Vec<String> = pending.iter().map(|d| d.id.clone()).collect();
        self.store.mark_deltas_compacted(&delta_ids, &now).await?;

        tracing::info!(community_id, delta_count = delta_ids.len(), "compacted community deltas");
        Ok(Some(community))
    }

    /// Scans every community with pending deltas and compacts the ones
    /// crossing either threshold. A no-op for communities still below it.
    pub async fn compact_all(&self) -> Result<Vec<Community>> {
        let candidates = self.store.communities_with_pending_deltas().await?;
        let mut compacted = Vec::new();

        for community in candidates {
            let pending = self.store.pending_deltas(&community.id).await?;
            if self.needs_compaction(&pending) {
                if let Some(updated) = self.compact_community(&community.id).await? {
                    compacted.push(updated);
                }
            }
        }

        Ok(compacted)
    }

    /// Hard-deletes compacted deltas stamped more than `older_than_days` ago.
    /// Intended to run out-of-band, not on the write path.
    pub async fn cleanup_compacted_deltas(&self, older_than_days: i64) -> Result<u64> {
        let cutoff = (Utc::now() - chrono::Duration::days(older_than_days)).to_rfc3339();
        let deleted = self.store.delete_compacted_deltas_older_than(&cutoff).await?;
        tracing::info!(deleted, cutoff, "cleaned up compacted deltas");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DeltaStatus, SqliteGraphStore};
    use async_trait::async_trait;

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn complete(&self, _prompt: &str, _context: &str) -> crate::llm::Result<String> {
            Ok("Alice founded Acme; she also joined the board in 2023.".to_string())
        }
    }

    async fn seeded_store_with_deltas(n: usize) -> Arc<SqliteGraphStore> {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        store
            .upsert_community(&Community {
                id: "c1".into(),
                level: 0,
                title: "C1".into(),
                summary: "".into(),
                full_content: "Alice founded Acme.".into(),
                weight: 1.0,
                summary_tokens: 4,
                updated_at: None,
                last_compacted_at: None,
            })
            .await
            .unwrap();

        for i in 0..n {
            store
                .insert_delta(&CommunityDelta {
                    id: format!("d{i}"),
                    community_id: "c1".into(),
                    summary: format!("update {i}"),
                    summary_tokens: 10,
                    related_entities: vec![],
                    created_at: format!("2024-01-{:02}T00:00:00Z", i + 1),
                    compacted_at: None,
                    status: DeltaStatus::Pending,
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn compact_community_is_noop_with_no_pending_deltas() {
        let store = seeded_store_with_deltas(0).await;
        let compactor = CommunityCompactor::new(store, Arc::new(StubLlm));
        let result = compactor.compact_community("c1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn compact_community_merges_and_transitions_deltas() {
        let store = seeded_store_with_deltas(2).await;
        let compactor = CommunityCompactor::new(store.clone(), Arc::new(StubLlm));

        let updated = compactor.compact_community("c1").await.unwrap().unwrap();
        assert!(updated.full_content.contains("board"));
        assert!(updated.last_compacted_at.is_some());
        assert!(store.pending_deltas("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn compact_all_skips_communities_below_threshold() {
        let store = seeded_store_with_deltas(1).await;
        let compactor = CommunityCompactor::with_thresholds(store.clone(), Arc::new(StubLlm), 5, 1000);

        let compacted = compactor.compact_all().await.unwrap();
        assert!(compacted.is_empty());
        assert_eq!(store.pending_deltas("c1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn compact_all_compacts_communities_crossing_count_threshold() {
        let store = seeded_store_with_deltas(6).await;
        let compactor = CommunityCompactor::with_thresholds(store.clone(), Arc::new(StubLlm), 5, 1000);

        let compacted = compactor.compact_all().await.unwrap();
        assert_eq!(compacted.len(), 1);
        assert!(store.pending_deltas("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_only_deletes_old_compacted_deltas() {
        let store = seeded_store_with_deltas(2).await;
        let compactor = CommunityCompactor::new(store.clone(), Arc::new(StubLlm));
        compactor.compact_community("c1").await.unwrap();

        let deleted = compactor.cleanup_compacted_deltas(30).await.unwrap();
        assert_eq!(deleted, 0, "freshly compacted deltas are not yet older than 30 days");
    }
}
