//! Writes small "what just changed" summaries for communities touched by an
//! incremental ingest, avoiding whole-community regeneration on every write.
//!
//! Ported from `graphrag_agent.community.summary.delta_summarizer.DeltaSummarizer`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::llm::{approximate_token_count, LlmClient};
use crate::store::{CommunityDelta, DeltaStatus, GraphStore};

use super::error::Result;

/// "New information only" framing, not a full-rewrite request — kept terse so
/// callers can see the whole prompt shape at a glance.
const DELTA_PROMPT_PREFIX: &str = "Summarize only the new information below (50-200 words). \
Do not rewrite or restate anything already known:\n\n";

pub struct DeltaSummarizer {
    store: Arc<dyn GraphStore>,
    llm: Arc<dyn LlmClient>,
    enabled: bool,
}

impl DeltaSummarizer {
    pub fn new(store: Arc<dyn GraphStore>, llm: Arc<dyn LlmClient>, enabled: bool) -> Self {
        Self { store, llm, enabled }
    }

    /// `targets`: community id -> entity ids touched by the triggering write.
    /// Returns one record per successfully stored delta; entities/targets that
    /// don't survive the community-membership filter are silently skipped.
    pub async fn process_deltas(
        &self,
        targets: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<CommunityDelta>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let mut deltas = Vec::new();
        for (community_id, entity_ids) in targets {
            if let Some(delta) = self.process_one(community_id, entity_ids).await? {
                deltas.push(delta);
            }
        }
        Ok(deltas)
    }

    async fn process_one(&self, community_id: &str, entity_ids: &[String]) -> Result<Option<CommunityDelta>> {
        let members: std::collections::HashSet<String> =
            self.store.community_member_ids(community_id).await?.into_iter().collect();
        let filtered: Vec<String> = entity_ids.iter().filter(|id| members.contains(*id)).cloned().collect();

        if filtered.is_empty() {
            tracing::debug!(community_id, "no target entities belong to this community, skipping delta");
            return Ok(None);
        }

        let relationships = self.store.relationships_among(&filtered).await?;
        let context = relationships
            .iter()
            .flat_map(|r| r.atomic_facts.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let summary = self
            .llm
            .complete(DELTA_PROMPT_PREFIX, &context)
            .await
            .map_err(|e| super::error::DsaError::Llm(e.to_string()))?;

        let delta = CommunityDelta {
            id: format!("delta-{}", Uuid::new_v4()),
            community_id: community_id.to_string(),
            summary_tokens: approximate_token_count(&summary) as i64,
            summary,
            related_entities: filtered,
            created_at: Utc::now().to_rfc3339(),
            compacted_at: None,
            status: DeltaStatus::Pending,
        };

        self.store.insert_delta(&delta).await?;
        tracing::info!(community_id, delta_id = %delta.id, "wrote community delta");
        Ok(Some(delta))
    }
}

/// Merges a base summary with pending deltas for display. Only prepends the
/// `[Recent Updates]` header when `base` is non-empty, matching the Python
/// exactly (an empty base with deltas reads as just the bullet list).
pub fn merge_summaries_for_read(base: &str, deltas: &[CommunityDelta]) -> String {
    if deltas.is_empty() {
        return base.to_string();
    }

    let bullets = deltas
        .iter()
        .map(|d| format!("- {}", d.summary))
        .collect::<Vec<_>>()
        .join("\n");

    if base.is_empty() {
        bullets
    } else {
        format!("{base}\n\n[Recent Updates]:\n{bullets}")
    }
}
