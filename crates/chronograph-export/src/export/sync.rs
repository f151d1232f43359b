//! Tracks which communities have already been exported so delta exports can
//! scope themselves to what changed. Ported from
//! `integrations.skill_seekers.sync_manager.GraphRAGSkillSyncManager`.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chronograph_core::GraphStore;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SyncState {
    #[serde(skip_serializing_if = "Option::is_none")]
    last_export_ts: Option<String>,
    #[serde(default)]
    community_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_export_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_export_level: Option<i64>,
    #[serde(default)]
    export_count: u64,
}

pub struct SyncManager {
    store: Arc<dyn GraphStore>,
    sync_state_path: PathBuf,
    state: SyncState,
}

impl SyncManager {
    pub fn new(store: Arc<dyn GraphStore>, sync_state_path: impl Into<PathBuf>) -> Self {
        let sync_state_path = sync_state_path.into();
        let state = Self::load_state(&sync_state_path);
        Self { store, sync_state_path, state }
    }

    fn load_state(path: &PathBuf) -> SyncState {
        if !path.exists() {
            return SyncState::default();
        }
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to parse sync state, starting fresh");
                SyncState::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read sync state, starting fresh");
                SyncState::default()
            }
        }
    }

    fn save_state(&self) {
        if let Some(parent) = self.sync_state_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(error = %e, "failed to create sync state directory");
                return;
            }
        }
        match serde_json::to_string_pretty(&self.state) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&self.sync_state_path, serialized) {
                    tracing::error!(error = %e, "failed to write sync state");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize sync state"),
        }
    }

    pub fn last_export_timestamp(&self) -> Option<&str> {
        self.state.last_export_ts.as_deref()
    }

    pub fn exported_community_ids(&self) -> HashSet<String> {
        self.state.community_ids.iter().cloned().collect()
    }

    /// Absent state means every community at `level` is pending.
    pub async fn get_pending_updates(&self, level: i64) -> Result<Vec<String>> {
        if self.last_export_timestamp().is_none() {
            return Ok(self.all_community_ids(level).await?);
        }

        let mut changed: HashSet<String> = HashSet::new();

        let communities = self.store.list_communities(level).await?;
        let previous = self.state.last_export_ts.as_deref();
        for community in &communities {
            if let (Some(updated_at), Some(previous)) = (&community.updated_at, previous) {
                if updated_at.as_str() > previous {
                    changed.insert(community.id.clone());
                }
            }
        }

        let pending = self.store.communities_with_pending_deltas().await?;
        for community in pending.into_iter().filter(|c| c.level == level) {
            changed.insert(community.id);
        }

        let all_ids: HashSet<String> = communities.iter().map(|c| c.id.clone()).collect();
        let exported = self.exported_community_ids();
        changed.extend(all_ids.difference(&exported).cloned());

        Ok(changed.into_iter().collect())
    }

    async fn all_community_ids(&self, level: i64) -> Result<Vec<String>> {
        Ok(self.store.list_communities(level).await?.into_iter().map(|c| c.id).collect())
    }

    /// Full export replaces the tracked set; delta export unions into it.
    pub fn mark_synced(&mut self, community_ids: &[String], export_mode: &str, level: i64) {
        if export_mode == "full" {
            self.state.community_ids = community_ids.to_vec();
        } else {
            let mut existing: HashSet<String> = self.state.community_ids.iter().cloned().collect();
            existing.extend(community_ids.iter().cloned());
            self.state.community_ids = existing.into_iter().collect();
        }

        self.state.last_export_ts = Some(chrono::Utc::now().to_rfc3339());
        self.state.last_export_mode = Some(export_mode.to_string());
        self.state.last_export_level = Some(level);
        self.state.export_count += 1;

        self.save_state();
    }

    pub fn reset_state(&mut self) {
        self.state = SyncState::default();
        if self.sync_state_path.exists() {
            let _ = fs::remove_file(&self.sync_state_path);
        }
    }

    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "last_export_timestamp": self.state.last_export_ts,
            "exported_community_count": self.state.community_ids.len(),
            "last_export_mode": self.state.last_export_mode,
            "last_export_level": self.state.last_export_level,
            "export_count": self.state.export_count,
            "sync_state_path": self.sync_state_path.to_string_lossy(),
            "has_previous_export": self.state.last_export_ts.is_some(),
        })
    }
}
