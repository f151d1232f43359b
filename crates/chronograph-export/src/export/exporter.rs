//! Queries the graph store and assembles export pages/entities. Ported from
//! `integrations.skill_seekers.exporter.GraphRAGExporter`.

use std::sync::Arc;

use chronograph_core::{GraphStore, PropertyValue, TemporalEntity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;

use super::config::ExportConfig;

/// When no community filter narrows a chunk export, cap the scan so an
/// unbounded export doesn't walk the entire chunk table.
pub const DEFAULT_CHUNK_LIMIT: usize = 1000;

/// A source-document chunk, supplied by the caller rather than queried: the
/// graph store's wire schema (§6.1) has no chunk node, so raw chunk storage
/// is out of scope for `chronograph-core` and lives upstream of this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub content: String,
    pub file_name: String,
    pub page: Option<i64>,
    pub community_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Full,
    Delta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub url: String,
    pub content: String,
    pub content_type: String,
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEntity {
    pub entity_id: String,
    pub name: String,
    pub r#type: String,
    pub description: String,
    pub relationships: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub pages: Vec<Page>,
    pub entities: Vec<ExportedEntity>,
    pub metadata: Value,
    pub dedup_report: Value,
}

impl ExportResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

pub struct Exporter {
    store: Arc<dyn GraphStore>,
    config: ExportConfig,
    dsa_enabled: bool,
}

impl Exporter {
    pub fn new(store: Arc<dyn GraphStore>, config: ExportConfig, dsa_enabled: bool) -> Self {
        Self { store, config, dsa_enabled }
    }

    pub async fn export(
        &self,
        mode: ExportMode,
        level: Option<i64>,
        changed_community_ids: Option<&[String]>,
        chunks: &[ChunkRecord],
    ) -> Result<ExportResult> {
        let export_timestamp = chrono::Utc::now().to_rfc3339();
        let level = level.unwrap_or(self.config.default_level);

        tracing::info!(?mode, level, "starting export");

        let communities = match (mode, changed_community_ids) {
            (ExportMode::Delta, Some(ids)) if !ids.is_empty() => {
                self.export_communities_by_ids(ids, level).await?
            }
            _ => self.export_communities(level).await?,
        };

        let entities = self.export_entities(self.config.include_relationships).await?;

        let selected_chunks: Vec<&ChunkRecord> = if self.config.include_chunks {
            if communities.is_empty() {
                tracing::warn!(
                    limit = DEFAULT_CHUNK_LIMIT,
                    "no community filter for chunk export; limiting scan"
                );
                chunks.iter().take(DEFAULT_CHUNK_LIMIT).collect()
            } else {
                let community_ids: Vec<&str> = communities.iter().map(|c| c.community_id.as_str()).collect();
                chunks
                    .iter()
                    .filter(|c| c.community_ids.iter().any(|id| community_ids.contains(&id.as_str())))
                    .collect()
            }
        } else {
            Vec::new()
        };

        let pages = self.build_pages(&communities, &selected_chunks);

        let metadata = json!({
            "type": "graphrag",
            "graph_name": "knowledge-graph",
            "export_timestamp": export_timestamp,
            "export_mode": match mode { ExportMode::Full => "full", ExportMode::Delta => "delta" },
            "community_level": level,
            "dsa_enabled": self.dsa_enabled,
        });

        let result = ExportResult { pages, entities, metadata, dedup_report: json!({}) };
        tracing::info!(pages = result.page_count(), entities = result.entity_count(), "export complete");
        Ok(result)
    }

    async fn export_communities(&self, level: i64) -> Result<Vec<CommunityRow>> {
        let communities = self.store.list_communities(level).await?;
        let mut out = Vec::with_capacity(communities.len());
        for community in communities {
            if let Some(max) = self.config.max_communities {
                if out.len() >= max {
                    break;
                }
            }
            let deltas = self.store.pending_deltas(&community.id).await?;
            out.push(self.to_community_row(community, deltas));
        }
        Ok(out)
    }

    async fn export_communities_by_ids(&self, ids: &[String], level: i64) -> Result<Vec<CommunityRow>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(community) = self.store.get_community(id).await? else { continue };
            if community.level != level {
                continue;
            }
            let deltas = self.store.pending_deltas(&community.id).await?;
            out.push(self.to_community_row(community, deltas));
        }
        Ok(out)
    }

    fn to_community_row(&self, community: chronograph_core::Community, deltas: Vec<chronograph_core::CommunityDelta>) -> CommunityRow {
        let base = if self.config.summary_field == "summary" {
            community.summary.clone()
        } else if !community.full_content.is_empty() {
            community.full_content.clone()
        } else {
            community.summary.clone()
        };

        let mut content = base;
        let mut has_pending_deltas = false;
        let delta_count = deltas.len();
        if self.config.include_delta_summaries && !deltas.is_empty() {
            let bullets = deltas.iter().map(|d| d.summary.clone()).collect::<Vec<_>>().join("\n");
            content = format!("{content}\n\n[Recent Updates]:\n{bullets}");
            has_pending_deltas = true;
        }

        CommunityRow {
            community_id: community.id,
            title: community.title,
            level: community.level,
            weight: community.weight,
            content,
            has_pending_deltas,
            delta_count,
        }
    }

    async fn export_entities(&self, include_relationships: bool) -> Result<Vec<ExportedEntity>> {
        let entities = self.store.list_entities().await?;
        let relationships = if include_relationships { self.store.list_relationships().await? } else { Vec::new() };

        let mut out = Vec::with_capacity(entities.len());
        for entity in entities {
            let description = entity_description(&entity);
            let rel_strings = if include_relationships {
                relationships
                    .iter()
                    .filter(|r| r.source_id == entity.id)
                    .map(|r| format!("{}:{}", r.r#type, r.target_id))
                    .collect()
            } else {
                Vec::new()
            };

            out.push(ExportedEntity {
                entity_id: entity.id.clone(),
                name: entity.name.clone(),
                r#type: entity.label.clone(),
                description,
                relationships: rel_strings,
                merged_from: None,
            });
        }

        tracing::info!(count = out.len(), "exported entities");
        Ok(out)
    }

    fn build_pages(&self, communities: &[CommunityRow], chunks: &[&ChunkRecord]) -> Vec<Page> {
        let mut pages = Vec::with_capacity(communities.len() + chunks.len());

        for community in communities {
            let mut metadata = json!({
                "community_id": community.community_id,
                "level": community.level,
                "weight": community.weight,
            });
            if community.has_pending_deltas {
                metadata["has_pending_deltas"] = json!(true);
                metadata["delta_count"] = json!(community.delta_count);
            }

            pages.push(Page {
                title: community.title.clone(),
                url: format!("graphrag://community/{}", community.community_id),
                content: community.content.clone(),
                content_type: "community_summary".to_string(),
                metadata,
                is_duplicate: None,
                duplicate_of: None,
            });
        }

        for chunk in chunks {
            pages.push(Page {
                title: format!("Reference: {}", chunk.file_name),
                url: format!("graphrag://chunk/{}", chunk.chunk_id),
                content: chunk.content.clone(),
                content_type: "reference".to_string(),
                metadata: json!({
                    "chunk_id": chunk.chunk_id,
                    "file_name": chunk.file_name,
                    "page": chunk.page,
                }),
                is_duplicate: None,
                duplicate_of: None,
            });
        }

        pages
    }
}

struct CommunityRow {
    community_id: String,
    title: String,
    level: i64,
    weight: f64,
    content: String,
    has_pending_deltas: bool,
    delta_count: usize,
}

fn entity_description(entity: &TemporalEntity) -> String {
    match entity.properties.get("description") {
        Some(PropertyValue::String(s)) => s.clone(),
        _ => String::new(),
    }
}
