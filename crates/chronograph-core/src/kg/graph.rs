//! In-memory temporal knowledge graph, the unit of work an extraction call
//! produces before the writer persists it. Ported from
//! `graphrag_agent.graph.structure.temporal_kg.TemporalKnowledgeGraph`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{PropertyValue, TemporalEntity, TemporalRelationship};

/// Polymorphic chunk input normalized in exactly one place (`ChunkInput::normalize`),
/// replacing the duck-typed `chunk_doc.page_content` / `text` / `content` dispatch
/// in `atom_adapter._extract_atomic_facts`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkInput {
    Text(String),
    Document {
        content: String,
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },
    Bag {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        page_content: Option<String>,
    },
}

impl ChunkInput {
    /// Normalize to a non-empty text fact, or `None` if the chunk yields nothing
    /// usable. Mirrors the try-in-order + strip + drop-empty behavior of the
    /// original adapter.
    pub fn normalize(&self) -> Option<String> {
        let raw = match self {
            ChunkInput::Text(s) => Some(s.clone()),
            ChunkInput::Document { content, .. } => Some(content.clone()),
            ChunkInput::Bag {
                page_content,
                text,
                content,
            } => page_content
                .clone()
                .or_else(|| text.clone())
                .or_else(|| content.clone()),
        };

        raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }
}

/// In-memory temporal KG: the unit an `ExtractionAdapter` call produces.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalKg {
    pub entities: Vec<TemporalEntity>,
    pub relationships: Vec<TemporalRelationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub observation_times: Vec<f64>,
}

/// A node + optional set of `atom_*`-prefixed relationship properties, the
/// shape `to_graph_documents` emits for downstream writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocumentNode {
    pub id: String,
    pub label: String,
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocumentEdge {
    pub source_id: String,
    pub target_id: String,
    pub r#type: String,
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphDocumentNode>,
    pub edges: Vec<GraphDocumentEdge>,
}

impl TemporalKg {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Build a `TemporalKg` from an externally-extracted KG plus the
    /// observation time(s) of this extraction call.
    pub fn from_atom_kg(
        entities: Vec<TemporalEntity>,
        relationships: Vec<TemporalRelationship>,
        observation_times: Vec<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            entities,
            relationships,
            created_at: Some(now),
            last_updated: Some(now),
            observation_times,
        }
    }

    /// Inverse of `from_atom_kg`: hands back the entities, relationships, and
    /// observation times in the same shape `from_atom_kg` consumes, so
    /// `from_atom_kg(kg.to_atom_kg())` reconstructs an equivalent KG (up to
    /// `created_at`/`last_updated`, which `from_atom_kg` always stamps fresh).
    /// Embeddings are already plain numeric vectors in this representation —
    /// there is no numpy-array intermediate to restore from, unlike the
    /// original this was ported from.
    pub fn to_atom_kg(&self) -> (Vec<TemporalEntity>, Vec<TemporalRelationship>, Vec<f64>) {
        (
            self.entities.clone(),
            self.relationships.clone(),
            self.observation_times.clone(),
        )
    }

    /// Emit one document bundle: every entity as a node (de-duped by id;
    /// dangling edge endpoints get a stub node), every relationship as an
    /// edge carrying its temporal fields prefixed `atom_*`.
    pub fn to_graph_documents(&self) -> GraphDocument {
        let mut nodes_by_id: HashMap<String, GraphDocumentNode> = HashMap::new();

        for entity in &self.entities {
            nodes_by_id.insert(
                entity.id.clone(),
                GraphDocumentNode {
                    id: entity.id.clone(),
                    label: entity.label.clone(),
                    properties: entity.properties.clone(),
                },
            );
        }

        let mut edges = Vec::with_capacity(self.relationships.len());
        for rel in &self.relationships {
            for endpoint in [&rel.source_id, &rel.target_id] {
                nodes_by_id.entry(endpoint.clone()).or_insert_with(|| {
                    let stub = TemporalEntity::stub(endpoint.clone());
                    GraphDocumentNode {
                        id: stub.id,
                        label: stub.label,
                        properties: stub.properties,
                    }
                });
            }

            let mut properties = rel.properties.clone();
            properties.insert(
                "atom_t_obs".to_string(),
                PropertyValue::List(rel.t_obs.iter().copied().map(PropertyValue::Number).collect()),
            );
            properties.insert(
                "atom_t_start".to_string(),
                PropertyValue::List(rel.t_start.iter().copied().map(PropertyValue::Number).collect()),
            );
            properties.insert(
                "atom_t_end".to_string(),
                PropertyValue::List(rel.t_end.iter().copied().map(PropertyValue::Number).collect()),
            );
            properties.insert(
                "atom_atomic_facts".to_string(),
                PropertyValue::List(
                    rel.atomic_facts
                        .iter()
                        .cloned()
                        .map(PropertyValue::String)
                        .collect(),
                ),
            );
            properties.insert("atom_confidence".to_string(), PropertyValue::Number(rel.confidence));
            if let Some(embeddings) = &rel.embeddings {
                properties.insert(
                    "atom_embeddings".to_string(),
                    PropertyValue::List(
                        embeddings
                            .iter()
                            .map(|v| PropertyValue::Number(*v as f64))
                            .collect(),
                    ),
                );
            }

            edges.push(GraphDocumentEdge {
                source_id: rel.source_id.clone(),
                target_id: rel.target_id.clone(),
                r#type: rel.r#type.clone(),
                properties,
            });
        }

        GraphDocument {
            nodes: nodes_by_id.into_values().collect(),
            edges,
        }
    }

    /// Concatenate entities and relationships **without de-duplication** —
    /// de-dup is the extractor's job elsewhere. Union-sorts observation
    /// times; `created_at` is the earlier of the two, `last_updated` is now.
    ///
    /// This is a deliberate carry-over of the original `merge()` contract,
    /// not an oversight — see the resolved Open Question in DESIGN.md.
    pub fn merge(&self, other: &TemporalKg) -> TemporalKg {
        let mut entities = self.entities.clone();
        entities.extend(other.entities.clone());

        let mut relationships = self.relationships.clone();
        relationships.extend(other.relationships.clone());

        let mut times: HashSet<u64> = HashSet::new();
        let mut observation_times: Vec<f64> = Vec::new();
        for t in self.observation_times.iter().chain(other.observation_times.iter()) {
            if times.insert(t.to_bits()) {
                observation_times.push(*t);
            }
        }
        observation_times.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let created_at = match (self.created_at, other.created_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };

        TemporalKg {
            entities,
            relationships,
            created_at,
            last_updated: Some(Utc::now()),
            observation_times,
        }
    }
}
