//! Temporal graph entities — the 5-tuple relationship core and its endpoints.
//!
//! Mirrors `graphrag_agent.graph.structure.temporal_kg.TemporalEntity` /
//! `TemporalRelationship`: an entity is a node with a sanitized label, a
//! relationship is the append-only observation record between two entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A scalar or list-of-scalar property value.
///
/// Stand-in for the dynamically-typed `dict` values the original Python
/// entities/relationships carry in `properties`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<PropertyValue>),
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

pub type PropertyMap = HashMap<String, PropertyValue>;

/// Default label assigned to a node whose sanitized label would otherwise be empty.
pub const DEFAULT_ENTITY_LABEL: &str = "Entity";
/// Default relationship type assigned when sanitization would otherwise leave nothing.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATED";

/// A node in the temporal knowledge graph.
///
/// `label` is always the *sanitized* form (see [`sanitize_identifier`]); callers
/// that need the original display string keep it in `properties` or `name`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalEntity {
    pub id: String,
    pub name: String,
    #[serde(default = "default_entity_label")]
    pub label: String,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

fn default_entity_label() -> String {
    DEFAULT_ENTITY_LABEL.to_string()
}

impl TemporalEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: name.into(),
            id,
            label: default_entity_label(),
            properties: PropertyMap::new(),
            embeddings: None,
        }
    }

    /// Synthesize a stub entity for a dangling relationship endpoint, matching
    /// `to_graph_documents`'s `Node(id=rel.source_id, type="entity", properties={"name": rel.source_id})`.
    pub fn stub(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut properties = PropertyMap::new();
        properties.insert("name".to_string(), PropertyValue::String(id.clone()));
        Self {
            name: id.clone(),
            id,
            label: "entity".to_string(),
            properties,
            embeddings: None,
        }
    }
}

/// The 5-tuple core: `(source_id, predicate/type, target_id, valid_start, valid_end)`
/// plus append-only observation provenance.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalRelationship {
    pub source_id: String,
    pub target_id: String,
    #[serde(default = "default_relationship_type")]
    pub r#type: String,
    /// Append-only: every observation adds one entry, never reordered or rewritten.
    #[serde(default)]
    pub t_obs: Vec<f64>,
    #[serde(default)]
    pub t_start: Vec<f64>,
    #[serde(default)]
    pub t_end: Vec<f64>,
    /// Verbatim source sentences that produced this edge; append-only.
    #[serde(default)]
    pub atomic_facts: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

fn default_relationship_type() -> String {
    DEFAULT_RELATIONSHIP_TYPE.to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl TemporalRelationship {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            r#type: default_relationship_type(),
            t_obs: Vec::new(),
            t_start: Vec::new(),
            t_end: Vec::new(),
            atomic_facts: Vec::new(),
            confidence: default_confidence(),
            properties: PropertyMap::new(),
            embeddings: None,
        }
    }

    /// Append one observation. Never rewrites or reorders prior entries.
    pub fn observe(&mut self, t_obs: f64, atomic_fact: impl Into<String>) {
        self.t_obs.push(t_obs);
        self.atomic_facts.push(atomic_fact.into());
    }

    /// Append a closed validity interval.
    pub fn observe_interval(&mut self, t_start: f64, t_end: f64) {
        self.t_start.push(t_start);
        self.t_end.push(t_end);
    }

    /// `|t_start| == |t_end|` when all intervals are closed; unclosed ones
    /// are tracked only via `t_obs` having more entries than `t_start`.
    pub fn intervals_balanced(&self) -> bool {
        self.t_start.len() == self.t_end.len()
    }

    /// Reserved `atom_*` property keys that must never live in the generic
    /// `properties` map — see `temporal_writer._filter_relationship_properties`.
    pub const RESERVED_PROPERTY_KEYS: &'static [&'static str] = &[
        "atom_t_obs",
        "atom_t_start",
        "atom_t_end",
        "atom_atomic_facts",
        "atom_confidence",
        "atom_embeddings",
    ];

    /// Drop any reserved temporal keys that leaked into `properties`.
    pub fn strip_reserved_properties(&mut self) {
        for key in Self::RESERVED_PROPERTY_KEYS {
            self.properties.remove(*key);
        }
    }
}

/// Replace any character outside `[A-Za-z0-9_一-龥]` with `_`, collapse
/// runs of `_`, trim leading/trailing `_`. Ported from
/// `temporal_writer.LABEL_PATTERN` / `_sanitize_label`.
pub fn sanitize_identifier(raw: &str, default: &str) -> String {
    let mut replaced = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let is_cjk = ('\u{4e00}'..='\u{9fa5}').contains(&ch);
        if ch.is_ascii_alphanumeric() || ch == '_' || is_cjk {
            replaced.push(ch);
        } else {
            replaced.push('_');
        }
    }

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for ch in replaced.chars() {
        if ch == '_' {
            if !prev_underscore {
                collapsed.push('_');
            }
            prev_underscore = true;
        } else {
            collapsed.push(ch);
            prev_underscore = false;
        }
    }

    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
