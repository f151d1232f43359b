//! Template data model: segments, the template itself, and the lightweight
//! listing record. Ported from
//! `graphrag_agent...templates.template_registry.{Segment,Template,TemplateInfo}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSpec {
    pub r#type: String,
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub transform: Option<TransformSpec>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub constraints: Option<Value>,
    #[serde(default)]
    pub relationships: Vec<String>,
}

fn default_format() -> String {
    "markdown".to_string()
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub version: String,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Template {
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }

    pub fn get_segment(&self, key: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.key == key)
    }

    pub fn required_segments(&self) -> Vec<&Segment> {
        self.segments.iter().filter(|s| s.required).collect()
    }

    pub fn repeatable_segments(&self) -> Vec<&Segment> {
        self.segments.iter().filter(|s| s.repeatable).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: String,
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub segment_count: usize,
}

impl TemplateInfo {
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}

/// Lowercase, `-`-joined, alphanumeric-or-CJK segments, no leading/trailing/
/// doubled `-`, non-empty. Used for skill-name validation, not template ids.
/// Validates kebab-case skill names; rejects, never repairs. A name with a
/// leading/trailing/doubled dash, an empty segment, or a segment containing
/// anything but lowercase alphanumerics is `None` — it is not lowercased or
/// collapsed into a fixed form.
pub fn canonicalize_skill_name(name: &str) -> Option<String> {
    if name.is_empty() || name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        return None;
    }
    for segment in name.split('-') {
        if segment.is_empty() {
            return None;
        }
        for c in segment.chars() {
            if !c.is_alphanumeric() || (c.is_alphabetic() && c.is_uppercase()) {
                return None;
            }
        }
    }
    Some(name.to_string())
}
