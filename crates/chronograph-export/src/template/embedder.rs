//! Round-trip template metadata embedded in exported skill markdown as a
//! single HTML comment. Ported from
//! `templates.template_embedder.TemplateEmbedder`.
//!
//! The embedded JSON is located by brace-depth counting with string/escape
//! awareness (§6.3): a regex-only scan would mis-locate the closing brace
//! whenever a segment value itself contains `}`.

use serde_json::{json, Value};

use super::model::Template;

const META_PREFIX: &str = "<!-- TEMPLATE_META: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Top,
    Bottom,
}

pub struct TemplateEmbedder {
    pub include_segments: bool,
}

impl TemplateEmbedder {
    pub fn new(include_segments: bool) -> Self {
        Self { include_segments }
    }

    pub fn embed_in_skill(&self, skill_content: &str, template: &Template, position: Position) -> String {
        let metadata = self.build_metadata(template);
        let comment = format!("{META_PREFIX}{} -->", compact_json(&metadata));

        if let Some((start, end)) = find_json_in_comment(skill_content).map(|(_, s, e)| (s, e)) {
            let mut out = String::with_capacity(skill_content.len() + comment.len());
            out.push_str(&skill_content[..start]);
            out.push_str(&comment);
            out.push_str(&skill_content[end..]);
            return out;
        }

        match position {
            Position::Top => format!("{comment}\n\n{}", skill_content.trim_start()),
            Position::Bottom => format!("{}\n\n{comment}\n", skill_content.trim_end()),
        }
    }

    pub fn extract_from_skill(&self, skill_content: &str) -> Option<Value> {
        let (json_str, _, _) = find_json_in_comment(skill_content)?;
        serde_json::from_str(&json_str).ok()
    }

    pub fn remove_from_skill(&self, skill_content: &str) -> String {
        let Some((_, start, end)) = find_json_in_comment(skill_content) else {
            return skill_content.to_string();
        };

        let mut out = String::new();
        out.push_str(&skill_content[..start]);
        out.push_str(&skill_content[end..]);

        collapse_blank_lines(out.trim_start_matches('\n'))
    }

    pub fn update_metadata(&self, skill_content: &str, template: &Template, position: Position) -> String {
        self.embed_in_skill(skill_content, template, position)
    }

    pub fn has_metadata(&self, skill_content: &str) -> bool {
        find_json_in_comment(skill_content).is_some()
    }

    pub fn get_template_identifier(&self, skill_content: &str) -> Option<String> {
        let meta = self.extract_from_skill(skill_content)?;
        let id = meta.get("id")?.as_str()?;
        let version = meta.get("version")?.as_str()?;
        Some(format!("{id}@{version}"))
    }

    fn build_metadata(&self, template: &Template) -> Value {
        let mut metadata = serde_json::Map::new();
        metadata.insert("id".into(), json!(template.id));
        metadata.insert("version".into(), json!(template.version));
        metadata.insert("identifier".into(), json!(template.identifier()));
        if let Some(name) = &template.name {
            metadata.insert("name".into(), json!(name));
        }
        if let Some(description) = &template.description {
            metadata.insert("description".into(), json!(description));
        }
        if self.include_segments {
            metadata.insert("segments".into(), serde_json::to_value(&template.segments).unwrap_or(Value::Null));
        }
        Value::Object(metadata)
    }
}

/// Sorted-key, no-whitespace JSON, matching `json.dumps(..., sort_keys=True,
/// separators=(",", ":"))`.
fn compact_json(value: &Value) -> String {
    fn sort_recursively(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut sorted: Vec<(String, Value)> =
                    map.iter().map(|(k, v)| (k.clone(), sort_recursively(v))).collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                let mut out = serde_json::Map::new();
                for (k, v) in sorted {
                    out.insert(k, v);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort_recursively).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sort_recursively(value)).unwrap_or_default()
}

/// Returns `(json_text, comment_start, comment_end)` where `comment_end` is
/// the byte offset just past the trailing ` -->`.
fn find_json_in_comment(content: &str) -> Option<(String, usize, usize)> {
    let comment_start = content.find(META_PREFIX)?;
    let json_start = comment_start + META_PREFIX.len();

    let bytes = content.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;
    let mut json_end = None;

    for (offset, &byte) in bytes[json_start..].iter().enumerate() {
        let ch = byte as char;
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    json_end = Some(json_start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let json_end = json_end?;
    let rest = content[json_end..].trim_start();
    if !rest.starts_with("-->") {
        return None;
    }
    let close_offset = content[json_end..].find("-->")? + 3;
    let comment_end = json_end + close_offset;

    Some((content[json_start..json_end].to_string(), comment_start, comment_end))
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::model::Segment;

    fn sample_template() -> Template {
        Template {
            id: "transcript".into(),
            version: "1.0.0".into(),
            segments: vec![Segment {
                key: "overview".into(),
                title: "Overview".into(),
                description: None,
                required: true,
                repeatable: false,
                inputs: vec![],
                transform: None,
                format: "markdown".into(),
                constraints: None,
                relationships: vec![],
            }],
            name: Some("Transcript".into()),
            description: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn embed_then_extract_round_trips_identifier() {
        let embedder = TemplateEmbedder::new(false);
        let embedded = embedder.embed_in_skill("# My Skill\n\nBody text.", &sample_template(), Position::Top);
        assert_eq!(embedder.get_template_identifier(&embedded), Some("transcript@1.0.0".to_string()));
    }

    #[test]
    fn existing_metadata_is_replaced_in_place_not_duplicated() {
        let embedder = TemplateEmbedder::new(false);
        let once = embedder.embed_in_skill("# Doc", &sample_template(), Position::Top);

        let mut newer = sample_template();
        newer.version = "2.0.0".into();
        let twice = embedder.embed_in_skill(&once, &newer, Position::Top);

        assert_eq!(twice.matches("TEMPLATE_META").count(), 1);
        assert_eq!(embedder.get_template_identifier(&twice), Some("transcript@2.0.0".to_string()));
    }

    #[test]
    fn brace_inside_string_value_does_not_truncate_the_scan() {
        let content = format!(
            "{META_PREFIX}{{\"id\":\"t\",\"note\":\"has a {{brace}} inside\"}} -->\n\nBody"
        );
        let extracted = TemplateEmbedder::new(false).extract_from_skill(&content).unwrap();
        assert_eq!(extracted["note"], "has a {brace} inside");
    }

    #[test]
    fn remove_collapses_blank_lines() {
        let embedder = TemplateEmbedder::new(false);
        let embedded = embedder.embed_in_skill("# Doc\n\nBody.", &sample_template(), Position::Top);
        let removed = embedder.remove_from_skill(&embedded);
        assert!(!removed.contains("TEMPLATE_META"));
        assert!(!removed.contains("\n\n\n"));
    }
}
