//! Fills a [`Template`]'s segments from a content map, applying each
//! segment's transform/format pipeline. Ported from
//! `templates.template_filler.TemplateFiller`.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{json, Value};

use super::model::{Segment, Template, TransformSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentValue {
    pub value: Value,
    pub source_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Clone)]
pub struct FilledContent {
    pub segments: HashMap<String, Vec<SegmentValue>>,
    pub missing_required: Vec<String>,
    pub warnings: Vec<String>,
    pub status: FillStatus,
}

impl FilledContent {
    pub fn is_complete(&self) -> bool {
        self.status == FillStatus::Complete && self.missing_required.is_empty()
    }

    fn to_value(&self) -> Value {
        let segments: serde_json::Map<String, Value> = self
            .segments
            .iter()
            .map(|(key, values)| {
                let rendered: Vec<Value> = values
                    .iter()
                    .map(|v| json!({"value": v.value, "source_ref": v.source_ref}))
                    .collect();
                (key.clone(), Value::Array(rendered))
            })
            .collect();

        json!({
            "status": status_str(&self.status),
            "segments": segments,
            "missing_required": self.missing_required,
            "warnings": self.warnings,
        })
    }
}

fn status_str(status: &FillStatus) -> &'static str {
    match status {
        FillStatus::Complete => "complete",
        FillStatus::Partial => "partial",
        FillStatus::Failed => "failed",
    }
}

/// Assembles the complete `skill_input.json` structure (§6.4) from a
/// template and its filled content. Ported from
/// `templates.template_filler.create_skill_input`.
pub fn create_skill_input(
    template: &Template,
    content: &FilledContent,
    source: Option<Value>,
    trace: Option<Value>,
) -> Value {
    let generated_at = chrono::Utc::now().to_rfc3339();
    json!({
        "template": {
            "id": template.id,
            "name": template.name,
            "version": template.version,
            "segments": template.segments,
        },
        "content": content.to_value(),
        "source": source.unwrap_or_else(|| json!({})),
        "trace": trace.unwrap_or_else(|| json!({
            "generated_at": generated_at,
            "template_version_used": template.version,
        })),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Missing,
    Unknown,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub segment_key: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

pub struct TemplateFiller {
    pub strict_mode: bool,
}

impl TemplateFiller {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    /// `content` maps segment key -> raw value (scalar or list) as gathered
    /// from the graph. `source_metadata["file"]` becomes each filled value's
    /// `source_ref` (`file#index` for repeatable segments); without it
    /// `source_ref` is `None`. Missing optional segments are skipped
    /// silently; missing required segments are recorded but never abort the
    /// fill.
    pub fn fill(
        &self,
        template: &Template,
        content: &HashMap<String, Value>,
        source_metadata: Option<&HashMap<String, Value>>,
    ) -> FilledContent {
        let mut segments: HashMap<String, Vec<SegmentValue>> = HashMap::new();
        let mut missing_required = Vec::new();
        let mut warnings = Vec::new();

        for segment in &template.segments {
            let Some(raw) = content.get(&segment.key) else {
                if segment.required {
                    missing_required.push(segment.key.clone());
                    warnings.push(format!("missing required segment '{}'", segment.key));
                }
                continue;
            };

            match self.fill_segment(segment, raw, source_metadata) {
                Ok(values) => {
                    segments.insert(segment.key.clone(), values);
                }
                Err(e) => {
                    warnings.push(format!("segment '{}': {e}", segment.key));
                    if segment.required {
                        missing_required.push(segment.key.clone());
                    }
                }
            }
        }

        let status = if !missing_required.is_empty() {
            FillStatus::Partial
        } else if !warnings.is_empty() && self.strict_mode {
            FillStatus::Failed
        } else {
            FillStatus::Complete
        };

        FilledContent { segments, missing_required, warnings, status }
    }

    fn fill_segment(
        &self,
        segment: &Segment,
        raw: &Value,
        source_metadata: Option<&HashMap<String, Value>>,
    ) -> Result<Vec<SegmentValue>, String> {
        let file = source_metadata.and_then(|m| m.get("file")).and_then(Value::as_str);

        if segment.repeatable {
            let items: Vec<Value> = match raw {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let transformed = apply_transform(item, segment.transform.as_ref())?;
                let formatted = apply_format(&transformed, &segment.format);
                let source_ref = file.map(|f| format!("{f}#{i}"));
                out.push(SegmentValue { value: formatted, source_ref });
            }
            Ok(out)
        } else {
            let transformed = apply_transform(raw, segment.transform.as_ref())?;
            let formatted = apply_format(&transformed, &segment.format);
            let source_ref = file.map(|f| f.to_string());
            Ok(vec![SegmentValue { value: formatted, source_ref }])
        }
    }

    pub fn validate(&self, template: &Template, filled: &FilledContent) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for segment in template.required_segments() {
            if !filled.segments.contains_key(&segment.key) {
                errors.push(ValidationError {
                    segment_key: segment.key.clone(),
                    kind: ValidationErrorKind::Missing,
                    message: format!("required segment '{}' was not filled", segment.key),
                });
            }
        }

        for key in filled.segments.keys() {
            if template.get_segment(key).is_none() {
                errors.push(ValidationError {
                    segment_key: key.clone(),
                    kind: ValidationErrorKind::Unknown,
                    message: format!("segment '{key}' is not defined in the template"),
                });
            }
        }

        for (key, values) in &filled.segments {
            let Some(segment) = template.get_segment(key) else { continue };
            let Some(constraints) = &segment.constraints else { continue };

            if segment.repeatable {
                if let Some(min_items) = constraints.get("minItems").and_then(Value::as_u64) {
                    if (values.len() as u64) < min_items {
                        errors.push(constraint_error(key, format!("has {} items, minItems is {min_items}", values.len())));
                    }
                }
                if let Some(max_items) = constraints.get("maxItems").and_then(Value::as_u64) {
                    if (values.len() as u64) > max_items {
                        errors.push(constraint_error(key, format!("has {} items, maxItems is {max_items}", values.len())));
                    }
                }
            }

            for value in values {
                errors.extend(validate_single_value(key, &value.value, constraints));
            }
        }

        errors
    }
}

fn constraint_error(key: &str, message: String) -> ValidationError {
    ValidationError { segment_key: key.to_string(), kind: ValidationErrorKind::Constraint, message }
}

fn validate_single_value(key: &str, value: &Value, constraints: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Value::String(s) = value else { return errors };

    if let Some(min_length) = constraints.get("minLength").and_then(Value::as_u64) {
        if (s.chars().count() as u64) < min_length {
            errors.push(constraint_error(key, format!("is shorter than minLength {min_length}")));
        }
    }
    if let Some(max_length) = constraints.get("maxLength").and_then(Value::as_u64) {
        if (s.chars().count() as u64) > max_length {
            errors.push(constraint_error(key, format!("exceeds maxLength {max_length}")));
        }
    }
    if let Some(pattern) = constraints.get("pattern").and_then(Value::as_str) {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(s) => {
                errors.push(constraint_error(key, format!("does not match pattern {pattern}")));
            }
            Err(e) => errors.push(constraint_error(key, format!("invalid pattern {pattern}: {e}"))),
            _ => {}
        }
    }

    errors
}

fn apply_transform(value: &Value, transform: Option<&TransformSpec>) -> Result<Value, String> {
    let Some(transform) = transform else { return Ok(value.clone()) };

    match transform.r#type.as_str() {
        "list-extract" => {
            if let Value::String(s) = value {
                Ok(Value::Array(extract_list_items(s).into_iter().map(Value::String).collect()))
            } else {
                Ok(value.clone())
            }
        }
        "summarize" => Ok(value.clone()),
        "concatenate" => {
            let Value::Array(items) = value else { return Ok(value.clone()) };
            let separator = transform
                .params
                .get("separator")
                .and_then(Value::as_str)
                .unwrap_or("\n");
            let joined = items
                .iter()
                .map(value_to_plain_string)
                .collect::<Vec<_>>()
                .join(separator);
            Ok(Value::String(joined))
        }
        "map" => {
            let Some(mapping) = transform.params.get("mapping").and_then(Value::as_object) else {
                return Ok(value.clone());
            };
            let Value::String(s) = value else { return Ok(value.clone()) };
            Ok(mapping.get(s).cloned().unwrap_or_else(|| value.clone()))
        }
        "filter" => {
            let Value::Array(items) = value else { return Ok(value.clone()) };
            let Some(pattern) = transform.params.get("pattern").and_then(Value::as_str) else {
                return Ok(value.clone());
            };
            let re = Regex::new(pattern).map_err(|e| format!("invalid filter pattern '{pattern}': {e}"))?;
            Ok(Value::Array(
                items
                    .iter()
                    .filter(|item| re.is_match(&value_to_plain_string(item)))
                    .cloned()
                    .collect(),
            ))
        }
        other => {
            tracing::debug!(transform_type = other, "unknown transform type, passing value through");
            Ok(value.clone())
        }
    }
}

fn apply_format(value: &Value, format: &str) -> Value {
    match format {
        "markdown" => {
            if let Value::Array(items) = value {
                let rendered = items
                    .iter()
                    .map(|item| format!("- {}", value_to_plain_string(item)))
                    .collect::<Vec<_>>()
                    .join("\n");
                Value::String(rendered)
            } else {
                Value::String(value_to_plain_string(value))
            }
        }
        "json" => value.clone(),
        "plain" => {
            if let Value::Array(items) = value {
                Value::String(items.iter().map(value_to_plain_string).collect::<Vec<_>>().join("\n"))
            } else {
                Value::String(value_to_plain_string(value))
            }
        }
        "html" => {
            if let Value::Array(items) = value {
                let lis = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", value_to_plain_string(item)))
                    .collect::<Vec<_>>()
                    .join("");
                Value::String(format!("<ul>{lis}</ul>"))
            } else {
                Value::String(format!("<p>{}</p>", value_to_plain_string(value)))
            }
        }
        _ => value.clone(),
    }
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Bullet (`-`, `•`, `*`) then numbered (`1.` / `1)`) line prefixes; any line
/// matching neither is kept whole, matching the Python fallback-to-whole-line.
fn extract_list_items(text: &str) -> Vec<String> {
    let bullet = Regex::new(r"^[-•*]\s*(.+)$").unwrap();
    let numbered = Regex::new(r"^\d+[.)]\s*(.+)$").unwrap();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(caps) = bullet.captures(line) {
                caps[1].to_string()
            } else if let Some(caps) = numbered.captures(line) {
                caps[1].to_string()
            } else {
                line.to_string()
            }
        })
        .collect()
}
