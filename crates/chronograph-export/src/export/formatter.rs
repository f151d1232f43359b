//! Converts an [`ExportResult`] into the flat JSON shape skill consumers
//! read, in either legacy or template-layered form. Ported from
//! `integrations.skill_seekers.formatter.SkillInputFormatter`.

use serde_json::{json, Value};

use super::exporter::ExportResult;

pub struct Formatter;

impl Formatter {
    /// Legacy shape: `{source, pages, entities, dedup_report}`.
    pub fn format(export_result: &ExportResult) -> Value {
        json!({
            "source": export_result.metadata,
            "pages": export_result.pages,
            "entities": export_result.entities,
            "dedup_report": export_result.dedup_report,
        })
    }

    /// Template-layered shape (§6.4): `{template, content, source, trace}`.
    pub fn format_with_template(
        export_result: &ExportResult,
        template_summary: Value,
        filled_content: Value,
        template_id: Option<&str>,
        template_version_used: Option<&str>,
    ) -> Value {
        json!({
            "template": template_summary,
            "content": filled_content,
            "source": export_result.metadata,
            "trace": {
                "generated_at": export_result.metadata.get("export_timestamp"),
                "generator": "chronograph-export",
                "export_mode": export_result.metadata.get("export_mode"),
                "template_id": template_id,
                "template_version_used": template_version_used,
            },
        })
    }

    /// Dispatches on the presence of `template`/`trace` keys to decide which
    /// shape's rules apply, never raising — accumulates every violation.
    pub fn validate_output(data: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        let Some(obj) = data.as_object() else {
            errors.push("output must be a JSON object".to_string());
            return errors;
        };

        if obj.contains_key("template") || obj.contains_key("trace") {
            for key in ["template", "content", "source", "trace"] {
                if !obj.contains_key(key) {
                    errors.push(format!("missing required key: {key}"));
                }
            }
            return errors;
        }

        for key in ["source", "pages", "entities"] {
            if !obj.contains_key(key) {
                errors.push(format!("missing required key: {key}"));
            }
        }

        if let Some(source) = obj.get("source") {
            if !source.is_object() {
                errors.push("'source' must be an object".to_string());
            } else if source.get("type").is_none() {
                errors.push("'source.type' is required".to_string());
            }
        }

        if let Some(pages) = obj.get("pages") {
            match pages.as_array() {
                None => errors.push("'pages' must be an array".to_string()),
                Some(items) => {
                    for (i, page) in items.iter().enumerate() {
                        match page.as_object() {
                            None => errors.push(format!("pages[{i}] must be an object")),
                            Some(p) if !p.contains_key("content") => {
                                errors.push(format!("pages[{i}].content is required"))
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        if let Some(entities) = obj.get("entities") {
            match entities.as_array() {
                None => errors.push("'entities' must be an array".to_string()),
                Some(items) => {
                    for (i, entity) in items.iter().enumerate() {
                        match entity.as_object() {
                            None => errors.push(format!("entities[{i}] must be an object")),
                            Some(e) if !e.contains_key("name") => {
                                errors.push(format!("entities[{i}].name is required"))
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_shape_validates_clean() {
        let data = json!({
            "source": {"type": "graphrag"},
            "pages": [{"content": "x"}],
            "entities": [{"name": "Alice"}],
        });
        assert!(Formatter::validate_output(&data).is_empty());
    }

    #[test]
    fn template_shape_checks_its_own_keys() {
        let data = json!({"template": {}, "content": {}, "source": {}, "trace": {}});
        assert!(Formatter::validate_output(&data).is_empty());
    }

    #[test]
    fn missing_entity_name_is_reported() {
        let data = json!({
            "source": {"type": "graphrag"},
            "pages": [],
            "entities": [{"id": "e1"}],
        });
        let errors = Formatter::validate_output(&data);
        assert!(errors.iter().any(|e| e.contains("entities[0].name")));
    }
}
