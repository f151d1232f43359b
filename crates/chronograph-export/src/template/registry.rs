//! File-backed template storage: `{root}/{id}/{version}/template.json`.
//! Ported from `templates.template_registry.TemplateRegistry`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use jsonschema::Validator;

use crate::error::{TemplateError, TemplateResult};

use super::model::{Template, TemplateInfo};

const TEMPLATE_SCHEMA: &str = include_str!("schema.json");

pub struct TemplateRegistry {
    templates_dir: PathBuf,
    cache: Mutex<HashMap<String, Template>>,
    validator: Validator,
}

impl TemplateRegistry {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let schema: serde_json::Value =
            serde_json::from_str(TEMPLATE_SCHEMA).expect("embedded template schema is valid JSON");
        let validator = jsonschema::validator_for(&schema).expect("embedded template schema compiles");
        Self {
            templates_dir: templates_dir.into(),
            cache: Mutex::new(HashMap::new()),
            validator,
        }
    }

    pub fn get_template(&self, template_id: &str, version: Option<&str>) -> Option<Template> {
        let cache_key = match version {
            Some(v) => format!("{template_id}@{v}"),
            None => template_id.to_string(),
        };
        if let Some(cached) = self.cache.lock().unwrap().get(&cache_key) {
            return Some(cached.clone());
        }

        let template_base = self.templates_dir.join(template_id);
        if !template_base.exists() {
            tracing::warn!(template_id, "template not found");
            return None;
        }

        let version_dir = match version {
            Some(v) => template_base.join(v),
            None => {
                let versions = self.sorted_versions(&template_base);
                match versions.last() {
                    Some(v) => template_base.join(v),
                    None => {
                        tracing::warn!(template_id, "no versions found for template");
                        return None;
                    }
                }
            }
        };

        let template_file = version_dir.join("template.json");
        if !template_file.exists() {
            tracing::warn!(path = %template_file.display(), "template file not found");
            return None;
        }

        match fs::read_to_string(&template_file) {
            Ok(raw) => match serde_json::from_str::<Template>(&raw) {
                Ok(template) => {
                    self.cache.lock().unwrap().insert(cache_key, template.clone());
                    Some(template)
                }
                Err(e) => {
                    tracing::error!(path = %template_file.display(), error = %e, "failed to parse template");
                    None
                }
            },
            Err(e) => {
                tracing::error!(path = %template_file.display(), error = %e, "failed to read template file");
                None
            }
        }
    }

    /// Never raises: a malformed `template.json` is logged and skipped.
    pub fn list_templates(&self) -> Vec<TemplateInfo> {
        let mut out = Vec::new();
        let Ok(entries) = fs::read_dir(&self.templates_dir) else {
            return out;
        };

        for entry in entries.flatten() {
            let template_dir = entry.path();
            if !template_dir.is_dir() {
                continue;
            }
            let Some(template_id) = template_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            for version in self.sorted_versions(&template_dir) {
                let template_file = template_dir.join(&version).join("template.json");
                match fs::read_to_string(&template_file) {
                    Ok(raw) => match serde_json::from_str::<Template>(&raw) {
                        Ok(template) => out.push(TemplateInfo {
                            id: template_id.to_string(),
                            version: version.clone(),
                            name: template.name.clone(),
                            description: template.description.clone(),
                            segment_count: template.segments.len(),
                        }),
                        Err(e) => tracing::warn!(path = %template_file.display(), error = %e, "failed to read template info"),
                    },
                    Err(_) => continue,
                }
            }
        }

        out
    }

    pub fn register_template(&self, template: &Template) -> TemplateResult<PathBuf> {
        let data = serde_json::to_value(template)?;
        let errors = self.validate_template(&data);
        if !errors.is_empty() {
            return Err(TemplateError::Validation(errors));
        }

        let version_dir = self.templates_dir.join(&template.id).join(&template.version);
        fs::create_dir_all(&version_dir)?;

        let template_file = version_dir.join("template.json");
        let serialized = serde_json::to_string_pretty(template)?;
        fs::write(&template_file, serialized)?;

        self.cache.lock().unwrap().insert(template.identifier(), template.clone());
        tracing::info!(identifier = %template.identifier(), path = %template_file.display(), "registered template");
        Ok(template_file)
    }

    pub fn validate_template(&self, template_data: &serde_json::Value) -> Vec<String> {
        self.validator
            .iter_errors(template_data)
            .map(|e| e.to_string())
            .collect()
    }

    pub fn delete_template(&self, template_id: &str, version: &str) -> TemplateResult<bool> {
        let version_dir = self.templates_dir.join(template_id).join(version);
        if !version_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&version_dir)?;

        let template_dir = self.templates_dir.join(template_id);
        if template_dir.exists() && fs::read_dir(&template_dir)?.next().is_none() {
            fs::remove_dir(&template_dir)?;
        }

        self.cache.lock().unwrap().remove(&format!("{template_id}@{version}"));
        tracing::info!(template_id, version, "deleted template");
        Ok(true)
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    fn sorted_versions(&self, template_dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(template_dir) else {
            return Vec::new();
        };

        let mut versions: Vec<String> = entries
            .flatten()
            .filter(|entry| {
                entry.path().is_dir() && entry.path().join("template.json").exists()
            })
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();

        versions.sort_by_key(|v| version_key(v));
        versions
    }
}

/// Per-segment coercion: split on `.`, parse each segment as `u64` (non-numeric
/// segment -> 0), compare tuples lexicographically via `Vec<u64>`'s `Ord`.
fn version_key(version: &str) -> Vec<u64> {
    version.split('.').map(|segment| segment.parse::<u64>().unwrap_or(0)).collect()
}
