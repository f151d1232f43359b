//! Diffs two versions of a template and produces a migration report plus a
//! human-readable guide. Ported from
//! `templates.template_migrator.TemplateMigrator`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::model::{Segment, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Renamed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentChange {
    pub change_type: ChangeType,
    pub key: String,
    pub renamed_to: Option<String>,
    pub is_breaking: bool,
    pub field_changes: Vec<FieldChange>,
    pub segment: Option<Segment>,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub from_identifier: String,
    pub to_identifier: String,
    pub changes: Vec<SegmentChange>,
    pub compatibility_notes: Vec<String>,
    pub reordered: bool,
}

impl MigrationReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || self.reordered
    }

    pub fn added_segments(&self) -> Vec<&SegmentChange> {
        self.changes.iter().filter(|c| c.change_type == ChangeType::Added).collect()
    }

    pub fn removed_segments(&self) -> Vec<&SegmentChange> {
        self.changes.iter().filter(|c| c.change_type == ChangeType::Removed).collect()
    }

    pub fn modified_segments(&self) -> Vec<&SegmentChange> {
        self.changes.iter().filter(|c| c.change_type == ChangeType::Modified).collect()
    }

    pub fn is_breaking(&self) -> bool {
        self.changes.iter().any(|c| c.is_breaking)
    }
}

pub struct TemplateMigrator {
    pub similarity_threshold: f64,
}

impl Default for TemplateMigrator {
    fn default() -> Self {
        Self { similarity_threshold: 0.8 }
    }
}

impl TemplateMigrator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self { similarity_threshold }
    }

    pub fn compare(&self, old: &Template, new: &Template) -> MigrationReport {
        let old_keys: HashSet<&str> = old.segments.iter().map(|s| s.key.as_str()).collect();
        let new_keys: HashSet<&str> = new.segments.iter().map(|s| s.key.as_str()).collect();

        let mut removed_keys: Vec<&str> = old_keys.difference(&new_keys).copied().collect();
        removed_keys.sort();
        let mut added_keys: Vec<&str> = new_keys.difference(&old_keys).copied().collect();
        added_keys.sort();
        let mut common_keys: Vec<&str> = old_keys.intersection(&new_keys).copied().collect();
        common_keys.sort();

        let mut changes = Vec::new();
        let mut compatibility_notes = Vec::new();

        let renames = self.detect_renames(old, new, &removed_keys, &added_keys);
        let renamed_from: HashSet<&str> = renames.keys().copied().collect();
        let renamed_to: HashSet<&str> = renames.values().map(String::as_str).collect();

        for &key in &removed_keys {
            if renamed_from.contains(key) {
                let target = renames[key].clone();
                changes.push(SegmentChange {
                    change_type: ChangeType::Renamed,
                    key: key.to_string(),
                    renamed_to: Some(target.clone()),
                    is_breaking: false,
                    field_changes: Vec::new(),
                    segment: old.get_segment(key).cloned(),
                });
                compatibility_notes.push(format!("Segment '{key}' appears renamed to '{target}'"));
                continue;
            }

            let segment = old.get_segment(key);
            let is_breaking = segment.map(|s| s.required).unwrap_or(false);
            if is_breaking {
                compatibility_notes.push(format!("Removed required segment '{key}' is a breaking change"));
            }
            changes.push(SegmentChange {
                change_type: ChangeType::Removed,
                key: key.to_string(),
                renamed_to: None,
                is_breaking,
                field_changes: Vec::new(),
                segment: segment.cloned(),
            });
        }

        for &key in &added_keys {
            if renamed_to.contains(key) {
                continue;
            }
            let segment = new.get_segment(key);
            if segment.map(|s| s.required).unwrap_or(false) {
                compatibility_notes.push(format!("New required segment '{key}' needs a value to migrate"));
            }
            changes.push(SegmentChange {
                change_type: ChangeType::Added,
                key: key.to_string(),
                renamed_to: None,
                is_breaking: false,
                field_changes: Vec::new(),
                segment: segment.cloned(),
            });
        }

        for &key in &common_keys {
            let (Some(old_seg), Some(new_seg)) = (old.get_segment(key), new.get_segment(key)) else { continue };
            let field_changes = compare_segments(old_seg, new_seg);
            if field_changes.is_empty() {
                continue;
            }

            // Spec contract: a required:false -> true transition is breaking.
            // (The original implementation this was ported from only records
            // a compatibility note here; this port honors the documented
            // contract instead.)
            let became_required = field_changes
                .iter()
                .any(|c| c.field == "required" && c.old_value.as_deref() == Some("false") && c.new_value.as_deref() == Some("true"));
            if became_required {
                compatibility_notes.push(format!("Segment '{key}' is now required"));
            }

            changes.push(SegmentChange {
                change_type: ChangeType::Modified,
                key: key.to_string(),
                renamed_to: None,
                is_breaking: became_required,
                field_changes,
                segment: Some(new_seg.clone()),
            });
        }

        let reordered = is_reordered(old, new, &common_keys);

        MigrationReport {
            from_identifier: old.identifier(),
            to_identifier: new.identifier(),
            changes,
            compatibility_notes,
            reordered,
        }
    }

    fn detect_renames(
        &self,
        old: &Template,
        new: &Template,
        removed_keys: &[&str],
        added_keys: &[&str],
    ) -> HashMap<String, String> {
        let mut renames = HashMap::new();
        if removed_keys.is_empty() || added_keys.is_empty() {
            return renames;
        }

        for &removed in removed_keys {
            let Some(old_seg) = old.get_segment(removed) else { continue };
            let mut best: Option<(&str, f64)> = None;
            for &added in added_keys {
                let Some(new_seg) = new.get_segment(added) else { continue };
                let score = segment_similarity(old_seg, new_seg);
                if score > best.map(|(_, s)| s).unwrap_or(0.0) {
                    best = Some((added, score));
                }
            }
            if let Some((target, score)) = best {
                if score >= self.similarity_threshold {
                    renames.insert(removed.to_string(), target.to_string());
                }
            }
        }

        renames
    }

    pub fn generate_migration_guide(&self, report: &MigrationReport) -> String {
        generate_migration_guide(report)
    }
}

fn compare_segments(old: &Segment, new: &Segment) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    push_if_changed(&mut changes, "title", &old.title, &new.title);
    push_if_changed(&mut changes, "description", &opt_str(&old.description), &opt_str(&new.description));
    push_if_changed(&mut changes, "required", &old.required.to_string(), &new.required.to_string());
    push_if_changed(&mut changes, "repeatable", &old.repeatable.to_string(), &new.repeatable.to_string());
    push_if_changed(&mut changes, "format", &old.format, &new.format);
    push_if_changed(
        &mut changes,
        "constraints",
        &old.constraints.as_ref().map(Value::to_string).unwrap_or_default(),
        &new.constraints.as_ref().map(Value::to_string).unwrap_or_default(),
    );

    let old_transform = old.transform.as_ref().map(|t| t.r#type.clone()).unwrap_or_default();
    let new_transform = new.transform.as_ref().map(|t| t.r#type.clone()).unwrap_or_default();
    push_if_changed(&mut changes, "transform", &old_transform, &new_transform);

    changes
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn push_if_changed(changes: &mut Vec<FieldChange>, field: &str, old: &str, new: &str) {
    if old != new {
        changes.push(FieldChange {
            field: field.to_string(),
            old_value: Some(old.to_string()),
            new_value: Some(new.to_string()),
        });
    }
}

/// Weighted score over title (2.0 full match, 1.0 if similarity > 0.5),
/// required/repeatable/format exact match (1.0 each), and transform type
/// match (1.0, only counted toward the denominator if either side has a
/// transform). Normalized to `[0, 1]` by dividing by the max attainable score.
fn segment_similarity(old: &Segment, new: &Segment) -> f64 {
    let mut score = 0.0;
    let mut max_score = 0.0;

    max_score += 2.0;
    let title_sim = string_similarity(&old.title, &new.title);
    if title_sim >= 1.0 {
        score += 2.0;
    } else if title_sim > 0.5 {
        score += 1.0;
    }

    max_score += 1.0;
    if old.required == new.required {
        score += 1.0;
    }

    max_score += 1.0;
    if old.repeatable == new.repeatable {
        score += 1.0;
    }

    max_score += 1.0;
    if old.format == new.format {
        score += 1.0;
    }

    let old_transform = old.transform.as_ref().map(|t| t.r#type.as_str());
    let new_transform = new.transform.as_ref().map(|t| t.r#type.as_str());
    if old_transform.is_some() || new_transform.is_some() {
        max_score += 1.0;
        if old_transform == new_transform {
            score += 1.0;
        }
    }

    if max_score == 0.0 {
        0.0
    } else {
        score / max_score
    }
}

/// Exact match (1.0), containment (0.7), else character-set Jaccard. This is
/// deliberately NOT the sequence-alignment ratio used for entity dedup
/// (§4.11) — rename detection uses this coarser, cheaper measure instead.
fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.7;
    }

    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let common = set_a.intersection(&set_b).count();
    let total = set_a.union(&set_b).count();
    if total == 0 {
        0.0
    } else {
        common as f64 / total as f64
    }
}

fn is_reordered(old: &Template, new: &Template, common_keys: &[&str]) -> bool {
    let common_set: HashSet<&str> = common_keys.iter().copied().collect();
    let old_order: Vec<&str> = old.segments.iter().map(|s| s.key.as_str()).filter(|k| common_set.contains(k)).collect();
    let new_order: Vec<&str> = new.segments.iter().map(|s| s.key.as_str()).filter(|k| common_set.contains(k)).collect();
    old_order != new_order
}

fn generate_migration_guide(report: &MigrationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Migration Guide: {} → {}\n\n", report.from_identifier, report.to_identifier));

    if !report.has_changes() {
        out.push_str("No changes detected.\n");
        return out;
    }

    let added = report.added_segments();
    let removed = report.removed_segments();
    let modified = report.modified_segments();

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Total changes: {}\n", report.changes.len()));
    out.push_str(&format!("- Added: {}\n", added.len()));
    out.push_str(&format!("- Removed: {}\n", removed.len()));
    out.push_str(&format!("- Modified: {}\n", modified.len()));
    if report.is_breaking() {
        out.push_str("- **Contains breaking changes.**\n");
    }
    out.push('\n');

    if !report.compatibility_notes.is_empty() {
        out.push_str("## Compatibility Notes\n\n");
        for note in &report.compatibility_notes {
            out.push_str(&format!("- {note}\n"));
        }
        out.push('\n');
    }

    if !added.is_empty() {
        out.push_str("## Added Segments\n\n");
        for change in &added {
            let required_marker = change.segment.as_ref().map(|s| s.required).unwrap_or(false);
            out.push_str(&format!(
                "### {}{}\n",
                change.key,
                if required_marker { " (required)" } else { "" }
            ));
            if let Some(segment) = &change.segment {
                out.push_str(&format!("- Title: {}\n", segment.title));
                if let Some(desc) = &segment.description {
                    out.push_str(&format!("- Description: {desc}\n"));
                }
            }
            out.push('\n');
        }
    }

    if !removed.is_empty() {
        out.push_str("## Removed Segments\n\n");
        for change in &removed {
            let was_required = change.segment.as_ref().map(|s| s.required).unwrap_or(false);
            out.push_str(&format!(
                "- `{}`{}\n",
                change.key,
                if was_required { " (was required)" } else { "" }
            ));
        }
        out.push('\n');
    }

    if !modified.is_empty() {
        out.push_str("## Modified Segments\n\n");
        for change in &modified {
            out.push_str(&format!("### {}\n\n", change.key));
            out.push_str("| Field | Old | New |\n|---|---|---|\n");
            for field_change in &change.field_changes {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    field_change.field,
                    truncate(field_change.old_value.as_deref().unwrap_or("")),
                    truncate(field_change.new_value.as_deref().unwrap_or("")),
                ));
            }
            out.push('\n');
        }
    }

    out.push_str("## Migration Steps\n\n");
    let mut step = 1;
    for change in &removed {
        out.push_str(&format!("{step}. Handle removal of segment `{}`.\n", change.key));
        step += 1;
    }
    for change in &added {
        if change.segment.as_ref().map(|s| s.required).unwrap_or(false) {
            out.push_str(&format!("{step}. Populate new required segment `{}`.\n", change.key));
            step += 1;
        }
    }
    for change in &modified {
        out.push_str(&format!("{step}. Review modified segment `{}`.\n", change.key));
        step += 1;
    }
    out.push('\n');

    out.push_str("---\n_Generated migration guide._\n");
    out
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 50 {
        format!("{}...", s.chars().take(50).collect::<String>())
    } else {
        s.to_string()
    }
}
