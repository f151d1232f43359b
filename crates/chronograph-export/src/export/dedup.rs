//! Entity- and page-level deduplication for exports. Ported from
//! `integrations.skill_seekers.deduplicator.ContentDeduplicator`.
//!
//! Two distinct similarity measures are used deliberately: entity merging
//! here uses `similar`'s sequence-alignment ratio (matching the Python's
//! `difflib.SequenceMatcher`), while template rename detection
//! (`template::migrator`) uses a cheaper character-Jaccard measure instead —
//! they are not interchangeable.

use std::collections::HashMap;

use serde_json::{json, Value};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use super::exporter::{ExportedEntity, Page};

pub struct Deduplicator {
    similarity_threshold: f64,
}

impl Deduplicator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self { similarity_threshold }
    }

    pub fn deduplicate_entities(&self, entities: Vec<ExportedEntity>) -> (Vec<ExportedEntity>, Value) {
        if entities.is_empty() {
            return (Vec::new(), self.build_report(0, 0, &[]));
        }
        let original_count = entities.len();

        let mut name_groups: HashMap<String, Vec<ExportedEntity>> = HashMap::new();
        for entity in entities {
            let normalized = normalize_name(&entity.name);
            name_groups.entry(normalized).or_default().push(entity);
        }

        let mut deduplicated = Vec::new();
        let mut merge_groups: Vec<Vec<String>> = Vec::new();
        for (_, group) in name_groups {
            if group.len() == 1 {
                deduplicated.push(group.into_iter().next().unwrap());
            } else {
                let names = group.iter().map(|e| e.name.clone()).collect();
                deduplicated.push(merge_entity_group(group));
                merge_groups.push(names);
            }
        }

        if self.similarity_threshold < 1.0 {
            let (merged, additional) = self.merge_similar_entities(deduplicated);
            deduplicated = merged;
            merge_groups.extend(additional);
        }

        let merged_count = deduplicated.len();
        let report = self.build_report(original_count, merged_count, &merge_groups);
        (deduplicated, report)
    }

    fn merge_similar_entities(&self, entities: Vec<ExportedEntity>) -> (Vec<ExportedEntity>, Vec<Vec<String>>) {
        if entities.len() <= 1 {
            return (entities, Vec::new());
        }

        let mut merged_indices = vec![false; entities.len()];
        let mut merge_groups = Vec::new();
        let mut result = Vec::new();

        for i in 0..entities.len() {
            if merged_indices[i] {
                continue;
            }
            let mut similar_group = vec![i];
            let name_i = entities[i].name.to_lowercase();

            for j in (i + 1)..entities.len() {
                if merged_indices[j] {
                    continue;
                }
                let name_j = entities[j].name.to_lowercase();
                if sequence_similarity(&name_i, &name_j) >= self.similarity_threshold {
                    similar_group.push(j);
                    merged_indices[j] = true;
                }
            }

            if similar_group.len() > 1 {
                let names = similar_group.iter().map(|&idx| entities[idx].name.clone()).collect();
                let group: Vec<ExportedEntity> = similar_group.iter().map(|&idx| entities[idx].clone()).collect();
                result.push(merge_entity_group(group));
                merge_groups.push(names);
            } else {
                result.push(entities[i].clone());
            }
        }

        (result, merge_groups)
    }

    pub fn deduplicate_pages(&self, pages: Vec<Page>) -> Vec<Page> {
        let mut seen_hashes: HashMap<String, usize> = HashMap::new();
        let mut result = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            let content_hash = hash_content(&page.content);
            if let Some(&first_idx) = seen_hashes.get(&content_hash) {
                let mut duplicate = page.clone();
                duplicate.is_duplicate = Some(true);
                duplicate.duplicate_of = Some(pages[first_idx].url.clone());
                result.push(duplicate);
            } else {
                seen_hashes.insert(content_hash, i);
                result.push(page.clone());
            }
        }

        result
    }

    fn build_report(&self, original_count: usize, merged_count: usize, merge_groups: &[Vec<String>]) -> Value {
        json!({
            "original_entity_count": original_count,
            "merged_entity_count": merged_count,
            "entities_removed": original_count.saturating_sub(merged_count),
            "merge_groups": merge_groups,
        })
    }
}

fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

fn merge_entity_group(mut entities: Vec<ExportedEntity>) -> ExportedEntity {
    entities.sort_by_key(|e| std::cmp::Reverse(e.description.len()));

    let mut relationships: Vec<String> = entities.iter().flat_map(|e| e.relationships.clone()).collect();
    relationships.sort();
    relationships.dedup();

    let merged_from: Vec<String> = entities[1..].iter().map(|e| e.entity_id.clone()).collect();

    let mut merged = entities.remove(0);
    merged.relationships = relationships;
    merged.merged_from = if merged_from.is_empty() { None } else { Some(merged_from) };
    merged
}

fn hash_content(content: &str) -> String {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{:x}", md5::compute(normalized))
}

/// True sequence-alignment ratio à la `difflib.SequenceMatcher.ratio()`:
/// `2 * matching_chars / (len(a) + len(b))`, matching chars counted from the
/// longest common contiguous matching blocks `similar` reports.
fn sequence_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let ops = capture_diff_slices(Algorithm::Myers, &a_chars, &b_chars);

    let matching: usize = ops
        .iter()
        .map(|op| match op {
            DiffOp::Equal { len, .. } => *len,
            _ => 0,
        })
        .sum();

    (2 * matching) as f64 / (a_chars.len() + b_chars.len()) as f64
}
