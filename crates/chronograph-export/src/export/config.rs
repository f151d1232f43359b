//! Export tunables. Ported field-for-field from
//! `integrations.skill_seekers.config.ExportConfig`.

use serde::{Deserialize, Serialize};

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub default_level: i64,
    pub include_chunks: bool,
    pub dedup_threshold: f64,
    pub max_communities: Option<usize>,
    pub output_path: String,
    pub include_relationships: bool,
    pub summary_field: String,
    pub include_delta_summaries: bool,
    pub sync_state_path: String,
    pub auto_update_sync: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_level: 0,
            include_chunks: false,
            dedup_threshold: 0.85,
            max_communities: None,
            output_path: "skill_input.json".to_string(),
            include_relationships: true,
            summary_field: "full_content".to_string(),
            include_delta_summaries: true,
            sync_state_path: ".skill_sync_state.json".to_string(),
            auto_update_sync: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExportConfig::default();
        assert_eq!(config.default_level, 0);
        assert!(!config.include_chunks);
        assert_eq!(config.dedup_threshold, 0.85);
        assert_eq!(config.summary_field, "full_content");
        assert!(config.auto_update_sync);
    }
}
