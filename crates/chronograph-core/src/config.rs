//! A single explicit configuration struct threaded through every
//! constructor in this crate. Never a process-wide singleton — callers
//! build one and pass it to the pieces that need it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::kg::AdapterConfig;
use crate::{DEFAULT_DELTA_COUNT_THRESHOLD, DEFAULT_DELTA_TOKEN_THRESHOLD};

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronographConfig {
    /// `None` opens an in-memory store; `Some(path)` opens or creates a file.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default)]
    pub adapter: AdapterConfig,

    #[serde(default = "default_true")]
    pub dsa_enabled: bool,

    #[serde(default = "default_true")]
    pub dsa_compaction_enabled: bool,

    #[serde(default = "default_delta_count_threshold")]
    pub delta_count_threshold: usize,

    #[serde(default = "default_delta_token_threshold")]
    pub delta_token_threshold: i64,

    /// Days a compacted delta survives before `cleanup_compacted_deltas` drops it.
    #[serde(default = "default_cleanup_after_days")]
    pub cleanup_after_days: i64,

    #[serde(default = "default_writer_batch_size")]
    pub writer_batch_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_delta_count_threshold() -> usize {
    DEFAULT_DELTA_COUNT_THRESHOLD
}

fn default_delta_token_threshold() -> i64 {
    DEFAULT_DELTA_TOKEN_THRESHOLD
}

fn default_cleanup_after_days() -> i64 {
    30
}

fn default_writer_batch_size() -> usize {
    50
}

impl Default for ChronographConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            adapter: AdapterConfig::default(),
            dsa_enabled: default_true(),
            dsa_compaction_enabled: default_true(),
            delta_count_threshold: default_delta_count_threshold(),
            delta_token_threshold: default_delta_token_threshold(),
            cleanup_after_days: default_cleanup_after_days(),
            writer_batch_size: default_writer_batch_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_thresholds() {
        let config = ChronographConfig::default();
        assert_eq!(config.delta_count_threshold, 5);
        assert_eq!(config.delta_token_threshold, 1000);
        assert!(config.dsa_enabled);
    }

    #[test]
    fn round_trips_through_json() {
        let config = ChronographConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ChronographConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
