//! Test graph store manager
//!
//! Provides isolated [`SqliteGraphStore`] instances for end-to-end tests:
//! temp-directory-backed stores that clean up on drop, plus a deterministic
//! stub `LlmClient` so DSA/compaction tests never depend on a real model.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chronograph_core::{GraphStore, LlmClient, LlmError, SqliteGraphStore};
use tempfile::TempDir;

/// Manager for a test [`SqliteGraphStore`].
///
/// Creates an isolated on-disk database per test to prevent interference.
/// The temp directory is cleaned up when the manager is dropped.
pub struct TestDatabaseManager {
    pub store: Arc<SqliteGraphStore>,
    _temp_dir: Option<TempDir>,
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new store backed by a temp directory.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = temp_dir.path().join("chronograph-test.db");
        let store = SqliteGraphStore::open(&db_path).expect("failed to open test store");

        Self { store: Arc::new(store), _temp_dir: Some(temp_dir), db_path }
    }

    /// Create a store at a specific path. Not cleaned up automatically.
    pub fn new_at_path(path: PathBuf) -> Self {
        let store = SqliteGraphStore::open(&path).expect("failed to open test store");
        Self { store: Arc::new(store), _temp_dir: None, db_path: path }
    }

    /// Create an in-memory store (no filesystem footprint at all).
    pub fn new_in_memory() -> Self {
        let store = SqliteGraphStore::open_in_memory().expect("failed to open in-memory store");
        Self { store: Arc::new(store), _temp_dir: None, db_path: PathBuf::new() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn store(&self) -> Arc<SqliteGraphStore> {
        Arc::clone(&self.store)
    }

    pub fn as_graph_store(&self) -> Arc<dyn GraphStore> {
        Arc::clone(&self.store) as Arc<dyn GraphStore>
    }
}

/// Deterministic `LlmClient` stub: `"{prompt.trim()}: {context.trim()}"`, or
/// just the prompt when context is empty. Never calls out to anything, so
/// DSA/compaction tests are reproducible and offline, matching §9's
/// "tested via a deterministic concatenating stub".
pub struct StubLlmClient;

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String, LlmError> {
        if context.trim().is_empty() {
            return Ok(prompt.trim().to_string());
        }
        Ok(format!("{}: {}", prompt.trim(), context.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_database_creation_produces_a_usable_store() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.path().exists());
    }

    #[tokio::test]
    async fn stub_llm_concatenates_prompt_and_context() {
        let llm = StubLlmClient;
        let out = llm.complete("Summarize:", "Alice founded Acme.").await.unwrap();
        assert_eq!(out, "Summarize:: Alice founded Acme.");
    }

    #[tokio::test]
    async fn stub_llm_falls_back_to_prompt_on_empty_context() {
        let llm = StubLlmClient;
        let out = llm.complete("Summarize:", "").await.unwrap();
        assert_eq!(out, "Summarize:");
    }
}
