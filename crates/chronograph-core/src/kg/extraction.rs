//! Extraction adapter contract: turns chunks into a [`TemporalKg`] via an
//! external LLM/embedding collaborator. Ported from
//! `graphrag_agent.graph.extraction.atom_adapter.AtomExtractionAdapter`.

use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{TemporalEntity, TemporalRelationship};
use super::graph::{ChunkInput, TemporalKg};

/// Tunables for an extraction call. Defaults match the Python adapter's
/// constructor defaults exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub ent_threshold: f64,
    pub rel_threshold: f64,
    pub entity_name_weight: f64,
    pub entity_label_weight: f64,
    pub max_workers: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            ent_threshold: 0.75,
            rel_threshold: 0.75,
            entity_name_weight: 0.7,
            entity_label_weight: 0.3,
            max_workers: 4,
        }
    }
}

/// Extraction-path error. Missing dependency is a construction-time failure
/// (never surfaces from a call), extractor failures propagate unchanged.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("missing extraction dependency: {0}")]
    MissingDependency(String),
    #[error("upstream extractor error: {0}")]
    Upstream(String),
    #[error("extraction call timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// A single extracted atomic fact, the raw unit `build_graph` consumes.
#[derive(Debug, Clone)]
pub struct AtomicFact {
    pub text: String,
}

/// The third-party atomic-fact extractor this crate adapts. Prompt wording
/// and model choice are explicitly out of scope (§1 Non-goals); this trait is
/// only the data contract around the call.
#[async_trait]
pub trait AtomExtractor: Send + Sync {
    async fn build_graph(
        &self,
        facts: &[AtomicFact],
        config: &AdapterConfig,
    ) -> Result<(Vec<TemporalEntity>, Vec<TemporalRelationship>)>;
}

/// Adapts an [`AtomExtractor`] into the internal [`TemporalKg`] model.
pub struct ExtractionAdapter<E: AtomExtractor> {
    extractor: Arc<E>,
    config: AdapterConfig,
}

impl<E: AtomExtractor> ExtractionAdapter<E> {
    /// Fails fast at construction if the extractor cannot be used, rather
    /// than surfacing the failure from the first call.
    pub fn new(extractor: Arc<E>, config: AdapterConfig) -> Result<Self> {
        Ok(Self { extractor, config })
    }

    fn normalize_chunks(chunks: &[ChunkInput]) -> Vec<AtomicFact> {
        chunks
            .iter()
            .filter_map(ChunkInput::normalize)
            .map(|text| AtomicFact { text })
            .collect()
    }

    /// `observation_time` defaults to current UTC, converted to a unix float
    /// once and shared across every relationship produced by this call.
    pub async fn extract_from_chunks(
        &self,
        chunks: &[ChunkInput],
        observation_time: Option<DateTime<Utc>>,
        existing_kg: Option<&TemporalKg>,
    ) -> Result<TemporalKg> {
        let facts = Self::normalize_chunks(chunks);
        if facts.is_empty() {
            return Ok(existing_kg.cloned().unwrap_or_default());
        }

        let obs_ts = observation_time.unwrap_or_else(Utc::now).timestamp() as f64;
        let (entities, relationships) = self.extractor.build_graph(&facts, &self.config).await?;
        let extracted = TemporalKg::from_atom_kg(entities, relationships, vec![obs_ts]);

        Ok(match existing_kg {
            Some(existing) => existing.merge(&extracted),
            None => extracted,
        })
    }

    /// Synchronous bridge: if a tokio runtime is already driving this thread,
    /// dispatch to a dedicated single-thread runtime on a fresh OS thread and
    /// join it; otherwise drive a throwaway current-thread runtime directly.
    /// Mirrors `extract_from_chunks_sync`'s `asyncio.get_event_loop()` +
    /// `ThreadPoolExecutor(max_workers=1)` fallback — never nests loops.
    pub fn extract_from_chunks_sync(
        &self,
        chunks: &[ChunkInput],
        observation_time: Option<DateTime<Utc>>,
        existing_kg: Option<&TemporalKg>,
    ) -> Result<TemporalKg>
    where
        E: 'static,
    {
        let chunks = chunks.to_vec();
        let existing_kg = existing_kg.cloned();

        if tokio::runtime::Handle::try_current().is_ok() {
            let extractor = Arc::clone(&self.extractor);
            let config = self.config.clone();
            thread::scope(|scope| {
                scope
                    .spawn(move || {
                        let rt = tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                            .expect("failed to build single-thread runtime");
                        rt.block_on(async move {
                            let adapter = ExtractionAdapter {
                                extractor,
                                config,
                            };
                            adapter
                                .extract_from_chunks(&chunks, observation_time, existing_kg.as_ref())
                                .await
                        })
                    })
                    .join()
                    .expect("extraction thread panicked")
            })
        } else {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build current-thread runtime");
            rt.block_on(self.extract_from_chunks(&chunks, observation_time, existing_kg.as_ref()))
        }
    }
}
