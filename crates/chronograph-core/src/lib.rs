//! # Chronograph Core
//!
//! Temporal knowledge graph engine: append-only observation provenance,
//! delta-summary accumulation for communities, and a pluggable extraction
//! adapter over external LLM collaborators.
//!
//! - **Temporal facts**: every relationship carries append-only `t_obs` /
//!   `t_start` / `t_end` arrays plus the atomic facts that produced them —
//!   nothing is ever rewritten or reordered, only appended.
//! - **Delta-Summary Accumulation**: an LSM-shaped append-only delta log per
//!   community, merged on read and compacted into the base summary once
//!   configured thresholds are crossed.
//! - **Pluggable backing store**: a `GraphStore` trait with a SQLite-backed
//!   implementation, so callers can hold `Arc<dyn GraphStore>` across the
//!   async extraction path and the synchronous compaction sweep alike.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chronograph_core::{SqliteGraphStore, TemporalEntity, TemporalRelationship, TemporalWriter};
//!
//! let store = Arc::new(SqliteGraphStore::open_in_memory()?);
//! let writer = TemporalWriter::new(store.clone());
//!
//! let mut kg = TemporalKg::default();
//! kg.entities.push(TemporalEntity::new("alice", "Alice"));
//! writer.write_temporal_kg(&kg, MergeStrategy::Update).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

/// Temporal knowledge graph core: entities, relationships, the in-memory
/// graph model, and the external extraction adapter.
pub mod kg;

/// Graph store abstraction (`GraphStore` trait) and its SQLite implementation.
pub mod store;

/// Delta-Summary Accumulation: per-community delta log and compaction.
pub mod dsa;

/// The external LLM collaborator contract shared by `dsa`.
pub mod llm;

/// Single explicit configuration struct threaded through every component.
pub mod config;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use kg::{
    sanitize_identifier, AdapterConfig, AtomExtractor, AtomicFact, ChunkInput, ExtractionAdapter,
    ExtractionError, GraphDocument, GraphDocumentEdge, GraphDocumentNode, PropertyMap, PropertyValue,
    TemporalEntity, TemporalKg, TemporalRelationship,
};

pub use store::{
    apply_migrations, Community, CommunityDelta, DeltaStatus, GraphStore, MergeStrategy, Migration,
    SqliteGraphStore, StoreError, TemporalWriter, WriteReport, MIGRATIONS,
};

pub use dsa::{merge_summaries_for_read, CommunityCompactor, DeltaSummarizer, DsaError};

pub use llm::{approximate_token_count, LlmClient, LlmError};

pub use config::ChronographConfig;

// ============================================================================
// VERSION INFO
// ============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default DSA thresholds, mirrored in [`config::ChronographConfig::default`].
pub const DEFAULT_DELTA_COUNT_THRESHOLD: usize = 5;
pub const DEFAULT_DELTA_TOKEN_THRESHOLD: i64 = 1000;

/// Convenience re-export of the crate's commonly used types, so downstream
/// crates can `use chronograph_core::prelude::*;` instead of enumerating
/// individual module paths.
pub mod prelude {
    pub use crate::{
        sanitize_identifier, ChronographConfig, ChunkInput, Community, CommunityCompactor,
        CommunityDelta, DeltaStatus, DeltaSummarizer, DsaError, ExtractionAdapter, ExtractionError,
        GraphStore, LlmClient, LlmError, MergeStrategy, PropertyMap, PropertyValue, SqliteGraphStore,
        StoreError, TemporalEntity, TemporalKg, TemporalRelationship, TemporalWriter, WriteReport,
    };
}
