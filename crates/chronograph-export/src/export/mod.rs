//! Graph-to-skill export pipeline: query, deduplicate, format, and track
//! sync state for incremental re-exports.

mod config;
mod dedup;
mod exporter;
mod formatter;
mod sync;

pub use config::ExportConfig;
pub use dedup::Deduplicator;
pub use exporter::{ChunkRecord, ExportMode, ExportResult, ExportedEntity, Exporter, Page, DEFAULT_CHUNK_LIMIT};
pub use formatter::Formatter;
pub use sync::SyncManager;
