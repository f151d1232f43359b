//! Graph store abstraction and its SQLite-backed implementation.
//!
//! No Neo4j driver exists in the available dependency ecosystem, so the
//! §6.1 wire schema is expressed as a `GraphStore` trait (shape grounded on
//! the `GraphStore`/`LlmConnector` async-trait pattern used for pluggable
//! backends elsewhere) with one concrete implementation, [`SqliteGraphStore`],
//! persisting communities/deltas/entities/relationships as SQLite tables.

mod error;
mod graph_store;
mod schema;
mod sqlite;
mod writer;

pub use error::{Result, StoreError};
pub use graph_store::{Community, CommunityDelta, DeltaStatus, GraphStore};
pub use schema::{apply_migrations, Migration, MIGRATIONS};
pub use sqlite::SqliteGraphStore;
pub use writer::{MergeStrategy, TemporalWriter, WriteReport};
