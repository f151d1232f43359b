//! Temporal knowledge graph core: entities/relationships, the in-memory
//! graph they compose into, and the extraction adapter that builds one from
//! raw chunks.

pub mod entity;
mod extraction;
mod graph;

pub use entity::{sanitize_identifier, PropertyMap, PropertyValue, TemporalEntity, TemporalRelationship};
pub use extraction::{AdapterConfig, AtomExtractor, AtomicFact, ExtractionAdapter, ExtractionError};
pub use graph::{ChunkInput, GraphDocument, GraphDocumentEdge, GraphDocumentNode, TemporalKg};
