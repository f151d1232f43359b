//! # Chronograph Export
//!
//! Versioned, schema-validated template engine and export pipeline that
//! turns a [`chronograph_core`] knowledge graph into skill-consumable
//! documents:
//!
//! - **Templates**: a file-backed registry of `{id}@{version}` templates,
//!   a filler that maps graph content into a template's segments, round-trip
//!   metadata embedding in exported markdown, and cross-version migration
//!   diffing.
//! - **Export**: queries communities/entities/relationships from a
//!   `GraphStore`, deduplicates, formats into the legacy or template-layered
//!   shape, and tracks which communities have already been synced.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod export;
pub mod template;

pub use error::{ExportError, Result, TemplateError, TemplateResult};
pub use export::{
    ChunkRecord, Deduplicator, ExportConfig, ExportMode, ExportResult, ExportedEntity, Exporter,
    Formatter, Page, SyncManager, DEFAULT_CHUNK_LIMIT,
};
pub use template::{
    canonicalize_skill_name, create_skill_input, ChangeType, FieldChange, FillStatus, FilledContent,
    MigrationReport, Position, Segment, SegmentChange, SegmentValue, Template, TemplateEmbedder,
    TemplateFiller, TemplateInfo, TemplateMigrator, TemplateRegistry, TransformSpec, ValidationError,
    ValidationErrorKind,
};

pub mod prelude {
    pub use crate::{
        ChunkRecord, Deduplicator, ExportConfig, ExportMode, ExportResult, Exporter, Formatter, Page,
        Segment, SyncManager, Template, TemplateEmbedder, TemplateFiller, TemplateMigrator,
        TemplateRegistry,
    };
}
