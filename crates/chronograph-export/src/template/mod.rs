//! Versioned, schema-validated templates mapping graph content to
//! structured export documents, with round-trip metadata embedding and
//! cross-version migration analysis.

mod embedder;
mod filler;
mod migrator;
mod model;
mod registry;

pub use embedder::{Position, TemplateEmbedder};
pub use filler::{
    create_skill_input, FillStatus, FilledContent, SegmentValue, TemplateFiller, ValidationError,
    ValidationErrorKind,
};
pub use migrator::{ChangeType, FieldChange, MigrationReport, SegmentChange, TemplateMigrator};
pub use model::{canonicalize_skill_name, Segment, Template, TemplateInfo, TransformSpec};
pub use registry::TemplateRegistry;
