//! Error types for the template engine and export pipeline.

use chronograph_core::StoreError;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template validation failed: {0:?}")]
    Validation(Vec<String>),
    #[error("template not found: {id}@{version:?}")]
    NotFound { id: String, version: Option<String> },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
}

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
