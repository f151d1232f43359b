//! Delta-summary-accumulation error type.

use crate::store::StoreError;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DsaError {
    #[error("no such community: {0}")]
    NoSuchCommunity(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("llm call failed: {0}")]
    Llm(String),
}

pub type Result<T> = std::result::Result<T, DsaError>;
