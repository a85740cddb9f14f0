//! Error types for Formation Insights

use thiserror::Error;

/// Errors raised by the store, configuration, and outer surfaces.
///
/// The analysis pass itself never fails; these only come from mutating the
/// entry store or from parsing caller-supplied input.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid journal entry: {0}")]
    InvalidEntry(String),

    #[error("Duplicate entry id: {0}")]
    DuplicateEntry(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, InsightError>;
