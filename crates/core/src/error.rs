//! Error types for the text core
//!
//! Only hard failures live here. Clicking outside text, selecting on a page
//! without a text layer and fuzzy searches with unusable parameters are
//! ordinary outcomes and never produce one of these.

use std::io;

/// Failure reported by a page text-extraction primitive
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("invalid page object for page {0}")]
    InvalidPage(u32),
    #[error("text extraction backend error: {0}")]
    Backend(String),
}

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors raised by highlight commands
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("highlight {0} not found")]
    HighlightNotFound(uuid::Uuid),
    #[error("highlight {0} already exists")]
    DuplicateHighlight(uuid::Uuid),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type HistoryResult<T> = Result<T, HistoryError>;
