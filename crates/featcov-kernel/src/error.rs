//! Error types for featcov kernel operations.

use std::path::PathBuf;

/// Fatal conditions that abort a coverage run.
///
/// Tolerated conditions (malformed rows, unreadable scanned files, duplicate
/// feature ids) never surface here; they are logged and counted instead.
#[derive(Debug, thiserror::Error)]
pub enum FeatcovError {
    /// The feature document does not exist.
    #[error("missing file: {}", path.display())]
    MissingDocument { path: PathBuf },

    /// The feature document exists but could not be read.
    #[error("failed reading {}: {reason}", path.display())]
    UnreadableDocument { path: PathBuf, reason: String },

    /// No line in the document matches the feature table header.
    #[error("could not find feature table header in {}", path.display())]
    MissingTableHeader { path: PathBuf },

    /// The header was found but no row below it parsed.
    #[error("no feature rows parsed from {}", path.display())]
    EmptyRegistry { path: PathBuf },

    /// An existing execution log could not be read.
    #[error("failed reading execution log {}: {reason}", path.display())]
    UnreadableLog { path: PathBuf, reason: String },

    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeatcovError {
    /// Stable snake_case identifier for machine-readable error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingDocument { .. } => "missing_document",
            Self::UnreadableDocument { .. } => "unreadable_document",
            Self::MissingTableHeader { .. } => "missing_table_header",
            Self::EmptyRegistry { .. } => "empty_registry",
            Self::UnreadableLog { .. } => "unreadable_log",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatcovError>;
