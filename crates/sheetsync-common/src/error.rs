//! Error types for sheetsync

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Every failure a sync cycle can produce.
///
/// Per-item variants (`InvalidKey`, `Fetch`, `EmptySpreadsheet`, `Timeout`,
/// `Publish`, `Compression`) are isolated to the spreadsheet they belong to;
/// the orchestrator records them and moves on.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Spreadsheet key is invalid: {0}")]
    InvalidKey(String),

    #[error("Failed to fetch spreadsheet {key}: {reason}")]
    Fetch { key: String, reason: String },

    #[error("Spreadsheet {0} returned no data")]
    EmptySpreadsheet(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Failed to format {key}: {reason}")]
    Format { key: String, reason: String },

    #[error("Failed to publish {path}: {reason}")]
    Publish { path: String, reason: String },

    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn fetch(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SyncError::Fetch {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn publish(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SyncError::Publish {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short category label used in status lines
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::InvalidKey(_) => "InvalidKey",
            SyncError::Fetch { .. } | SyncError::EmptySpreadsheet(_) => "FetchFailure",
            SyncError::Timeout { .. } => "Timeout",
            SyncError::Format { .. } => "FormatFailure",
            SyncError::Publish { .. } | SyncError::Compression(_) => "PublishFailure",
            SyncError::Io(_) => "IoFailure",
        }
    }
}
