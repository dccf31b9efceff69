// ==============================================================================
// error.rs - Error Types
// ==============================================================================
// Description: Fatal error taxonomy for dataset builds and queries
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LdLookupError>;

/// Errors that terminate a command
///
/// Per-line parse failures are not in here: those are recovered inside the
/// builder (see `parsers::ld::LdParseError`).
#[derive(Error, Debug)]
pub enum LdLookupError {
    #[error("Dataset '{0}' already exists")]
    DatasetExists(String),

    #[error("Dataset '{0}' not found")]
    UnknownDataset(String),

    #[error("Invalid dataset name '{name}': {reason}")]
    InvalidDatasetName { name: String, reason: String },

    #[error("Failed to read source file {path:?}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read marker list {path:?}: {source}")]
    MarkerListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset '{name}' is corrupted: {details}")]
    CorruptDataset { name: String, details: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LdLookupError {
    /// Stable identifier for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            LdLookupError::DatasetExists(_) => "DATASET_EXISTS",
            LdLookupError::UnknownDataset(_) => "DATASET_NOT_FOUND",
            LdLookupError::InvalidDatasetName { .. } => "INVALID_DATASET_NAME",
            LdLookupError::SourceUnreadable { .. } => "SOURCE_UNREADABLE",
            LdLookupError::MarkerListUnreadable { .. } => "MARKER_LIST_UNREADABLE",
            LdLookupError::CorruptDataset { .. } => "CORRUPT_DATASET",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for this error (2 is left to clap usage errors)
    pub fn exit_code(&self) -> i32 {
        match self {
            LdLookupError::DatasetExists(_) => 3,
            LdLookupError::UnknownDataset(_) => 4,
            LdLookupError::InvalidDatasetName { .. } => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_nonzero_and_distinct() {
        let exists = LdLookupError::DatasetExists("ds1".to_string());
        let missing = LdLookupError::UnknownDataset("ds1".to_string());
        let io = LdLookupError::Io(std::io::Error::other("disk full"));

        assert_eq!(exists.exit_code(), 3);
        assert_eq!(missing.exit_code(), 4);
        assert_eq!(io.exit_code(), 1);
        assert_eq!(exists.code(), "DATASET_EXISTS");
        assert_eq!(io.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_display_names_dataset() {
        let err = LdLookupError::DatasetExists("ds1".to_string());
        assert_eq!(err.to_string(), "Dataset 'ds1' already exists");
    }
}
