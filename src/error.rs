//! Error types for fieldstore
//!
//! Provides a unified error type for all operations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::key::Key;

/// Result type alias using FieldError
pub type Result<T> = std::result::Result<T, FieldError>;

/// Unified error type for fieldstore operations
#[derive(Debug, Error)]
pub enum FieldError {
    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Schema parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Journal Format Errors
    // -------------------------------------------------------------------------
    #[error(
        "Record version mismatch in {}: got {version}, supported {supported:?}",
        path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        version: u16,
        supported: Vec<u16>,
    },

    #[error("Unknown record tag {tag} in {} at offset {offset}", path.display())]
    UnknownTag { path: PathBuf, offset: u64, tag: u8 },

    #[error("Corrupt record in {} at offset {offset}: {message}", path.display())]
    Format {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Consistency Errors
    // -------------------------------------------------------------------------
    #[error(
        "Key in journal {} is {found}, does not match requested key {expected}",
        path.display()
    )]
    KeyMismatch {
        path: PathBuf,
        expected: Key,
        found: Key,
    },

    #[error("Cannot find an INIT record in {}", path.display())]
    MissingInit { path: PathBuf },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FieldError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        FieldError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for errors that mean a journal is corrupt or from an incompatible format
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            FieldError::UnsupportedVersion { .. }
                | FieldError::UnknownTag { .. }
                | FieldError::Format { .. }
        )
    }
}

impl From<bincode::Error> for FieldError {
    fn from(e: bincode::Error) -> Self {
        FieldError::Serialization(e.to_string())
    }
}
