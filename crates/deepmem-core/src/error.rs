//! Error taxonomy for the memory store.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors surfaced to callers of the store.
///
/// A missing id is not an error: lookups return `Option`/`bool`.
/// A missing or corrupt storage file is not an error either, see
/// [`LoadStatus`](crate::storage::LoadStatus).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied input that cannot become a valid record.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Filesystem failure while writing the collection or reading an
    /// explicitly named import/export file.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error classification, handy for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn storage(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage { .. } | Self::Serialization(_) => ErrorKind::Storage,
        }
    }
}
