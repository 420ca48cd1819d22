//! Record store error types
//!
//! Error codes:
//! - JSONDB_IO_ERROR: open/read/write/sync failures
//! - JSONDB_PARSE_ERROR: table file is not a JSON array of records
//! - JSONDB_SERIALIZATION_ERROR: a record could not be encoded
//! - JSONDB_INDEX_OUT_OF_RANGE: update/delete past the end of the table
//! - JSONDB_NOT_INITIALIZED / JSONDB_ALREADY_INITIALIZED / JSONDB_CLOSED: lifecycle misuse
//! - JSONDB_WORKER_UNAVAILABLE: the request worker exited before replying
//! - JSONDB_LOCK_POISONED: a thread panicked while holding the lifecycle lock

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed table file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode table: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Index {index} out of range for table of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Store is not initialized")]
    NotInitialized,

    #[error("Store is already initialized")]
    AlreadyInitialized,

    #[error("Store is closed")]
    Closed,

    #[error("Store worker is unavailable")]
    WorkerUnavailable,

    #[error("Store lifecycle lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "JSONDB_IO_ERROR",
            StoreError::Parse { .. } => "JSONDB_PARSE_ERROR",
            StoreError::Serialization(_) => "JSONDB_SERIALIZATION_ERROR",
            StoreError::IndexOutOfRange { .. } => "JSONDB_INDEX_OUT_OF_RANGE",
            StoreError::NotInitialized => "JSONDB_NOT_INITIALIZED",
            StoreError::AlreadyInitialized => "JSONDB_ALREADY_INITIALIZED",
            StoreError::Closed => "JSONDB_CLOSED",
            StoreError::WorkerUnavailable => "JSONDB_WORKER_UNAVAILABLE",
            StoreError::LockPoisoned => "JSONDB_LOCK_POISONED",
        }
    }

    /// Whether the cache may have diverged from the file.
    ///
    /// After such an error the store should be reloaded before trusting the
    /// in-memory table again.
    pub fn may_diverge(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::Serialization(_))
    }
}
