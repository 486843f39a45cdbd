//! # FileSearch - Lightweight Path Index
//!
//! Index filesystem entries into SQLite and find them again by name.
//!
//! FileSearch provides:
//! - Case-insensitive edit distance, also registered as a SQL function
//! - Exact / prefix / substring / fuzzy matching over path and tag names
//! - Tags and categories with many-to-many membership
//! - A similarity guard that catches near-duplicate tags before they exist
//! - Versioned schema with a one-shot legacy upgrade

pub mod distance;
pub mod settings;
pub mod storage;
pub mod query;
pub mod guard;
pub mod confirm;
pub mod walker;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use confirm::Confirm;
pub use guard::{SimilarityGuard, TagResolution};
pub use query::{MatchEngine, StructuredQuery};
pub use settings::SettingKey;
pub use storage::{Category, PathEntry, SqliteStore, Tag};

use std::path::PathBuf;

/// Result type alias for FileSearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for FileSearch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} already exists: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    AllocationFailure(#[from] distance::AllocationFailure),

    #[error("Schema migration declined")]
    MigrationDeclined,

    #[error("Unsupported schema version {found} (this build understands up to {supported})")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let Some(failure) = allocation_failure(&err) {
            return Error::AllocationFailure(failure);
        }
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Error::ConstraintViolation(err.to_string())
            }
            _ => Error::Storage(err),
        }
    }
}

/// An edit distance failure raised inside the `levenshtein` SQL function.
/// SQLite may hand it back boxed or only as its message.
fn allocation_failure(err: &rusqlite::Error) -> Option<distance::AllocationFailure> {
    match err {
        rusqlite::Error::UserFunctionError(inner) => {
            inner.downcast_ref::<distance::AllocationFailure>().cloned()
        }
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            distance::AllocationFailure::from_message(message)
        }
        _ => None,
    }
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound { kind, name: name.into() }
    }
}
