//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// An audit snapshot could not be encoded or decoded.
    #[error("Snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A stored value does not parse back into its typed form.
    #[error("Corrupt value '{value}' in {table}.{column}")]
    Corrupt {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

impl DatabaseError {
    /// Whether this error is a UNIQUE / PRIMARY KEY constraint violation.
    ///
    /// These are the storage-level guards against racing writers; callers
    /// treat them as retryable conflicts.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.extended_code,
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            ),
            _ => false,
        }
    }

    pub(crate) fn corrupt(table: &'static str, column: &'static str, value: impl Into<String>) -> Self {
        DatabaseError::Corrupt {
            table,
            column,
            value: value.into(),
        }
    }
}
