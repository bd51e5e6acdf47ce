use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::telemetry::TelemetryError;

#[derive(Error, Debug)]
pub enum DumpadaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Errors returned by the sample, work front and front type operations.
///
/// Validation and not-found conditions are detected before any write, so
/// none of these leave partial state behind.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid value for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("A work front with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Audit entry {audit_id} does not belong to work front {work_front_id}")]
    Mismatch { audit_id: i64, work_front_id: i64 },

    #[error("Audit entry {0} has no prior state to revert to")]
    NoPriorState(i64),

    #[error("Write conflicted with a concurrent writer after {attempts} attempt(s)")]
    ConcurrencyConflict { attempts: u32 },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Serializable tag for a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    DuplicateCode,
    Mismatch,
    NoPriorState,
    ConcurrencyConflict,
    Database,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Validation { .. } => ErrorKind::Validation,
            ServiceError::DuplicateCode(_) => ErrorKind::DuplicateCode,
            ServiceError::Mismatch { .. } => ErrorKind::Mismatch,
            ServiceError::NoPriorState(_) => ErrorKind::NoPriorState,
            ServiceError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            ServiceError::Database(_) => ErrorKind::Database,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    /// Whether the underlying storage rejected the write on a UNIQUE guard.
    pub(crate) fn is_unique_violation(&self) -> bool {
        matches!(self, ServiceError::Database(e) if e.is_unique_violation())
    }
}

pub type Result<T> = std::result::Result<T, DumpadaError>;
