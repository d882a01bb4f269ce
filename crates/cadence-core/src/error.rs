//! Error handling for the store
//!
//! Provides the typed error taxonomy shared by the database, state store,
//! and mutation layers. Every variant carries a machine-readable code so
//! callers can react without matching on message text.

use std::io;

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input failed schema constraints; no state was mutated
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Operation targeted a nonexistent entity
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Attempted creation with a colliding key
    #[error("{kind} already exists: {id}")]
    DuplicateKey { kind: &'static str, id: String },

    /// A mutation with the same operation key is already in flight
    #[error("Operation already in progress: {key}")]
    OperationInProgress { key: String },

    /// Import document is missing required structure
    #[error("Invalid import format: {reason}")]
    InvalidFormat { reason: String },

    /// The durable write layer itself failed
    #[error("Persistence failure ({code}): {source}")]
    Persistence {
        code: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Create a validation error for a named field
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an entity kind and id
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a duplicate-key error for an entity kind and id
    pub fn duplicate(kind: &'static str, id: impl ToString) -> Self {
        StoreError::DuplicateKey {
            kind,
            id: id.to_string(),
        }
    }

    /// Machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation { .. } => "VALIDATION",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::DuplicateKey { .. } => "DUPLICATE_KEY",
            StoreError::OperationInProgress { .. } => "OPERATION_IN_PROGRESS",
            StoreError::InvalidFormat { .. } => "INVALID_FORMAT",
            StoreError::Persistence { code, .. } => code,
        }
    }

    /// Whether retrying the operation could succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::OperationInProgress { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        let code = match &error {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                rusqlite::ErrorCode::ConstraintViolation => "CONSTRAINT",
                rusqlite::ErrorCode::DiskFull => "DISK_FULL",
                rusqlite::ErrorCode::DatabaseBusy => "DATABASE_BUSY",
                _ => "DATABASE",
            },
            _ => "DATABASE",
        };
        StoreError::Persistence {
            code,
            source: Box::new(error),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        let code = match error.kind() {
            io::ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            io::ErrorKind::NotFound => "FILE_NOT_FOUND",
            _ if is_disk_full_error(&error) => "DISK_FULL",
            _ => "IO",
        };
        StoreError::Persistence {
            code,
            source: Box::new(error),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Persistence {
            code: "SERIALIZE",
            source: Box::new(error),
        }
    }
}

/// Check if an I/O error indicates a disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
