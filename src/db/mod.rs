pub mod collection;
pub mod embedded;
pub mod filter;
pub mod integrity;
pub mod invalidation;
pub mod pipeline;
pub mod repository;
pub mod sqlite;
pub mod transaction;
pub mod watch;

pub use collection::*;
pub use filter::*;
pub use sqlite::*;
pub use transaction::run_in_transaction;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate key in {collection}: {detail}")]
    DuplicateKey { collection: String, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot delete {entity_type} {id}: still referenced by {collection}.{field}")]
    DependencyExists {
        entity_type: String,
        id: String,
        collection: String,
        field: String,
    },

    /// Reserved for optimistic locking on `save`. Writes are last-write-wins today.
    #[error("Concurrent modification of {entity_type} {id}")]
    ConcurrentModification { entity_type: String, id: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] Box<DatabaseError>),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Document encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        let code = err.sqlite_error().map(|e| (e.code, e.extended_code));
        match code {
            Some((ErrorCode::ConstraintViolation, extended))
                if extended == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || extended == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                let detail = err.to_string();
                let collection = unique_violation_table(&detail).unwrap_or_default();
                Self::DuplicateKey { collection, detail }
            }
            Some((ErrorCode::DatabaseBusy, _)) | Some((ErrorCode::DatabaseLocked, _)) => {
                Self::Timeout(err.to_string())
            }
            Some((ErrorCode::CannotOpen, _))
            | Some((ErrorCode::SystemIoFailure, _))
            | Some((ErrorCode::NotADatabase, _))
            | Some((ErrorCode::DiskFull, _)) => Self::StoreUnavailable(err.to_string()),
            _ => Self::Sqlite(err),
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: <table>.<column>` for plain
/// columns and `index '<name>'` for expression indexes.
fn unique_violation_table(message: &str) -> Option<String> {
    let rest = message.split("constraint failed: ").nth(1)?;
    if let Some(index) = rest.strip_prefix("index '") {
        return index.split('_').next().map(str::to_string);
    }
    rest.split('.').next().map(str::to_string)
}
