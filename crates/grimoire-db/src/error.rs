use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error that maps to no domain condition.
    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    /// The referenced record does not exist, or a submitted child id does
    /// not resolve under the targeted parent.
    #[error("record not found")]
    NotFound,

    /// The record exists but belongs to a different user.
    #[error("record belongs to another user")]
    Forbidden,

    /// A submitted field failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Delete blocked because other rows still reference this one.
    #[error("record is still referenced")]
    ReferentialIntegrity,

    /// Another writer holds the database lock.
    #[error("database is busy with a concurrent write")]
    Conflict,

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            match e.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return StoreError::Conflict;
                }
                ErrorCode::ConstraintViolation
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
                {
                    return StoreError::ReferentialIntegrity;
                }
                _ => {}
            }
        }
        StoreError::Sqlite(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
