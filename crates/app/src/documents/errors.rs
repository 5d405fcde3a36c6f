//! Document store errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("document already exists")]
    AlreadyExists,

    #[error("document not found")]
    NotFound,

    #[error("document was modified concurrently (expected version {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },

    #[error("document patch must be a JSON object")]
    InvalidPatch,

    #[error("failed to decode document")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode document")]
    Encode(#[source] serde_json::Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for DocumentStoreError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            _ => Self::Sql(error),
        }
    }
}
