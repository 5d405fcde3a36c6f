//! Usage errors.

use thiserror::Error;

use crate::documents::DocumentStoreError;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("failed to count orders")]
    Storage(#[from] DocumentStoreError),
}
