//! Promotions service errors.

use shopifree::{discounts::DiscountError, validation::ValidationError};
use thiserror::Error;

use crate::documents::DocumentStoreError;

#[derive(Debug, Error)]
pub enum PromotionsServiceError {
    #[error("promotion already exists")]
    AlreadyExists,

    #[error("promotion not found")]
    NotFound,

    #[error("promotion was modified concurrently")]
    Conflict,

    #[error("invalid promotion")]
    Invalid(#[from] ValidationError),

    #[error("failed to price product")]
    Discount(#[from] DiscountError),

    #[error("storage error")]
    Storage(#[source] DocumentStoreError),
}

impl From<DocumentStoreError> for PromotionsServiceError {
    fn from(error: DocumentStoreError) -> Self {
        match error {
            DocumentStoreError::NotFound => Self::NotFound,
            DocumentStoreError::AlreadyExists => Self::AlreadyExists,
            DocumentStoreError::Conflict { .. } => Self::Conflict,
            _ => Self::Storage(error),
        }
    }
}
