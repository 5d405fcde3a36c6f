//! Coupons service errors.

use shopifree::{coupons::RedemptionError, discounts::DiscountError, validation::ValidationError};
use thiserror::Error;

use crate::{documents::DocumentStoreError, domain::usage::UsageError};

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon already exists")]
    AlreadyExists,

    #[error("coupon not found")]
    NotFound,

    #[error("coupon code `{0}` is already in use")]
    DuplicateCode(String),

    #[error("coupon was modified concurrently")]
    Conflict,

    #[error("invalid coupon")]
    Invalid(#[from] ValidationError),

    #[error("could not generate an unused coupon code")]
    CodeGenerationExhausted,

    #[error("coupon cannot be redeemed")]
    NotRedeemable(#[from] RedemptionError),

    #[error("failed to price coupon")]
    Discount(#[from] DiscountError),

    #[error("usage count unavailable")]
    Usage(#[from] UsageError),

    #[error("storage error")]
    Storage(#[source] DocumentStoreError),
}

impl From<DocumentStoreError> for CouponsServiceError {
    fn from(error: DocumentStoreError) -> Self {
        match error {
            DocumentStoreError::NotFound => Self::NotFound,
            DocumentStoreError::AlreadyExists => Self::AlreadyExists,
            DocumentStoreError::Conflict { .. } => Self::Conflict,
            _ => Self::Storage(error),
        }
    }
}
