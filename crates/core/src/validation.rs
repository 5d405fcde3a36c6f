//! Validation errors

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a coupon or promotion is rejected before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The display name is empty or whitespace.
    #[error("name must not be empty")]
    EmptyName,

    /// The coupon code is empty or whitespace.
    #[error("coupon code must not be empty")]
    EmptyCode,

    /// The coupon code contains characters other than ASCII letters, digits, `-` or `_`.
    #[error("coupon code `{0}` contains unsupported characters")]
    InvalidCode(String),

    /// A percentage discount outside `[0, 100]`.
    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(Decimal),

    /// A bounded window whose start lies after its end.
    #[error("window starts at {starts_at} after it ends at {ends_at}")]
    StartsAfterEnds {
        /// Window start.
        starts_at: Timestamp,

        /// Window end.
        ends_at: Timestamp,
    },

    /// A buy-x-get-y promotion with a zero quantity.
    #[error("buy and get quantities must both be at least 1")]
    ZeroQuantity,

    /// A usage cap of zero, which would make the discount unusable from creation.
    #[error("usage caps must be at least 1 when set")]
    ZeroUsageCap,
}
