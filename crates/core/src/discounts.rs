//! Discount utilities
//!
//! Discount kinds for coupons and promotions, and the arithmetic shared between them. All
//! amounts are in minor currency units.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors specific to discount calculations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not representable")]
    PercentConversion,
}

/// Discount offered by a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponDiscount {
    /// Percentage off the order subtotal.
    Percentage {
        /// Whole or fractional percent in `[0, 100]`.
        value: Decimal,
    },

    /// Fixed amount off the order subtotal, never more than the subtotal.
    FixedAmount {
        /// Amount in minor units.
        amount: u64,
    },

    /// Shipping is waived.
    FreeShipping,
}

impl CouponDiscount {
    /// Stable string form of the discount kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::FixedAmount { .. } => "fixed_amount",
            Self::FreeShipping => "free_shipping",
        }
    }

    /// Check the discount magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PercentageOutOfRange`] for percentages outside `[0, 100]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Percentage { value } => validate_percentage(*value),
            Self::FixedAmount { .. } | Self::FreeShipping => Ok(()),
        }
    }
}

/// Discount offered by a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionDiscount {
    /// Percentage off the item price.
    Percentage {
        /// Whole or fractional percent in `[0, 100]`.
        value: Decimal,
    },

    /// Fixed amount off the item price, never more than the price.
    FixedAmount {
        /// Amount in minor units.
        amount: u64,
    },

    /// Buy `buy` items, get `get` free. Priced at checkout, not per item.
    BuyXGetY {
        /// Items the customer pays for.
        buy: u32,

        /// Items the customer receives free.
        get: u32,
    },
}

impl PromotionDiscount {
    /// Stable string form of the discount kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::FixedAmount { .. } => "fixed_amount",
            Self::BuyXGetY { .. } => "buy_x_get_y",
        }
    }

    /// Check the discount magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PercentageOutOfRange`] for percentages outside `[0, 100]`
    /// and [`ValidationError::ZeroQuantity`] for a buy-x-get-y with a zero side.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Percentage { value } => validate_percentage(*value),
            Self::FixedAmount { .. } => Ok(()),
            Self::BuyXGetY { buy, get } => {
                if *buy == 0 || *get == 0 {
                    return Err(ValidationError::ZeroQuantity);
                }

                Ok(())
            }
        }
    }

    /// Discount on a single item priced at `price`, clamped to the price.
    ///
    /// Buy-x-get-y has no per-item discount and yields zero.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::PercentConversion`] when the percentage cannot be applied.
    pub fn discount_for(&self, price: u64) -> Result<u64, DiscountError> {
        let discount = match self {
            Self::Percentage { value } => percent_of_minor(*value, price)?,
            Self::FixedAmount { amount } => *amount,
            Self::BuyXGetY { .. } => 0,
        };

        Ok(discount.min(price))
    }
}

fn validate_percentage(value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::PercentageOutOfRange(value));
    }

    Ok(())
}

/// Calculate `percent`% of an amount in minor units, rounded to the nearest minor unit with
/// midpoints away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or the result
/// cannot be represented as `u64` (for example a negative percentage).
pub fn percent_of_minor(percent: Decimal, minor: u64) -> Result<u64, DiscountError> {
    let minor = Decimal::from_u64(minor).ok_or(DiscountError::PercentConversion)?;

    percent
        .checked_mul(minor)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(DiscountError::PercentConversion)
}
