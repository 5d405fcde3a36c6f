//! Coupons
//!
//! Merchant and recovery coupons, their codes, and what a coupon is worth on an order.

use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{CouponDiscount, DiscountError, percent_of_minor},
    status::{DiscountRecord, DiscountState, LifecycleStatus},
    usage::UsageCap,
    validation::ValidationError,
    window::DiscountWindow,
};

/// Characters taken from the base name.
pub const CODE_PREFIX_LEN: usize = 4;

/// Random base-36 characters appended to the prefix.
pub const CODE_SUFFIX_LEN: usize = 6;

/// Longest generated code.
pub const CODE_MAX_LEN: usize = 12;

/// A coupon redeemed by code at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Display label.
    pub name: String,

    /// Redemption code, stored uppercase.
    pub code: String,

    /// Discount kind and magnitude.
    pub discount: CouponDiscount,

    /// When the coupon can be redeemed.
    pub window: DiscountWindow,

    /// Manual pause flag.
    #[serde(default)]
    pub paused: bool,

    /// Usage limits.
    #[serde(default)]
    pub usage_cap: UsageCap,

    /// Cached usage counter, refreshed opportunistically.
    #[serde(default)]
    pub total_uses: u64,

    /// Generated by abandoned-cart recovery rather than created by a merchant.
    #[serde(default)]
    pub is_recovery_coupon: bool,
}

impl Coupon {
    /// Check the coupon and normalize its code, ready to be written.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        self.code = normalize_code(&self.code)?;
        self.discount.validate()?;
        self.window.validate()?;
        self.usage_cap.validate()?;

        Ok(self)
    }

    /// What this coupon takes off an order with the given subtotal and shipping.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::PercentConversion`] when a percentage cannot be applied.
    pub fn quote(&self, subtotal: u64, shipping: u64) -> Result<CouponQuote, DiscountError> {
        let (discount, shipping_discount) = match self.discount {
            CouponDiscount::Percentage { value } => (percent_of_minor(value, subtotal)?, 0),
            CouponDiscount::FixedAmount { amount } => (amount, 0),
            CouponDiscount::FreeShipping => (0, shipping),
        };

        let discount = discount.min(subtotal);

        Ok(CouponQuote {
            subtotal,
            shipping,
            discount,
            shipping_discount,
            total: subtotal
                .saturating_sub(discount)
                .saturating_add(shipping.saturating_sub(shipping_discount)),
        })
    }
}

impl DiscountRecord for Coupon {
    fn window(&self) -> &DiscountWindow {
        &self.window
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn usage_cap(&self) -> &UsageCap {
        &self.usage_cap
    }

    fn cached_uses(&self) -> u64 {
        self.total_uses
    }
}

/// A coupon priced against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponQuote {
    /// Order subtotal before discount.
    pub subtotal: u64,

    /// Shipping before discount.
    pub shipping: u64,

    /// Discount taken off the subtotal.
    pub discount: u64,

    /// Discount taken off shipping.
    pub shipping_discount: u64,

    /// Amount payable.
    pub total: u64,
}

/// Reasons a coupon cannot be redeemed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedemptionError {
    /// The coupon is paused.
    #[error("coupon is paused")]
    Paused,

    /// The window has not started.
    #[error("coupon is not active yet")]
    NotStarted,

    /// The window has closed.
    #[error("coupon has expired")]
    Expired,

    /// The total usage cap is used up.
    #[error("coupon usage limit reached")]
    Exhausted,

    /// This customer has used the coupon as often as allowed.
    #[error("customer usage limit reached")]
    CustomerLimitReached,

    /// The coupon limits uses per customer and the checkout names no customer.
    #[error("coupon requires an identified customer")]
    CustomerRequired,
}

/// Check a coupon can be redeemed by a customer who has used it `customer_uses` times.
///
/// `customer_uses` is `None` for an anonymous checkout, which is refused when the coupon has a
/// per-customer cap.
///
/// # Errors
///
/// Returns the [`RedemptionError`] explaining why the coupon cannot be used.
pub fn check_redeemable(
    state: &DiscountState,
    cap: &UsageCap,
    customer_uses: Option<u64>,
) -> Result<(), RedemptionError> {
    match state.status {
        LifecycleStatus::Paused => return Err(RedemptionError::Paused),
        LifecycleStatus::Scheduled => return Err(RedemptionError::NotStarted),
        LifecycleStatus::Expired => return Err(RedemptionError::Expired),
        LifecycleStatus::Active => {}
    }

    if state.exhausted {
        return Err(RedemptionError::Exhausted);
    }

    match customer_uses {
        Some(uses) if cap.customer_limit_reached(uses) => {
            Err(RedemptionError::CustomerLimitReached)
        }
        None if cap.uses_per_customer.is_some() => Err(RedemptionError::CustomerRequired),
        _ => Ok(()),
    }
}

/// Canonical form of a coupon code: trimmed and ASCII uppercase.
///
/// Codes compare case-insensitively, so two codes are the same coupon exactly when their
/// normalized forms are equal.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyCode`] for a blank code and
/// [`ValidationError::InvalidCode`] for codes with characters other than ASCII letters,
/// digits, `-` and `_`.
pub fn normalize_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::EmptyCode);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidCode(code.to_string()));
    }

    Ok(code.to_ascii_uppercase())
}

/// Generate a code from `base_name` using the thread-local RNG.
///
/// See [`generate_coupon_code_with`]. Uniqueness is not checked.
pub fn generate_coupon_code(base_name: &str) -> String {
    generate_coupon_code_with(base_name, &mut thread_rng())
}

/// Generate a code: up to four uppercase alphanumerics from `base_name` followed by six
/// random uppercase base-36 characters, at most twelve characters overall.
///
/// The prefix is determined by the name; the suffix is random. Uniqueness is not checked.
pub fn generate_coupon_code_with<R: Rng>(base_name: &str, rng: &mut R) -> String {
    let prefix = base_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(CODE_PREFIX_LEN);

    let suffix = (0..CODE_SUFFIX_LEN)
        .filter_map(|_| char::from_digit(rng.gen_range(0..36), 36))
        .map(|c| c.to_ascii_uppercase());

    prefix.chain(suffix).take(CODE_MAX_LEN).collect()
}
