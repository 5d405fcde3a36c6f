//! Prelude

pub use crate::{
    clock::{Clock, FixedClock, SystemClock},
    coupons::{
        Coupon, CouponQuote, RedemptionError, check_redeemable, generate_coupon_code,
        generate_coupon_code_with, normalize_code,
    },
    discounts::{CouponDiscount, DiscountError, PromotionDiscount, percent_of_minor},
    promotions::{
        PriceQuote, Promotion, PromotionTarget, applicable_promotions, calculate_discounted_price,
    },
    status::{DiscountRecord, DiscountState, LifecycleStatus, resolve_status},
    usage::UsageCap,
    validation::ValidationError,
    window::DiscountWindow,
};
