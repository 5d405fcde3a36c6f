//! Coupons Data

use shopifree::{
    coupons::{Coupon, CouponQuote},
    discounts::CouponDiscount,
    status::DiscountState,
    usage::UsageCap,
    window::DiscountWindow,
};
use smallvec::SmallVec;

use crate::domain::coupons::records::{CouponRecord, CouponUuid};

/// New Coupon Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub coupon: Coupon,
}

/// Coupon Update Data
///
/// Fields left as `None` keep their stored value. `expected_version` opts into optimistic
/// concurrency; without it the last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub discount: Option<CouponDiscount>,
    pub window: Option<DiscountWindow>,
    pub usage_cap: Option<UsageCap>,
    pub expected_version: Option<u64>,
}

impl CouponUpdate {
    /// Body fields this update sets.
    pub(crate) fn changed_fields(&self) -> SmallVec<[&'static str; 5]> {
        let mut fields = SmallVec::new();

        for (field, set) in [
            ("name", self.name.is_some()),
            ("code", self.code.is_some()),
            ("discount", self.discount.is_some()),
            ("window", self.window.is_some()),
            ("usage_cap", self.usage_cap.is_some()),
        ] {
            if set {
                fields.push(field);
            }
        }

        fields
    }

    pub(crate) fn apply_to(self, coupon: &Coupon) -> Coupon {
        let mut updated = coupon.clone();

        if let Some(name) = self.name {
            updated.name = name;
        }

        if let Some(code) = self.code {
            updated.code = code;
        }

        if let Some(discount) = self.discount {
            updated.discount = discount;
        }

        if let Some(window) = self.window {
            updated.window = window;
        }

        if let Some(usage_cap) = self.usage_cap {
            updated.usage_cap = usage_cap;
        }

        updated
    }
}

/// Coupon listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CouponQuery {
    /// `Some(true)` for recovery coupons only, `Some(false)` for merchant coupons only.
    pub recovery: Option<bool>,
}

/// A coupon with its state as of the read.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponSummary {
    pub record: CouponRecord,
    pub state: DiscountState,

    /// Whether `state.uses` came from a live order count rather than the cached counter.
    pub live_usage: bool,
}

/// An order a coupon is being checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponCheckout {
    pub code: String,
    pub customer: Option<String>,
    pub subtotal: u64,
    pub shipping: u64,
}

/// A coupon accepted for an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRedemption {
    pub coupon: CouponUuid,
    pub state: DiscountState,
    pub quote: CouponQuote,
}
