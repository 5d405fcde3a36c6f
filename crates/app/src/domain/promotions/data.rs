//! Promotions Data

use shopifree::{
    discounts::PromotionDiscount,
    promotions::{Promotion, PromotionTarget},
    status::DiscountState,
    usage::UsageCap,
    window::DiscountWindow,
};
use smallvec::SmallVec;

use crate::domain::promotions::records::{PromotionRecord, PromotionUuid};

/// New Promotion Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromotion {
    pub uuid: PromotionUuid,
    pub promotion: Promotion,
}

/// Promotion Update Data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionUpdate {
    pub name: Option<String>,
    pub discount: Option<PromotionDiscount>,
    pub window: Option<DiscountWindow>,
    pub usage_cap: Option<UsageCap>,
    pub target: Option<PromotionTarget>,
    pub priority: Option<i32>,
    pub show_badge: Option<bool>,
    pub expected_version: Option<u64>,
}

impl PromotionUpdate {
    /// Body fields this update sets.
    pub(crate) fn changed_fields(&self) -> SmallVec<[&'static str; 7]> {
        let mut fields = SmallVec::new();

        for (field, set) in [
            ("name", self.name.is_some()),
            ("discount", self.discount.is_some()),
            ("window", self.window.is_some()),
            ("usage_cap", self.usage_cap.is_some()),
            ("target", self.target.is_some()),
            ("priority", self.priority.is_some()),
            ("show_badge", self.show_badge.is_some()),
        ] {
            if set {
                fields.push(field);
            }
        }

        fields
    }

    pub(crate) fn apply_to(self, promotion: &Promotion) -> Promotion {
        let mut updated = promotion.clone();

        if let Some(name) = self.name {
            updated.name = name;
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

        if let Some(target) = self.target {
            updated.target = target;
        }

        if let Some(priority) = self.priority {
            updated.priority = priority;
        }

        if let Some(show_badge) = self.show_badge {
            updated.show_badge = show_badge;
        }

        updated
    }
}

/// A promotion with its state as of the read.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionSummary {
    pub record: PromotionRecord,
    pub state: DiscountState,
    pub live_usage: bool,
}

/// A product priced with the store's promotions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPrice {
    pub product_id: String,
    pub original_price: u64,
    pub final_price: u64,
    pub discount: u64,

    /// The winning promotion, if any applied.
    pub promotion: Option<PromotionUuid>,

    /// Whether the winning promotion asks for a storefront badge.
    pub show_badge: bool,
}
