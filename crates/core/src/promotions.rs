//! Promotions
//!
//! Selecting which of a store's promotions applies to a product and pricing the product with
//! it. Only the highest-priority applicable promotion is ever applied; promotions never stack.

use std::cmp::Reverse;

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    discounts::{DiscountError, PromotionDiscount},
    status::{DiscountRecord, LifecycleStatus},
    usage::UsageCap,
    validation::ValidationError,
    window::DiscountWindow,
};

/// Which products a promotion targets.
///
/// Category and brand targeting is stored but not evaluated: promotions targeting either
/// currently match no product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionTarget {
    /// Every product in the store.
    AllProducts,

    /// Only the listed products.
    SpecificProducts {
        /// Targeted product identifiers.
        ids: FxHashSet<String>,
    },

    /// Products in the listed categories.
    Categories {
        /// Targeted category identifiers.
        ids: FxHashSet<String>,
    },

    /// Products of the listed brands.
    Brands {
        /// Targeted brand identifiers.
        ids: FxHashSet<String>,
    },
}

impl PromotionTarget {
    /// Target an explicit set of products.
    pub fn products<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SpecificProducts {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Stable string form of the target kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AllProducts => "all_products",
            Self::SpecificProducts { .. } => "specific_products",
            Self::Categories { .. } => "categories",
            Self::Brands { .. } => "brands",
        }
    }

    /// Whether the target includes `product_id`.
    pub fn matches(&self, product_id: &str) -> bool {
        match self {
            Self::AllProducts => true,
            Self::SpecificProducts { ids } => ids.contains(product_id),
            Self::Categories { .. } | Self::Brands { .. } => false,
        }
    }
}

/// A store promotion applied automatically to matching products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Display label.
    pub name: String,

    /// Discount kind and magnitude.
    pub discount: PromotionDiscount,

    /// When the promotion runs.
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

    /// Products the promotion applies to.
    pub target: PromotionTarget,

    /// Higher values win when several promotions apply.
    #[serde(default)]
    pub priority: i32,

    /// Whether storefronts show a badge on discounted products.
    #[serde(default)]
    pub show_badge: bool,
}

impl Promotion {
    /// Check the promotion before it is written.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        self.discount.validate()?;
        self.window.validate()?;
        self.usage_cap.validate()
    }
}

impl AsRef<Promotion> for Promotion {
    fn as_ref(&self) -> &Promotion {
        self
    }
}

impl DiscountRecord for Promotion {
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

/// The outcome of pricing a product.
#[derive(Debug)]
pub struct PriceQuote<'a, P> {
    /// Price before discount, in minor units.
    pub original_price: u64,

    /// Price after discount, never negative.
    pub final_price: u64,

    /// Discount taken off the original price.
    pub discount: u64,

    /// The promotion that produced the discount, if any.
    pub applied: Option<&'a P>,
}

impl<P> Clone for PriceQuote<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PriceQuote<'_, P> {}

/// Promotions applicable to `product_id` at `now`, highest priority first.
///
/// A promotion applies when its resolved status is active, `now` lies within its window and
/// its target matches the product. Equal priorities keep their input order.
pub fn applicable_promotions<'a, P: AsRef<Promotion>>(
    product_id: &str,
    promotions: &'a [P],
    now: Timestamp,
) -> Vec<&'a P> {
    let mut applicable: Vec<&'a P> = promotions
        .iter()
        .filter(|candidate| {
            let promotion = (*candidate).as_ref();

            promotion.status_at(now) == LifecycleStatus::Active
                && promotion.window.contains(now)
                && promotion.target.matches(product_id)
        })
        .collect();

    applicable.sort_by_key(|promotion| Reverse((*promotion).as_ref().priority));

    applicable
}

/// Price an item using the first, highest-priority, promotion in `sorted`.
///
/// Lower-priority promotions are ignored. With no promotions the original price stands.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] when a percentage cannot be applied.
pub fn calculate_discounted_price<'a, P: AsRef<Promotion>>(
    original_price: u64,
    sorted: &[&'a P],
) -> Result<PriceQuote<'a, P>, DiscountError> {
    let Some(&head) = sorted.first() else {
        return Ok(PriceQuote {
            original_price,
            final_price: original_price,
            discount: 0,
            applied: None,
        });
    };

    let discount = head.as_ref().discount.discount_for(original_price)?;

    Ok(PriceQuote {
        original_price,
        final_price: original_price.saturating_sub(discount),
        discount,
        applied: Some(head),
    })
}
