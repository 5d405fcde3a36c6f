//! Usage Counter

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use mockall::automock;
use tracing::warn;
use uuid::Uuid;

use crate::{
    documents::{Collection, DocumentStore, Filter},
    domain::{
        coupons::records::CouponUuid, promotions::records::PromotionUuid,
        stores::records::StoreUuid, usage::UsageError,
    },
};

/// Order status counted as a redemption.
pub const COMPLETED_ORDER_STATUS: &str = "completed";

/// Order field naming the customer.
pub const ORDER_CUSTOMER_FIELD: &str = "customer_id";

const ORDER_STATUS_FIELD: &str = "status";

/// The discount an order references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountReference {
    Coupon(CouponUuid),
    Promotion(PromotionUuid),
}

impl DiscountReference {
    /// Order field holding this kind of reference.
    #[must_use]
    pub const fn order_field(self) -> &'static str {
        match self {
            Self::Coupon(_) => "applied_coupon_uuid",
            Self::Promotion(_) => "applied_promotion_uuid",
        }
    }

    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Coupon(uuid) => uuid.into_uuid(),
            Self::Promotion(uuid) => uuid.into_uuid(),
        }
    }

    fn filters(self) -> Vec<Filter> {
        vec![
            Filter::equals(ORDER_STATUS_FIELD, COMPLETED_ORDER_STATUS),
            Filter::equals(self.order_field(), self.uuid().to_string()),
        ]
    }
}

#[automock]
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Completed orders referencing the discount.
    async fn count_uses(
        &self,
        store: StoreUuid,
        reference: DiscountReference,
    ) -> Result<u64, UsageError>;

    /// Completed orders by `customer` referencing the discount.
    async fn count_customer_uses(
        &self,
        store: StoreUuid,
        reference: DiscountReference,
        customer: String,
    ) -> Result<u64, UsageError>;
}

/// Counts usage by querying the store's `orders` collection.
#[derive(Clone)]
pub struct DocumentUsageCounter {
    documents: Arc<dyn DocumentStore>,
}

impl DocumentUsageCounter {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl UsageCounter for DocumentUsageCounter {
    #[tracing::instrument(
        name = "usage.counter.count_uses",
        skip(self),
        fields(store_uuid = %store),
        err
    )]
    async fn count_uses(
        &self,
        store: StoreUuid,
        reference: DiscountReference,
    ) -> Result<u64, UsageError> {
        Ok(self
            .documents
            .count(store, Collection::Orders, reference.filters())
            .await?)
    }

    #[tracing::instrument(
        name = "usage.counter.count_customer_uses",
        skip(self, customer),
        fields(store_uuid = %store),
        err
    )]
    async fn count_customer_uses(
        &self,
        store: StoreUuid,
        reference: DiscountReference,
        customer: String,
    ) -> Result<u64, UsageError> {
        let mut filters = reference.filters();

        filters.push(Filter::equals(ORDER_CUSTOMER_FIELD, customer));

        Ok(self
            .documents
            .count(store, Collection::Orders, filters)
            .await?)
    }
}

/// Live usage for each reference, fetched concurrently and returned in input order. A failed
/// count yields `None` so the caller falls back to the cached counter.
pub async fn live_uses<I>(
    counter: &dyn UsageCounter,
    store: StoreUuid,
    references: I,
) -> Vec<Option<u64>>
where
    I: IntoIterator<Item = DiscountReference>,
{
    join_all(references.into_iter().map(|reference| async move {
        match counter.count_uses(store, reference).await {
            Ok(uses) => Some(uses),
            Err(error) => {
                warn!(
                    %error,
                    store_uuid = %store,
                    discount_uuid = %reference.uuid(),
                    "live usage count unavailable, using cached counter"
                );

                None
            }
        }
    }))
    .await
}
