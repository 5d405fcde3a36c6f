//! Promotions Service

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::{Value, json};
use shopifree::{
    clock::Clock,
    promotions::{applicable_promotions, calculate_discounted_price},
    status::DiscountRecord,
};
use tracing::{Span, info};

use crate::{
    documents::{
        Collection, Direction, DocumentPath, DocumentQuery, DocumentStore, DocumentStoreError,
        OrderBy, OrderKey,
    },
    domain::{
        promotions::{
            PromotionsServiceError,
            data::{NewPromotion, ProductPrice, PromotionSummary, PromotionUpdate},
            records::{PromotionDocument, PromotionRecord, PromotionUuid},
        },
        persistence::{field_patch, refresh_cached_status},
        stores::records::StoreUuid,
        usage::{DiscountReference, UsageCounter, live_uses},
    },
};

const PRIORITY_FIELD: &str = "priority";

#[derive(Clone)]
pub struct DocumentPromotionsService {
    documents: Arc<dyn DocumentStore>,
    usage: Arc<dyn UsageCounter>,
    clock: Arc<dyn Clock>,
}

impl DocumentPromotionsService {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        usage: Arc<dyn UsageCounter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documents,
            usage,
            clock,
        }
    }

    async fn load_all(
        &self,
        store: StoreUuid,
    ) -> Result<Vec<PromotionRecord>, PromotionsServiceError> {
        let query = DocumentQuery::new().order_by(OrderBy {
            key: OrderKey::Field(PRIORITY_FIELD.to_string()),
            direction: Direction::Descending,
        });

        Ok(self
            .documents
            .list(store, Collection::Promotions, query)
            .await?
            .into_iter()
            .map(PromotionRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn summarize(
        &self,
        store: StoreUuid,
        record: PromotionRecord,
        live: Option<u64>,
    ) -> PromotionSummary {
        let state = record.promotion.state_at(self.clock.now(), live);
        let path = promotion_path(store, record.uuid);
        let record = refresh_cached_status(&*self.documents, path, record, state.status).await;

        PromotionSummary {
            record,
            state,
            live_usage: live.is_some(),
        }
    }

    async fn live_use(&self, store: StoreUuid, uuid: PromotionUuid) -> Option<u64> {
        live_uses(&*self.usage, store, [DiscountReference::Promotion(uuid)])
            .await
            .into_iter()
            .next()
            .flatten()
    }
}

#[async_trait]
impl PromotionsService for DocumentPromotionsService {
    #[tracing::instrument(
        name = "promotions.service.create_promotion",
        skip(self, promotion),
        fields(
            store_uuid = %store,
            promotion_uuid = %promotion.uuid,
            target_type = tracing::field::Empty,
            status = tracing::field::Empty
        ),
        err
    )]
    async fn create_promotion(
        &self,
        store: StoreUuid,
        promotion: NewPromotion,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let NewPromotion { uuid, promotion } = promotion;

        promotion.validate()?;

        let status = promotion.status_at(self.clock.now());

        let span = Span::current();

        span.record("target_type", promotion.target.as_str());
        span.record("status", tracing::field::display(status));

        let body = encode(&PromotionDocument {
            promotion,
            status: Some(status),
        })?;

        let document = self
            .documents
            .create(promotion_path(store, uuid), body)
            .await?;

        let record = PromotionRecord::try_from(document)?;

        info!(promotion_uuid = %record.uuid, "created promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.get_promotion",
        skip(self),
        fields(store_uuid = %store, promotion_uuid = %uuid),
        err
    )]
    async fn get_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
    ) -> Result<PromotionSummary, PromotionsServiceError> {
        let document = self.documents.get(promotion_path(store, uuid)).await?;
        let record = PromotionRecord::try_from(document)?;

        let live = self.live_use(store, uuid).await;

        Ok(self.summarize(store, record, live).await)
    }

    #[tracing::instrument(
        name = "promotions.service.list_promotions",
        skip(self),
        fields(store_uuid = %store, promotion_count = tracing::field::Empty),
        err
    )]
    async fn list_promotions(
        &self,
        store: StoreUuid,
    ) -> Result<Vec<PromotionSummary>, PromotionsServiceError> {
        let records = self.load_all(store).await?;

        Span::current().record("promotion_count", records.len());

        let live = live_uses(
            &*self.usage,
            store,
            records
                .iter()
                .map(|record| DiscountReference::Promotion(record.uuid)),
        )
        .await;

        let mut summaries = Vec::with_capacity(records.len());

        for (record, live) in records.into_iter().zip(live) {
            summaries.push(self.summarize(store, record, live).await);
        }

        Ok(summaries)
    }

    #[tracing::instrument(
        name = "promotions.service.update_promotion",
        skip(self, update),
        fields(
            store_uuid = %store,
            promotion_uuid = %uuid,
            expected_version = ?update.expected_version
        ),
        err
    )]
    async fn update_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
        update: PromotionUpdate,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let path = promotion_path(store, uuid);
        let current = PromotionRecord::try_from(self.documents.get(path).await?)?;

        let expected_version = update.expected_version;
        let fields = update.changed_fields();
        let promotion = update.apply_to(&current.promotion);

        promotion.validate()?;

        let status = promotion.status_at(self.clock.now());

        let patch = field_patch(
            &PromotionDocument {
                promotion,
                status: Some(status),
            },
            &fields,
        )?;

        let document = self
            .documents
            .update(path, patch, expected_version)
            .await?;

        let record = PromotionRecord::try_from(document)?;

        info!(promotion_uuid = %record.uuid, version = record.version, "updated promotion");

        let status = record.promotion.status_at(self.clock.now());

        Ok(refresh_cached_status(&*self.documents, path, record, status).await)
    }

    #[tracing::instrument(
        name = "promotions.service.set_paused",
        skip(self),
        fields(store_uuid = %store, promotion_uuid = %uuid),
        err
    )]
    async fn set_paused(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
        paused: bool,
    ) -> Result<PromotionSummary, PromotionsServiceError> {
        let path = promotion_path(store, uuid);
        let current = PromotionRecord::try_from(self.documents.get(path).await?)?;

        let mut promotion = current.promotion;

        promotion.paused = paused;

        let status = promotion.status_at(self.clock.now());

        let document = self
            .documents
            .update(path, json!({ "paused": paused, "status": status }), None)
            .await?;

        let record = PromotionRecord::try_from(document)?;

        info!(promotion_uuid = %record.uuid, %status, "set promotion pause state");

        let live = self.live_use(store, uuid).await;

        Ok(self.summarize(store, record, live).await)
    }

    #[tracing::instrument(
        name = "promotions.service.delete_promotion",
        skip(self),
        fields(store_uuid = %store, promotion_uuid = %uuid),
        err
    )]
    async fn delete_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
    ) -> Result<(), PromotionsServiceError> {
        self.documents.delete(promotion_path(store, uuid)).await?;

        info!(promotion_uuid = %uuid, "deleted promotion");

        Ok(())
    }

    #[tracing::instrument(
        name = "promotions.service.price_product",
        skip(self),
        fields(
            store_uuid = %store,
            applicable_count = tracing::field::Empty,
            promotion_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn price_product(
        &self,
        store: StoreUuid,
        product_id: String,
        original_price: u64,
    ) -> Result<ProductPrice, PromotionsServiceError> {
        let records = self.load_all(store).await?;

        let applicable = applicable_promotions(&product_id, &records, self.clock.now());
        let quote = calculate_discounted_price(original_price, &applicable)?;

        let span = Span::current();

        span.record("applicable_count", applicable.len());

        if let Some(applied) = quote.applied {
            span.record("promotion_uuid", tracing::field::display(applied.uuid));
        }

        Ok(ProductPrice {
            product_id,
            original_price: quote.original_price,
            final_price: quote.final_price,
            discount: quote.discount,
            promotion: quote.applied.map(|record| record.uuid),
            show_badge: quote
                .applied
                .is_some_and(|record| record.promotion.show_badge),
        })
    }
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    async fn create_promotion(
        &self,
        store: StoreUuid,
        promotion: NewPromotion,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    async fn get_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
    ) -> Result<PromotionSummary, PromotionsServiceError>;

    /// List a store's promotions, highest priority first.
    async fn list_promotions(
        &self,
        store: StoreUuid,
    ) -> Result<Vec<PromotionSummary>, PromotionsServiceError>;

    async fn update_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
        update: PromotionUpdate,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Pause or resume a promotion. Resuming recomputes the status from the window.
    async fn set_paused(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
        paused: bool,
    ) -> Result<PromotionSummary, PromotionsServiceError>;

    async fn delete_promotion(
        &self,
        store: StoreUuid,
        uuid: PromotionUuid,
    ) -> Result<(), PromotionsServiceError>;

    /// Price a product with the highest-priority promotion that applies to it now.
    async fn price_product(
        &self,
        store: StoreUuid,
        product_id: String,
        original_price: u64,
    ) -> Result<ProductPrice, PromotionsServiceError>;
}

fn promotion_path(store: StoreUuid, uuid: PromotionUuid) -> DocumentPath {
    DocumentPath::new(store, Collection::Promotions, uuid.into_uuid())
}

fn encode(document: &PromotionDocument) -> Result<Value, DocumentStoreError> {
    serde_json::to_value(document).map_err(DocumentStoreError::Encode)
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, ToSpan};
    use rust_decimal::Decimal;
    use shopifree::{
        clock::FixedClock,
        discounts::PromotionDiscount,
        promotions::{Promotion, PromotionTarget},
        status::LifecycleStatus,
        usage::UsageCap,
        validation::ValidationError,
        window::DiscountWindow,
    };
    use testresult::TestResult;

    use crate::{
        documents::MemoryDocumentStore, domain::usage::MockUsageCounter,
        test::helpers::PausedAfterRead,
    };

    use super::*;

    fn now() -> Result<Timestamp, jiff::Error> {
        "2026-06-10T09:00:00Z".parse()
    }

    fn promotion(
        priority: i32,
        percent: u32,
        target: PromotionTarget,
    ) -> Result<Promotion, jiff::Error> {
        let start: Timestamp = "2026-06-01T00:00:00Z".parse()?;

        Ok(Promotion {
            name: format!("{percent}% off"),
            discount: PromotionDiscount::Percentage {
                value: Decimal::from(percent),
            },
            window: DiscountWindow::bounded(start, start.checked_add(480.hours())?),
            paused: false,
            usage_cap: UsageCap::unlimited(),
            total_uses: 0,
            target,
            priority,
            show_badge: true,
        })
    }

    fn service(documents: Arc<dyn DocumentStore>, at: Timestamp) -> DocumentPromotionsService {
        let mut usage = MockUsageCounter::new();

        usage.expect_count_uses().returning(|_, _| Ok(0));

        DocumentPromotionsService::new(documents, Arc::new(usage), Arc::new(FixedClock::new(at)))
    }

    async fn create(
        service: &DocumentPromotionsService,
        store: StoreUuid,
        promotion: Promotion,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        service
            .create_promotion(
                store,
                NewPromotion {
                    uuid: PromotionUuid::new(),
                    promotion,
                },
            )
            .await
    }

    #[tokio::test]
    async fn price_uses_highest_priority_promotion_only() -> TestResult {
        let service = service(Arc::new(MemoryDocumentStore::new()), now()?);
        let store = StoreUuid::new();

        create(&service, store, promotion(1, 10, PromotionTarget::AllProducts)?).await?;
        let winner =
            create(&service, store, promotion(5, 20, PromotionTarget::AllProducts)?).await?;

        let price = service
            .price_product(store, "sku-1".to_string(), 10_000)
            .await?;

        assert_eq!(price.final_price, 8000);
        assert_eq!(price.discount, 2000);
        assert_eq!(price.promotion, Some(winner.uuid));
        assert!(price.show_badge);

        Ok(())
    }

    #[tokio::test]
    async fn price_ignores_paused_and_untargeted_promotions() -> TestResult {
        let documents = Arc::new(MemoryDocumentStore::new());
        let service = service(documents, now()?);
        let store = StoreUuid::new();

        let paused =
            create(&service, store, promotion(9, 50, PromotionTarget::AllProducts)?).await?;

        service.set_paused(store, paused.uuid, true).await?;

        create(
            &service,
            store,
            promotion(3, 30, PromotionTarget::products(["sku-2"]))?,
        )
        .await?;

        create(
            &service,
            store,
            promotion(
                7,
                40,
                PromotionTarget::Categories {
                    ids: ["shoes".to_string()].into_iter().collect(),
                },
            )?,
        )
        .await?;

        let untouched = service
            .price_product(store, "sku-1".to_string(), 5000)
            .await?;

        assert_eq!(untouched.final_price, 5000);
        assert_eq!(untouched.promotion, None);
        assert!(!untouched.show_badge);

        let targeted = service
            .price_product(store, "sku-2".to_string(), 5000)
            .await?;

        assert_eq!(targeted.final_price, 3500);

        Ok(())
    }

    #[tokio::test]
    async fn price_outside_window_is_unchanged() -> TestResult {
        let documents = Arc::new(MemoryDocumentStore::new());
        let store = StoreUuid::new();

        create(
            &service(documents.clone(), now()?),
            store,
            promotion(1, 25, PromotionTarget::AllProducts)?,
        )
        .await?;

        let later = service(documents, now()?.checked_add(1000.hours())?);

        let price = later.price_product(store, "sku-1".to_string(), 10_000).await?;

        assert_eq!(price.final_price, 10_000);

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_by_priority_and_heals_status() -> TestResult {
        let documents = Arc::new(MemoryDocumentStore::new());
        let store = StoreUuid::new();
        let early = service(documents.clone(), "2026-05-01T00:00:00Z".parse()?);

        create(&early, store, promotion(1, 10, PromotionTarget::AllProducts)?).await?;
        create(&early, store, promotion(4, 15, PromotionTarget::AllProducts)?).await?;

        let summaries = service(documents, now()?).list_promotions(store).await?;

        let priorities: Vec<i32> = summaries
            .iter()
            .map(|summary| summary.record.promotion.priority)
            .collect();

        assert_eq!(priorities, vec![4, 1]);

        for summary in &summaries {
            assert_eq!(summary.state.status, LifecycleStatus::Active);
            assert_eq!(summary.record.cached_status, Some(LifecycleStatus::Active));
        }

        Ok(())
    }

    #[tokio::test]
    async fn update_rejects_zero_buy_quantity() -> TestResult {
        let service = service(Arc::new(MemoryDocumentStore::new()), now()?);
        let store = StoreUuid::new();

        let record =
            create(&service, store, promotion(1, 10, PromotionTarget::AllProducts)?).await?;

        let result = service
            .update_promotion(
                store,
                record.uuid,
                PromotionUpdate {
                    discount: Some(PromotionDiscount::BuyXGetY { buy: 0, get: 1 }),
                    ..PromotionUpdate::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(PromotionsServiceError::Invalid(ValidationError::ZeroQuantity))
        ));

        let unchanged = service.get_promotion(store, record.uuid).await?;

        assert_eq!(unchanged.record.promotion, record.promotion);

        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_a_pause_written_after_the_read() -> TestResult {
        let documents = Arc::new(PausedAfterRead::default());
        let service = service(documents.clone(), now()?);
        let store = StoreUuid::new();

        let record =
            create(&service, store, promotion(1, 10, PromotionTarget::AllProducts)?).await?;

        let updated = service
            .update_promotion(
                store,
                record.uuid,
                PromotionUpdate {
                    priority: Some(7),
                    ..PromotionUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.promotion.priority, 7);
        assert!(updated.promotion.paused);
        assert_eq!(updated.cached_status, Some(LifecycleStatus::Paused));

        let stored = documents
            .inner
            .get(promotion_path(store, record.uuid))
            .await?;

        assert_eq!(stored.body["paused"], true);
        assert_eq!(stored.body["status"], "paused");
        assert_eq!(stored.body["name"], "10% off");

        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_surface_as_storage_errors() -> TestResult {
        let mut documents = crate::documents::MockDocumentStore::new();

        documents
            .expect_list()
            .returning(|_, _, _| Err(DocumentStoreError::InvalidPatch));

        let service = DocumentPromotionsService::new(
            Arc::new(documents),
            Arc::new(MockUsageCounter::new()),
            Arc::new(FixedClock::new(now()?)),
        );

        let result = service
            .price_product(StoreUuid::new(), "sku-1".to_string(), 100)
            .await;

        assert!(matches!(
            result,
            Err(PromotionsServiceError::Storage(DocumentStoreError::InvalidPatch))
        ));

        Ok(())
    }
}
