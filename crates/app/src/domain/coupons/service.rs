//! Coupons Service

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::{Value, json};
use shopifree::{
    clock::Clock,
    coupons::{check_redeemable, generate_coupon_code, normalize_code},
    status::DiscountRecord,
};
use tracing::{Span, info};

use crate::{
    documents::{
        Collection, DocumentPath, DocumentQuery, DocumentStore, DocumentStoreError, Filter,
        OrderBy,
    },
    domain::{
        coupons::{
            CouponsServiceError,
            data::{
                CouponCheckout, CouponQuery, CouponRedemption, CouponSummary, CouponUpdate,
                NewCoupon,
            },
            records::{CouponDocument, CouponRecord, CouponUuid},
        },
        persistence::{field_patch, refresh_cached_status},
        stores::records::StoreUuid,
        usage::{DiscountReference, UsageCounter, live_uses},
    },
};

/// Codes tried by [`CouponsService::generate_unique_code`] before giving up.
pub const CODE_GENERATION_ATTEMPTS: usize = 8;

const CODE_FIELD: &str = "code";
const RECOVERY_FIELD: &str = "is_recovery_coupon";

#[derive(Clone)]
pub struct DocumentCouponsService {
    documents: Arc<dyn DocumentStore>,
    usage: Arc<dyn UsageCounter>,
    clock: Arc<dyn Clock>,
}

impl DocumentCouponsService {
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

    async fn find_by_code(
        &self,
        store: StoreUuid,
        code: &str,
    ) -> Result<Option<CouponRecord>, CouponsServiceError> {
        let query = DocumentQuery::new().filter(Filter::equals(CODE_FIELD, code));

        let documents = self.documents.list(store, Collection::Coupons, query).await?;

        Ok(documents
            .into_iter()
            .next()
            .map(CouponRecord::try_from)
            .transpose()?)
    }

    /// Fail with `DuplicateCode` when another coupon in the store already uses `code`.
    async fn ensure_code_available(
        &self,
        store: StoreUuid,
        code: &str,
        owner: Option<CouponUuid>,
    ) -> Result<(), CouponsServiceError> {
        match self.find_by_code(store, code).await? {
            Some(existing) if Some(existing.uuid) != owner => {
                Err(CouponsServiceError::DuplicateCode(code.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn summarize(
        &self,
        store: StoreUuid,
        record: CouponRecord,
        live: Option<u64>,
    ) -> CouponSummary {
        let state = record.coupon.state_at(self.clock.now(), live);
        let path = coupon_path(store, record.uuid);
        let record = refresh_cached_status(&*self.documents, path, record, state.status).await;

        CouponSummary {
            record,
            state,
            live_usage: live.is_some(),
        }
    }
}

#[async_trait]
impl CouponsService for DocumentCouponsService {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(
            store_uuid = %store,
            coupon_uuid = %coupon.uuid,
            status = tracing::field::Empty
        ),
        err
    )]
    async fn create_coupon(
        &self,
        store: StoreUuid,
        coupon: NewCoupon,
    ) -> Result<CouponRecord, CouponsServiceError> {
        let NewCoupon { uuid, coupon } = coupon;

        let coupon = coupon.validated()?;

        self.ensure_code_available(store, &coupon.code, None).await?;

        let status = coupon.status_at(self.clock.now());

        Span::current().record("status", tracing::field::display(status));

        let body = encode(&CouponDocument {
            coupon,
            status: Some(status),
        })?;

        let document = self
            .documents
            .create(coupon_path(store, uuid), body)
            .await?;

        let record = CouponRecord::try_from(document)?;

        info!(coupon_uuid = %record.uuid, code = %record.coupon.code, "created coupon");

        Ok(record)
    }

    #[tracing::instrument(
        name = "coupons.service.get_coupon",
        skip(self),
        fields(store_uuid = %store, coupon_uuid = %uuid),
        err
    )]
    async fn get_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
    ) -> Result<CouponSummary, CouponsServiceError> {
        let document = self.documents.get(coupon_path(store, uuid)).await?;
        let record = CouponRecord::try_from(document)?;

        let live = live_uses(&*self.usage, store, [DiscountReference::Coupon(uuid)])
            .await
            .into_iter()
            .next()
            .flatten();

        Ok(self.summarize(store, record, live).await)
    }

    #[tracing::instrument(
        name = "coupons.service.list_coupons",
        skip(self),
        fields(store_uuid = %store, coupon_count = tracing::field::Empty),
        err
    )]
    async fn list_coupons(
        &self,
        store: StoreUuid,
        query: CouponQuery,
    ) -> Result<Vec<CouponSummary>, CouponsServiceError> {
        let mut documents_query = DocumentQuery::new().order_by(OrderBy::newest_first());

        if let Some(recovery) = query.recovery {
            documents_query = documents_query.filter(Filter::equals(RECOVERY_FIELD, recovery));
        }

        let records = self
            .documents
            .list(store, Collection::Coupons, documents_query)
            .await?
            .into_iter()
            .map(CouponRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Span::current().record("coupon_count", records.len());

        let live = live_uses(
            &*self.usage,
            store,
            records
                .iter()
                .map(|record| DiscountReference::Coupon(record.uuid)),
        )
        .await;

        let mut summaries = Vec::with_capacity(records.len());

        for (record, live) in records.into_iter().zip(live) {
            summaries.push(self.summarize(store, record, live).await);
        }

        Ok(summaries)
    }

    #[tracing::instrument(
        name = "coupons.service.update_coupon",
        skip(self, update),
        fields(
            store_uuid = %store,
            coupon_uuid = %uuid,
            expected_version = ?update.expected_version
        ),
        err
    )]
    async fn update_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError> {
        let path = coupon_path(store, uuid);
        let current = CouponRecord::try_from(self.documents.get(path).await?)?;

        let expected_version = update.expected_version;
        let fields = update.changed_fields();
        let coupon = update.apply_to(&current.coupon).validated()?;

        if coupon.code != current.coupon.code {
            self.ensure_code_available(store, &coupon.code, Some(uuid))
                .await?;
        }

        let status = coupon.status_at(self.clock.now());

        let patch = field_patch(
            &CouponDocument {
                coupon,
                status: Some(status),
            },
            &fields,
        )?;

        let document = self
            .documents
            .update(path, patch, expected_version)
            .await?;

        let record = CouponRecord::try_from(document)?;

        info!(coupon_uuid = %record.uuid, version = record.version, "updated coupon");

        // Untouched fields may have changed since the read, so resolve against what was stored.
        let status = record.coupon.status_at(self.clock.now());

        Ok(refresh_cached_status(&*self.documents, path, record, status).await)
    }

    #[tracing::instrument(
        name = "coupons.service.set_paused",
        skip(self),
        fields(store_uuid = %store, coupon_uuid = %uuid),
        err
    )]
    async fn set_paused(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
        paused: bool,
    ) -> Result<CouponSummary, CouponsServiceError> {
        let path = coupon_path(store, uuid);
        let current = CouponRecord::try_from(self.documents.get(path).await?)?;

        let mut coupon = current.coupon;

        coupon.paused = paused;

        // Resuming recomputes from the window rather than assuming the coupon is active again.
        let status = coupon.status_at(self.clock.now());

        let document = self
            .documents
            .update(path, json!({ "paused": paused, "status": status }), None)
            .await?;

        let record = CouponRecord::try_from(document)?;

        info!(coupon_uuid = %record.uuid, %status, "set coupon pause state");

        let live = live_uses(&*self.usage, store, [DiscountReference::Coupon(uuid)])
            .await
            .into_iter()
            .next()
            .flatten();

        Ok(self.summarize(store, record, live).await)
    }

    #[tracing::instrument(
        name = "coupons.service.delete_coupon",
        skip(self),
        fields(store_uuid = %store, coupon_uuid = %uuid),
        err
    )]
    async fn delete_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
    ) -> Result<(), CouponsServiceError> {
        self.documents.delete(coupon_path(store, uuid)).await?;

        info!(coupon_uuid = %uuid, "deleted coupon");

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.coupon_code_exists",
        skip(self),
        fields(store_uuid = %store),
        err
    )]
    async fn coupon_code_exists(
        &self,
        store: StoreUuid,
        code: String,
    ) -> Result<bool, CouponsServiceError> {
        let code = normalize_code(&code)?;

        Ok(self.find_by_code(store, &code).await?.is_some())
    }

    #[tracing::instrument(
        name = "coupons.service.generate_unique_code",
        skip(self),
        fields(store_uuid = %store, attempts = tracing::field::Empty),
        err
    )]
    async fn generate_unique_code(
        &self,
        store: StoreUuid,
        base_name: String,
    ) -> Result<String, CouponsServiceError> {
        for attempt in 1..=CODE_GENERATION_ATTEMPTS {
            let code = generate_coupon_code(&base_name);

            if self.find_by_code(store, &code).await?.is_none() {
                Span::current().record("attempts", attempt);

                return Ok(code);
            }
        }

        Err(CouponsServiceError::CodeGenerationExhausted)
    }

    #[tracing::instrument(
        name = "coupons.service.quote_coupon",
        skip(self, checkout),
        fields(
            store_uuid = %store,
            coupon_uuid = tracing::field::Empty,
            subtotal = checkout.subtotal,
            shipping = checkout.shipping
        ),
        err
    )]
    async fn quote_coupon(
        &self,
        store: StoreUuid,
        checkout: CouponCheckout,
    ) -> Result<CouponRedemption, CouponsServiceError> {
        let code = normalize_code(&checkout.code)?;

        let record = self
            .find_by_code(store, &code)
            .await?
            .ok_or(CouponsServiceError::NotFound)?;

        Span::current().record("coupon_uuid", tracing::field::display(record.uuid));

        let reference = DiscountReference::Coupon(record.uuid);

        // Unlike reads, a redemption check never falls back to the cached counter.
        let uses = self.usage.count_uses(store, reference).await?;

        let customer_uses = match checkout.customer {
            Some(customer) => Some(
                self.usage
                    .count_customer_uses(store, reference, customer)
                    .await?,
            ),
            None => None,
        };

        let state = record.coupon.state_at(self.clock.now(), Some(uses));

        check_redeemable(&state, &record.coupon.usage_cap, customer_uses)?;

        let quote = record.coupon.quote(checkout.subtotal, checkout.shipping)?;

        Ok(CouponRedemption {
            coupon: record.uuid,
            state,
            quote,
        })
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Validate and store a new coupon. The code is normalized and must be unused in the store.
    async fn create_coupon(
        &self,
        store: StoreUuid,
        coupon: NewCoupon,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Fetch a coupon with its status recomputed and live usage applied.
    async fn get_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
    ) -> Result<CouponSummary, CouponsServiceError>;

    /// List a store's coupons, newest first.
    async fn list_coupons(
        &self,
        store: StoreUuid,
        query: CouponQuery,
    ) -> Result<Vec<CouponSummary>, CouponsServiceError>;

    async fn update_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Pause or resume a coupon.
    async fn set_paused(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
        paused: bool,
    ) -> Result<CouponSummary, CouponsServiceError>;

    async fn delete_coupon(
        &self,
        store: StoreUuid,
        uuid: CouponUuid,
    ) -> Result<(), CouponsServiceError>;

    /// Case-insensitive check for a coupon code in the store.
    async fn coupon_code_exists(
        &self,
        store: StoreUuid,
        code: String,
    ) -> Result<bool, CouponsServiceError>;

    /// Generate a code from `base_name` that no coupon in the store uses yet.
    async fn generate_unique_code(
        &self,
        store: StoreUuid,
        base_name: String,
    ) -> Result<String, CouponsServiceError>;

    /// Price a coupon code against an order without recording a redemption.
    async fn quote_coupon(
        &self,
        store: StoreUuid,
        checkout: CouponCheckout,
    ) -> Result<CouponRedemption, CouponsServiceError>;
}

fn coupon_path(store: StoreUuid, uuid: CouponUuid) -> DocumentPath {
    DocumentPath::new(store, Collection::Coupons, uuid.into_uuid())
}

fn encode(document: &CouponDocument) -> Result<Value, DocumentStoreError> {
    serde_json::to_value(document).map_err(DocumentStoreError::Encode)
}
