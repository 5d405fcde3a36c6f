//! Coupon Records

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use shopifree::{coupons::Coupon, status::LifecycleStatus};

use crate::{
    documents::{Document, DocumentStoreError},
    domain::persistence::CachedStatus,
    uuids::TypedUuid,
};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Coupon Record
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub coupon: Coupon,

    /// Status last written alongside the coupon. Only a cache for filtering; the status shown
    /// to merchants is recomputed on every read.
    pub cached_status: Option<LifecycleStatus>,

    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Stored body of a coupon document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CouponDocument {
    #[serde(flatten)]
    pub coupon: Coupon,

    #[serde(default)]
    pub status: Option<LifecycleStatus>,
}

impl TryFrom<Document> for CouponRecord {
    type Error = DocumentStoreError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let CouponDocument { coupon, status } = document.decode()?;

        Ok(Self {
            uuid: CouponUuid::from_uuid(document.uuid),
            coupon,
            cached_status: status,
            version: document.version,
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }
}

impl CachedStatus for CouponRecord {
    fn cached_status(&self) -> Option<LifecycleStatus> {
        self.cached_status
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn refreshed(&mut self, status: LifecycleStatus, document: &Document) {
        self.cached_status = Some(status);
        self.version = document.version;
        self.updated_at = document.updated_at;
    }
}
