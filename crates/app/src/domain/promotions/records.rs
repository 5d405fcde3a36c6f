//! Promotions Records

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use shopifree::{promotions::Promotion, status::LifecycleStatus};

use crate::{
    documents::{Document, DocumentStoreError},
    domain::persistence::CachedStatus,
    uuids::TypedUuid,
};

/// Promotion UUID
pub type PromotionUuid = TypedUuid<PromotionRecord>;

/// Promotion Record
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRecord {
    pub uuid: PromotionUuid,
    pub promotion: Promotion,
    pub cached_status: Option<LifecycleStatus>,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AsRef<Promotion> for PromotionRecord {
    fn as_ref(&self) -> &Promotion {
        &self.promotion
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PromotionDocument {
    #[serde(flatten)]
    pub promotion: Promotion,

    #[serde(default)]
    pub status: Option<LifecycleStatus>,
}

impl TryFrom<Document> for PromotionRecord {
    type Error = DocumentStoreError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let PromotionDocument { promotion, status } = document.decode()?;

        Ok(Self {
            uuid: PromotionUuid::from_uuid(document.uuid),
            promotion,
            cached_status: status,
            version: document.version,
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }
}

impl CachedStatus for PromotionRecord {
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
