//! Document Store
//!
//! Coupons, promotions and orders are stored as JSON documents scoped to a store under
//! `stores/{store}/{collection}/{uuid}`. Writes touch a single document; there are no
//! multi-document transactions. Every document carries a monotonic `version`: updates that
//! pass an expected version fail with [`DocumentStoreError::Conflict`] instead of clobbering
//! a concurrent edit, while updates without one keep last-write-wins semantics.

use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::stores::records::StoreUuid;

mod errors;
mod memory;
mod postgres;
pub mod query;

pub use errors::DocumentStoreError;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use query::{Direction, DocumentQuery, Filter, OrderBy, OrderKey};

/// Document collections kept per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Coupons,
    Promotions,
    Orders,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coupons => "coupons",
            Self::Promotions => "promotions",
            Self::Orders => "orders",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Address of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub store: StoreUuid,
    pub collection: Collection,
    pub uuid: Uuid,
}

impl DocumentPath {
    #[must_use]
    pub const fn new(store: StoreUuid, collection: Collection, uuid: Uuid) -> Self {
        Self {
            store,
            collection,
            uuid,
        }
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "stores/{}/{}/{}", self.store, self.collection, self.uuid)
    }
}

/// A stored document with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub uuid: Uuid,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub body: Value,
}

impl Document {
    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Decode`] when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DocumentStoreError> {
        serde_json::from_value(self.body.clone()).map_err(DocumentStoreError::Decode)
    }
}

#[automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document. Fails with `AlreadyExists` if the UUID is taken.
    async fn create(
        &self,
        path: DocumentPath,
        body: Value,
    ) -> Result<Document, DocumentStoreError>;

    /// Fetch a single document.
    async fn get(&self, path: DocumentPath) -> Result<Document, DocumentStoreError>;

    /// Shallow-merge `patch` (a JSON object) into a document and bump its version.
    async fn update(
        &self,
        path: DocumentPath,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, DocumentStoreError>;

    /// Hard-delete a document.
    async fn delete(&self, path: DocumentPath) -> Result<(), DocumentStoreError>;

    /// List a collection's documents matching every filter.
    async fn list(
        &self,
        store: StoreUuid,
        collection: Collection,
        query: DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError>;

    /// Count a collection's documents matching every filter.
    async fn count(
        &self,
        store: StoreUuid,
        collection: Collection,
        filters: Vec<Filter>,
    ) -> Result<u64, DocumentStoreError>;
}
