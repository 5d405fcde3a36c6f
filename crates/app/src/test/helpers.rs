//! Test Helpers

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    documents::{
        Collection, Document, DocumentPath, DocumentQuery, DocumentStore, DocumentStoreError,
        Filter, MemoryDocumentStore,
    },
    domain::stores::records::StoreUuid,
};

/// Sets `paused` on a document right after each `get` hands it out, the way a second dashboard
/// session pausing a discount between another session's read and write would.
#[derive(Debug, Default)]
pub(crate) struct PausedAfterRead {
    pub inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for PausedAfterRead {
    async fn create(
        &self,
        path: DocumentPath,
        body: Value,
    ) -> Result<Document, DocumentStoreError> {
        self.inner.create(path, body).await
    }

    async fn get(&self, path: DocumentPath) -> Result<Document, DocumentStoreError> {
        let document = self.inner.get(path).await?;

        self.inner
            .update(path, json!({ "paused": true }), None)
            .await?;

        Ok(document)
    }

    async fn update(
        &self,
        path: DocumentPath,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        self.inner.update(path, patch, expected_version).await
    }

    async fn delete(&self, path: DocumentPath) -> Result<(), DocumentStoreError> {
        self.inner.delete(path).await
    }

    async fn list(
        &self,
        store: StoreUuid,
        collection: Collection,
        query: DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.inner.list(store, collection, query).await
    }

    async fn count(
        &self,
        store: StoreUuid,
        collection: Collection,
        filters: Vec<Filter>,
    ) -> Result<u64, DocumentStoreError> {
        self.inner.count(store, collection, filters).await
    }
}
