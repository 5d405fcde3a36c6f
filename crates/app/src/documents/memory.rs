//! In-memory Document Store

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    documents::{
        Collection, Document, DocumentPath, DocumentQuery, DocumentStore, DocumentStoreError,
        Filter,
    },
    domain::stores::records::StoreUuid,
};

type CollectionKey = (StoreUuid, Collection);

/// Documents held in process memory, in insertion order per collection.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<FxHashMap<CollectionKey, Vec<Document>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(
        &self,
        path: DocumentPath,
        body: Value,
    ) -> Result<Document, DocumentStoreError> {
        if !body.is_object() {
            return Err(DocumentStoreError::InvalidPatch);
        }

        let mut collections = self.collections.write().await;
        let documents = collections
            .entry((path.store, path.collection))
            .or_default();

        if documents.iter().any(|document| document.uuid == path.uuid) {
            return Err(DocumentStoreError::AlreadyExists);
        }

        let now = Timestamp::now();

        let document = Document {
            uuid: path.uuid,
            version: 1,
            created_at: now,
            updated_at: now,
            body,
        };

        documents.push(document.clone());

        Ok(document)
    }

    async fn get(&self, path: DocumentPath) -> Result<Document, DocumentStoreError> {
        self.collections
            .read()
            .await
            .get(&(path.store, path.collection))
            .and_then(|documents| documents.iter().find(|document| document.uuid == path.uuid))
            .cloned()
            .ok_or(DocumentStoreError::NotFound)
    }

    async fn update(
        &self,
        path: DocumentPath,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        let Value::Object(patch) = patch else {
            return Err(DocumentStoreError::InvalidPatch);
        };

        let mut collections = self.collections.write().await;

        let document = collections
            .get_mut(&(path.store, path.collection))
            .and_then(|documents| {
                documents
                    .iter_mut()
                    .find(|document| document.uuid == path.uuid)
            })
            .ok_or(DocumentStoreError::NotFound)?;

        if let Some(expected) = expected_version
            && expected != document.version
        {
            return Err(DocumentStoreError::Conflict {
                expected,
                actual: document.version,
            });
        }

        let Value::Object(body) = &mut document.body else {
            return Err(DocumentStoreError::InvalidPatch);
        };

        body.extend(patch);

        document.version += 1;
        document.updated_at = Timestamp::now();

        Ok(document.clone())
    }

    async fn delete(&self, path: DocumentPath) -> Result<(), DocumentStoreError> {
        let mut collections = self.collections.write().await;

        let documents = collections
            .get_mut(&(path.store, path.collection))
            .ok_or(DocumentStoreError::NotFound)?;

        let before = documents.len();

        documents.retain(|document| document.uuid != path.uuid);

        if documents.len() == before {
            return Err(DocumentStoreError::NotFound);
        }

        Ok(())
    }

    async fn list(
        &self,
        store: StoreUuid,
        collection: Collection,
        query: DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let collections = self.collections.read().await;

        let mut documents: Vec<Document> = collections
            .get(&(store, collection))
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| query.matches(&document.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order_by) = &query.order_by {
            documents.sort_by(|a, b| order_by.compare(a, b));
        }

        Ok(documents)
    }

    async fn count(
        &self,
        store: StoreUuid,
        collection: Collection,
        filters: Vec<Filter>,
    ) -> Result<u64, DocumentStoreError> {
        let collections = self.collections.read().await;

        let count = collections
            .get(&(store, collection))
            .map_or(0, |documents| {
                documents
                    .iter()
                    .filter(|document| filters.iter().all(|filter| filter.matches(&document.body)))
                    .count()
            });

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
