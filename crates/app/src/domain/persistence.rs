//! Discount Persistence
//!
//! Helpers shared by the coupon and promotion services for writing discount documents.

use serde::Serialize;
use serde_json::{Map, Value, json};
use shopifree::status::LifecycleStatus;
use tracing::warn;

use crate::documents::{Document, DocumentPath, DocumentStore, DocumentStoreError};

/// Body field holding the cached lifecycle status.
pub(crate) const STATUS_FIELD: &str = "status";

/// A stored discount that keeps its last computed status next to the document.
pub(crate) trait CachedStatus {
    fn cached_status(&self) -> Option<LifecycleStatus>;

    fn version(&self) -> u64;

    /// Adopt `status` along with the version and timestamps of the rewritten document.
    fn refreshed(&mut self, status: LifecycleStatus, document: &Document);
}

/// Write `status` back to the document at `path` when the cached one differs.
///
/// The write is conditional on the record's version, so a concurrent edit wins. Failures only
/// warn: the status is recomputed on every read anyway.
pub(crate) async fn refresh_cached_status<R>(
    documents: &dyn DocumentStore,
    path: DocumentPath,
    mut record: R,
    status: LifecycleStatus,
) -> R
where
    R: CachedStatus + Send,
{
    if record.cached_status() == Some(status) {
        return record;
    }

    match documents
        .update(path, json!({ STATUS_FIELD: status }), Some(record.version()))
        .await
    {
        Ok(document) => record.refreshed(status, &document),
        Err(error) => {
            warn!(%error, path = %path, %status, "failed to refresh cached status");
        }
    }

    record
}

/// Encode only `fields` of `document` plus the cached status, for a shallow-merge update.
///
/// Fields the caller did not change stay out of the patch so a concurrent write to them, such
/// as a pause or a usage refresh, is not overwritten with the value read earlier.
pub(crate) fn field_patch<T: Serialize>(
    document: &T,
    fields: &[&str],
) -> Result<Value, DocumentStoreError> {
    let Value::Object(mut body) =
        serde_json::to_value(document).map_err(DocumentStoreError::Encode)?
    else {
        return Err(DocumentStoreError::InvalidPatch);
    };

    let patch: Map<String, Value> = fields
        .iter()
        .chain([&STATUS_FIELD])
        .filter_map(|field| body.remove_entry(*field))
        .collect();

    Ok(Value::Object(patch))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        documents::{Collection, MemoryDocumentStore, MockDocumentStore},
        domain::stores::records::StoreUuid,
    };

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Cached {
        status: Option<LifecycleStatus>,
        version: u64,
    }

    impl CachedStatus for Cached {
        fn cached_status(&self) -> Option<LifecycleStatus> {
            self.status
        }

        fn version(&self) -> u64 {
            self.version
        }

        fn refreshed(&mut self, status: LifecycleStatus, document: &Document) {
            self.status = Some(status);
            self.version = document.version;
        }
    }

    fn path() -> DocumentPath {
        DocumentPath::new(StoreUuid::new(), Collection::Promotions, Uuid::now_v7())
    }

    #[tokio::test]
    async fn stale_status_is_written_back() -> TestResult {
        let documents = Arc::new(MemoryDocumentStore::new());
        let path = path();

        documents
            .create(path, json!({ "name": "Spring", "status": "scheduled" }))
            .await?;

        let record = Cached {
            status: Some(LifecycleStatus::Scheduled),
            version: 1,
        };

        let record =
            refresh_cached_status(&*documents, path, record, LifecycleStatus::Active).await;

        assert_eq!(record.status, Some(LifecycleStatus::Active));
        assert_eq!(record.version, 2);
        assert_eq!(documents.get(path).await?.body["status"], "active");

        Ok(())
    }

    #[tokio::test]
    async fn matching_status_skips_the_write() {
        let mut documents = MockDocumentStore::new();

        documents.expect_update().never();

        let record = Cached {
            status: Some(LifecycleStatus::Active),
            version: 3,
        };

        let refreshed =
            refresh_cached_status(&documents, path(), record.clone(), LifecycleStatus::Active)
                .await;

        assert_eq!(refreshed, record);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_record() {
        let mut documents = MockDocumentStore::new();

        documents
            .expect_update()
            .withf(|_, _, expected| *expected == Some(4))
            .returning(|_, _, _| {
                Err(DocumentStoreError::Conflict {
                    expected: 4,
                    actual: 5,
                })
            });

        let record = Cached {
            status: None,
            version: 4,
        };

        let refreshed =
            refresh_cached_status(&documents, path(), record.clone(), LifecycleStatus::Expired)
                .await;

        assert_eq!(refreshed, record);
    }

    #[test]
    fn field_patch_keeps_only_named_fields_and_status() -> TestResult {
        let body = json!({
            "name": "Renamed",
            "paused": false,
            "total_uses": 4,
            "status": "active",
        });

        let patch = field_patch(&body, &["name"])?;

        assert_eq!(patch, json!({ "name": "Renamed", "status": "active" }));

        Ok(())
    }

    #[test]
    fn field_patch_rejects_non_objects() {
        assert!(matches!(
            field_patch(&json!(["name"]), &["name"]),
            Err(DocumentStoreError::InvalidPatch)
        ));
    }
}
