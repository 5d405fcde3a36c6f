//! PostgreSQL Document Store

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{
    FromRow, Postgres, QueryBuilder, Row, postgres::PgRow, query, query_as, query_scalar,
    types::Json,
};

use crate::{
    database::Db,
    documents::{
        Collection, Document, DocumentPath, DocumentQuery, DocumentStore, DocumentStoreError,
        Filter, OrderKey,
    },
    domain::stores::records::StoreUuid,
};

const CREATE_DOCUMENT_SQL: &str = include_str!("sql/create_document.sql");
const GET_DOCUMENT_SQL: &str = include_str!("sql/get_document.sql");
const GET_DOCUMENT_VERSION_SQL: &str = include_str!("sql/get_document_version.sql");
const UPDATE_DOCUMENT_SQL: &str = include_str!("sql/update_document.sql");
const DELETE_DOCUMENT_SQL: &str = include_str!("sql/delete_document.sql");

const LIST_DOCUMENTS_PREFIX: &str =
    "SELECT uuid, version, created_at, updated_at, body FROM documents WHERE store_uuid = ";
const COUNT_DOCUMENTS_PREFIX: &str = "SELECT COUNT(*) FROM documents WHERE store_uuid = ";

const COLUMN_VERSION: &str = "version";

/// Documents stored as JSONB rows, isolated per store by row-level security.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    db: Db,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[tracing::instrument(
        name = "documents.pg.create",
        skip(self, body),
        fields(path = %path),
        err
    )]
    async fn create(
        &self,
        path: DocumentPath,
        body: Value,
    ) -> Result<Document, DocumentStoreError> {
        if !body.is_object() {
            return Err(DocumentStoreError::InvalidPatch);
        }

        let mut tx = self.db.begin_store_transaction(path.store).await?;

        let document = query_as::<Postgres, Document>(CREATE_DOCUMENT_SQL)
            .bind(path.store.into_uuid())
            .bind(path.collection.as_str())
            .bind(path.uuid)
            .bind(Json(body))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(document)
    }

    #[tracing::instrument(name = "documents.pg.get", skip(self), fields(path = %path), err)]
    async fn get(&self, path: DocumentPath) -> Result<Document, DocumentStoreError> {
        let mut tx = self.db.begin_store_transaction(path.store).await?;

        let document = query_as::<Postgres, Document>(GET_DOCUMENT_SQL)
            .bind(path.store.into_uuid())
            .bind(path.collection.as_str())
            .bind(path.uuid)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(document)
    }

    #[tracing::instrument(
        name = "documents.pg.update",
        skip(self, patch),
        fields(path = %path, expected_version = ?expected_version),
        err
    )]
    async fn update(
        &self,
        path: DocumentPath,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Document, DocumentStoreError> {
        if !patch.is_object() {
            return Err(DocumentStoreError::InvalidPatch);
        }

        let expected = expected_version
            .map(|version| try_i64_from_u64(version, COLUMN_VERSION))
            .transpose()?;

        let mut tx = self.db.begin_store_transaction(path.store).await?;

        let updated = query_as::<Postgres, Document>(UPDATE_DOCUMENT_SQL)
            .bind(path.store.into_uuid())
            .bind(path.collection.as_str())
            .bind(path.uuid)
            .bind(Json(patch))
            .bind(expected)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(document) = updated else {
            let actual: Option<i64> = query_scalar(GET_DOCUMENT_VERSION_SQL)
                .bind(path.store.into_uuid())
                .bind(path.collection.as_str())
                .bind(path.uuid)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match (actual, expected_version) {
                (Some(actual), Some(expected)) => DocumentStoreError::Conflict {
                    expected,
                    actual: try_u64_from_i64(actual, COLUMN_VERSION)?,
                },
                _ => DocumentStoreError::NotFound,
            });
        };

        tx.commit().await?;

        Ok(document)
    }

    #[tracing::instrument(name = "documents.pg.delete", skip(self), fields(path = %path), err)]
    async fn delete(&self, path: DocumentPath) -> Result<(), DocumentStoreError> {
        let mut tx = self.db.begin_store_transaction(path.store).await?;

        let rows_affected = query(DELETE_DOCUMENT_SQL)
            .bind(path.store.into_uuid())
            .bind(path.collection.as_str())
            .bind(path.uuid)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(DocumentStoreError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "documents.pg.list",
        skip(self, query),
        fields(store_uuid = %store, collection = %collection, filter_count = query.filters.len()),
        err
    )]
    async fn list(
        &self,
        store: StoreUuid,
        collection: Collection,
        query: DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(LIST_DOCUMENTS_PREFIX);

        push_scope(&mut builder, store, collection, &query.filters);

        if let Some(order_by) = &query.order_by {
            builder.push(" ORDER BY ");

            match &order_by.key {
                OrderKey::CreatedAt => {
                    builder.push("created_at");
                }
                OrderKey::UpdatedAt => {
                    builder.push("updated_at");
                }
                OrderKey::Field(field) => {
                    builder.push("body -> ");
                    builder.push_bind(field.clone());
                }
            }

            builder.push(" ");
            builder.push(order_by.direction.as_sql());
            builder.push(", uuid");
        } else {
            builder.push(" ORDER BY uuid");
        }

        let mut tx = self.db.begin_store_transaction(store).await?;

        let documents = builder
            .build_query_as::<Document>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(documents)
    }

    #[tracing::instrument(
        name = "documents.pg.count",
        skip(self, filters),
        fields(store_uuid = %store, collection = %collection, filter_count = filters.len()),
        err
    )]
    async fn count(
        &self,
        store: StoreUuid,
        collection: Collection,
        filters: Vec<Filter>,
    ) -> Result<u64, DocumentStoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_DOCUMENTS_PREFIX);

        push_scope(&mut builder, store, collection, &filters);

        let mut tx = self.db.begin_store_transaction(store).await?;

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        try_u64_from_i64(count, "count")
    }
}

fn push_scope(
    builder: &mut QueryBuilder<'_, Postgres>,
    store: StoreUuid,
    collection: Collection,
    filters: &[Filter],
) {
    builder.push_bind(store.into_uuid());
    builder.push(" AND collection = ");
    builder.push_bind(collection.as_str());

    for filter in filters {
        match filter {
            Filter::Eq { field, value } => {
                builder.push(" AND body -> ");
                builder.push_bind(field.clone());
                builder.push(" = ");
                builder.push_bind(Json(value.clone()));
            }
        }
    }
}

fn try_i64_from_u64(value: u64, column: &'static str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_u64_from_i64(value: i64, column: &'static str) -> Result<u64, DocumentStoreError> {
    u64::try_from(value).map_err(|e| {
        DocumentStoreError::Sql(sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
}

impl<'r> FromRow<'r, PgRow> for Document {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let version: i64 = row.try_get(COLUMN_VERSION)?;

        let version = u64::try_from(version).map_err(|e| sqlx::Error::ColumnDecode {
            index: COLUMN_VERSION.to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            uuid: row.try_get("uuid")?,
            version,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            body: row.try_get::<Json<Value>, _>("body")?.0,
        })
    }
}
