//! Database connection management

use sqlx::{PgPool, Postgres, Transaction, query, raw_sql};

use crate::domain::stores::records::StoreUuid;

/// SQL used to set store context for row-level security.
pub const SET_STORE_CONTEXT_SQL: &str = "SELECT set_config('app.current_store_uuid', $1, true)";

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction and set store context for RLS policies.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting store context fails.
    pub async fn begin_store_transaction(
        &self,
        store: StoreUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_STORE_CONTEXT_SQL)
            .bind(store.into_uuid().to_string())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Create the documents table and its policies if they do not exist.
///
/// # Errors
///
/// Returns an error if any schema statement fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    raw_sql(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}
