//! Test context for document store integration tests.

use sqlx::{Connection, PgConnection, PgPool, query};

use crate::{database::Db, documents::PgDocumentStore, domain::stores::records::StoreUuid};

use super::db::{SUPERUSER, SUPERUSER_PASSWORD, TestDb};

/// Non-superuser role the store connects as, so row-level security is enforced.
const APP_ROLE: &str = "shopifree_app_test";
const APP_ROLE_PASSWORD: &str = "shopifree_app_test_pass";

pub struct TestContext {
    pub db: TestDb,

    /// Pool connected as [`APP_ROLE`].
    pub app_pool: PgPool,

    pub documents: PgDocumentStore,
    pub store: StoreUuid,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;

        let app_pool = Self::setup_app_pool(&test_db).await;

        Self {
            documents: PgDocumentStore::new(Db::new(app_pool.clone())),
            app_pool,
            store: StoreUuid::new(),
            db: test_db,
        }
    }

    /// Create the app role (once per server), grant it the documents table and connect as it.
    ///
    /// Superusers bypass RLS even under `FORCE ROW LEVEL SECURITY`.
    async fn setup_app_pool(test_db: &TestDb) -> PgPool {
        let su_url = &test_db.superuser_url;

        let postgres_url = su_url.rsplit_once('/').map_or(su_url.as_str(), |x| x.0);
        let postgres_url = format!("{postgres_url}/postgres");

        let mut server_conn = PgConnection::connect(&postgres_url)
            .await
            .expect("Failed to connect to postgres database for role setup");

        // Parallel tests race to create the role; "already exists" (42710) and the underlying
        // unique violation (23505) both mean it is there.
        let create_result = query(&format!(
            "CREATE ROLE {APP_ROLE} WITH LOGIN PASSWORD '{APP_ROLE_PASSWORD}' \
               NOSUPERUSER NOCREATEDB NOCREATEROLE"
        ))
        .execute(&mut server_conn)
        .await;

        match create_result {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref e))
                if matches!(e.code().as_deref(), Some("42710" | "23505")) => {}
            Err(error) => panic!("Failed to create app role: {error}"),
        }

        query(&format!(
            "GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}",
            test_db.name
        ))
        .execute(&mut server_conn)
        .await
        .expect("Failed to grant CONNECT on test database");

        server_conn
            .close()
            .await
            .expect("Failed to close server connection");

        let mut db_conn = PgConnection::connect(su_url)
            .await
            .expect("Failed to connect to test database for privilege setup");

        for stmt in [
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!("GRANT SELECT, INSERT, UPDATE, DELETE ON documents TO {APP_ROLE}"),
        ] {
            query(&stmt)
                .execute(&mut db_conn)
                .await
                .expect("Failed to grant table privileges to app role");
        }

        db_conn
            .close()
            .await
            .expect("Failed to close db connection");

        let app_url = su_url.replacen(
            &format!("{SUPERUSER}:{SUPERUSER_PASSWORD}"),
            &format!("{APP_ROLE}:{APP_ROLE_PASSWORD}"),
            1,
        );

        PgPool::connect(&app_url)
            .await
            .expect("Failed to create app pool")
    }
}
