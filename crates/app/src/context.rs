//! App Context

use std::sync::Arc;

use shopifree::clock::Clock;
use thiserror::Error;

use crate::{
    database::{self, Db},
    documents::{DocumentStore, PgDocumentStore},
    domain::{
        coupons::{CouponsService, DocumentCouponsService},
        promotions::{DocumentPromotionsService, PromotionsService},
        usage::{DocumentUsageCounter, UsageCounter},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub coupons: Arc<dyn CouponsService>,
    pub promotions: Arc<dyn PromotionsService>,
}

impl AppContext {
    /// Wire services over any document store.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        let usage: Arc<dyn UsageCounter> = Arc::new(DocumentUsageCounter::new(documents.clone()));

        Self {
            coupons: Arc::new(DocumentCouponsService::new(
                documents.clone(),
                usage.clone(),
                clock.clone(),
            )),
            promotions: Arc::new(DocumentPromotionsService::new(documents, usage, clock)),
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, clock: Arc<dyn Clock>) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let documents = Arc::new(PgDocumentStore::new(Db::new(pool)));

        Ok(Self::new(documents, clock))
    }
}
