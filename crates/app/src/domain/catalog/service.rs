//! Catalog service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::catalog::{
        errors::CatalogServiceError,
        records::{CatalogItemRecord, ItemRef},
        repository::PgCatalogRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    repository: PgCatalogRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    async fn get_item(&self, item: ItemRef) -> Result<CatalogItemRecord, CatalogServiceError> {
        let mut conn = self.db.pool().acquire().await?;

        let record = self.repository.get_item(&mut conn, item).await?;

        Ok(record)
    }
}

#[automock]
#[async_trait]
/// Read-only access to the sellable catalog.
pub trait CatalogService: Send + Sync {
    /// Retrieve a published item's price, title and capacity details.
    async fn get_item(&self, item: ItemRef) -> Result<CatalogItemRecord, CatalogServiceError>;
}
