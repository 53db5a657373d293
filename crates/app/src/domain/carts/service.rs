//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        records::{CartRecord, CartsConfig, MAX_LINE_QUANTITY, SessionKey},
        store::CartStore,
    },
    catalog::{CatalogService, records::ItemRef},
};

/// Request to add an item to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartLine {
    pub item: ItemRef,
    pub quantity: u32,
}

/// Cart service backed by any [`CartStore`], pricing lines from the catalog.
#[derive(Clone)]
pub struct StoreCartsService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogService>,
    config: CartsConfig,
}

impl std::fmt::Debug for StoreCartsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCartsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StoreCartsService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogService>,
        config: CartsConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    async fn save(
        &self,
        session: &SessionKey,
        cart: &mut CartRecord,
    ) -> Result<(), CartsServiceError> {
        cart.recompute(self.config.tax);
        cart.updated_at = Some(Timestamp::now());

        self.store.save(session, cart, self.config.ttl).await?;

        Ok(())
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    async fn get_cart(&self, session: &SessionKey) -> Result<CartRecord, CartsServiceError> {
        Ok(self.store.load(session).await?.unwrap_or_default())
    }

    async fn add_item(
        &self,
        session: &SessionKey,
        line: NewCartLine,
    ) -> Result<CartRecord, CartsServiceError> {
        if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
            return Err(CartsServiceError::InvalidQuantity(line.quantity));
        }

        let item = self.catalog.get_item(line.item).await?;

        let mut cart = self.store.load(session).await?.unwrap_or_default();

        cart.merge_line(line.item, item.title, item.price, line.quantity);

        self.save(session, &mut cart).await?;

        debug!(
            session = %session,
            item_type = %line.item.item_type(),
            item = %line.item.uuid(),
            quantity = line.quantity,
            "added cart item"
        );

        Ok(cart)
    }

    async fn remove_item(
        &self,
        session: &SessionKey,
        item: ItemRef,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut cart = self
            .store
            .load(session)
            .await?
            .ok_or(CartsServiceError::LineNotFound)?;

        if !cart.remove_line(item) {
            return Err(CartsServiceError::LineNotFound);
        }

        self.save(session, &mut cart).await?;

        Ok(cart)
    }

    async fn clear(&self, session: &SessionKey) -> Result<(), CartsServiceError> {
        self.store.delete(session).await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the cart for a session; missing carts are empty.
    async fn get_cart(&self, session: &SessionKey) -> Result<CartRecord, CartsServiceError>;

    /// Add an item, merging with an existing line for the same item.
    async fn add_item(
        &self,
        session: &SessionKey,
        line: NewCartLine,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove the line for an item.
    async fn remove_item(
        &self,
        session: &SessionKey,
        item: ItemRef,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Destroy the cart.
    async fn clear(&self, session: &SessionKey) -> Result<(), CartsServiceError>;
}
