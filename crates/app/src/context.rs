//! App Context

use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::{
    config::AppSettings,
    database::{self, Db},
    domain::{
        bookings::{BookingsService, PgBookingsService},
        carts::{CartStoreError, CartsService, RedisCartStore, StoreCartsService},
        catalog::{CatalogService, PgCatalogService},
        checkout::{CheckoutService, PgCheckoutService},
        downloads::{DownloadsService, PgDownloadsService},
        fulfillment::{FulfillmentService, PgFulfillmentService},
        notifications::{HttpNotifier, LogNotifier, NotificationDispatcher, Notifier},
        payments::{GatewayError, HttpPaymentGateway, PaymentGateway},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to connect to cart store")]
    CartStore(#[source] CartStoreError),

    #[error("failed to build payment gateway client")]
    Gateway(#[source] GatewayError),

    #[error("failed to build notification client")]
    Notifier(#[source] reqwest::Error),
}

/// Every service the transports call, behind trait objects.
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub carts: Arc<dyn CartsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub fulfillment: Arc<dyn FulfillmentService>,
    pub bookings: Arc<dyn BookingsService>,
    pub downloads: Arc<dyn DownloadsService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Connect to `PostgreSQL` and Redis and wire up every service.
    ///
    /// # Errors
    ///
    /// Returns an error when a backing store is unreachable or an HTTP client
    /// cannot be built.
    pub async fn from_settings(settings: &AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(&settings.database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        let store = RedisCartStore::connect(&settings.carts.redis_url)
            .await
            .map_err(AppInitError::CartStore)?;

        let gateway: Arc<dyn PaymentGateway> = Arc::new(
            HttpPaymentGateway::new(settings.payments.gateway_config())
                .map_err(AppInitError::Gateway)?,
        );

        let notifier: Arc<dyn Notifier> = match &settings.notifications.notify_url {
            Some(url) => {
                let http = Client::builder()
                    .timeout(settings.payments.gateway_config().timeout)
                    .build()
                    .map_err(AppInitError::Notifier)?;

                Arc::new(HttpNotifier::new(url.clone(), http))
            }
            None => {
                info!("NOTIFY_URL unset; notifications will only be logged");

                Arc::new(LogNotifier)
            }
        };

        let catalog: Arc<dyn CatalogService> = Arc::new(PgCatalogService::new(db.clone()));

        let carts: Arc<dyn CartsService> = Arc::new(StoreCartsService::new(
            Arc::new(store),
            catalog.clone(),
            settings.carts.carts_config(),
        ));

        let notifications =
            NotificationDispatcher::new(notifier, settings.notifications.admin_emails.clone());

        Ok(Self {
            checkout: Arc::new(PgCheckoutService::new(
                db.clone(),
                carts.clone(),
                gateway.clone(),
                settings.payments.checkout_config(&settings.carts),
            )),
            fulfillment: Arc::new(PgFulfillmentService::new(
                db.clone(),
                carts.clone(),
                gateway,
                settings.payments.webhook_verifier(),
                notifications,
            )),
            bookings: Arc::new(PgBookingsService::new(db.clone())),
            downloads: Arc::new(PgDownloadsService::new(
                db,
                settings.downloads.downloads_config(),
            )),
            catalog,
            carts,
        })
    }
}
