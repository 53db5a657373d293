//! Checkout service.
//!
//! Builds a pending order from a cart snapshot (or a single event booking),
//! reserving seats for event lines in the same transaction, then opens a
//! hosted payment session. The order is committed before the provider is
//! called, so a provider failure leaves a `pending` order that can be retried
//! or abandoned. A retry from the same cart session reopens that order rather
//! than creating another; after a failed payment the old order keeps its
//! status but gives up its seats. The cart is left untouched until payment completes.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        bookings::{
            PgBookingEngine,
            records::{BookingStatus, NewBooking},
        },
        carts::CartsService,
        catalog::{
            records::{CatalogItemRecord, ItemRef},
            repository::PgCatalogRepository,
        },
        checkout::{
            errors::CheckoutError,
            records::{
                CheckoutConfig, CheckoutCreated, CheckoutRequest, EventBookingCreated,
                EventBookingRequest, is_valid_email,
            },
        },
        orders::{
            OrderRecord, OrderStatus, OrderUuid,
            records::{NewOrder, NewOrderItem},
            repository::PgOrdersRepository,
        },
        payments::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
        pricing::line_subtotal,
    },
    identity::UserUuid,
};

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts: Arc<dyn CartsService>,
    gateway: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
    catalog_repository: PgCatalogRepository,
    orders_repository: PgOrdersRepository,
    bookings: PgBookingEngine,
}

impl std::fmt::Debug for PgCheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCheckoutService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A line about to be written to the order, priced from the live catalog.
struct PricedLine {
    record: CatalogItemRecord,
    quantity: u32,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(
        db: Db,
        carts: Arc<dyn CartsService>,
        gateway: Arc<dyn PaymentGateway>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            db,
            carts,
            gateway,
            config,
            catalog_repository: PgCatalogRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            bookings: PgBookingEngine::new(),
        }
    }

    async fn price_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: ItemRef,
        quantity: u32,
    ) -> Result<PricedLine, CheckoutError> {
        let record = match self.catalog_repository.get_item(&mut **tx, item).await {
            Ok(record) => record,
            Err(sqlx::Error::RowNotFound) => return Err(CheckoutError::ItemUnavailable(item)),
            Err(error) => return Err(error.into()),
        };

        Ok(PricedLine { record, quantity })
    }

    /// Write the order's items and collect the bookings its event lines need.
    async fn write_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
        lines: &[PricedLine],
    ) -> Result<Vec<NewBooking>, CheckoutError> {
        let mut bookings = Vec::new();

        for line in lines {
            self.orders_repository
                .create_order_item(
                    tx,
                    order.uuid,
                    &NewOrderItem {
                        item: line.record.item,
                        title: line.record.title.clone(),
                        unit_price: line.record.price,
                        quantity: line.quantity,
                    },
                )
                .await?;

            if let (ItemRef::Event(event), Some(user)) = (line.record.item, order.user) {
                bookings.push(NewBooking {
                    event,
                    user,
                    attendees: line.quantity,
                    order: Some(order.uuid),
                });
            }
        }

        Ok(bookings)
    }

    /// Reuse the session's unpaid order instead of stacking a second one.
    ///
    /// Its seats go back to the events and its items are replaced, so a retry
    /// after a provider failure (or an abandoned provider page) reserves again
    /// from a clean slate.
    async fn create_or_reopen_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<OrderRecord, CheckoutError> {
        let existing = match order.session_key.as_deref() {
            Some(session) => {
                self.orders_repository
                    .lock_session_unpaid_order(tx, session)
                    .await?
            }
            None => None,
        };

        let Some(existing) = existing else {
            return Ok(self.orders_repository.create_order(tx, &order).await?);
        };

        for booking in self.bookings.bookings_for_order(tx, existing.uuid).await? {
            if matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Confirmed
            ) {
                self.bookings.cancel(tx, booking.uuid).await?;
            }
        }

        if existing.status != OrderStatus::Pending {
            info!(
                previous = %existing.uuid,
                "released seats of failed order before checkout retry"
            );

            return Ok(self.orders_repository.create_order(tx, &order).await?);
        }

        let reopened = self
            .orders_repository
            .reopen_order(tx, existing.uuid, &order)
            .await?;

        info!(order = %reopened.uuid, "reopened pending order for checkout retry");

        Ok(reopened)
    }

    fn new_order(
        &self,
        user: Option<UserUuid>,
        session_key: Option<String>,
        email: &str,
        lines: &[PricedLine],
    ) -> NewOrder {
        let subtotal = lines
            .iter()
            .map(|line| line_subtotal(line.record.price, line.quantity))
            .fold(0_u64, u64::saturating_add);

        NewOrder {
            uuid: OrderUuid::new(),
            user,
            session_key,
            email: email.to_string(),
            subtotal,
            tax: self.config.tax.tax_on(subtotal),
            currency: self.config.currency.clone(),
        }
    }

    /// Open the provider session and record its reference on the order.
    async fn open_payment_session(
        &self,
        order: &OrderRecord,
        success_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<CheckoutSession, CheckoutError> {
        let request = CheckoutSessionRequest {
            order: order.uuid,
            amount: order.total,
            currency: order.currency.clone(),
            description: format!("Order {}", order.uuid),
            customer_email: order.email.clone(),
            success_url: self.config.success_url(success_url, order.uuid),
            cancel_url: self.config.cancel_url(cancel_url, order.uuid),
        };

        let session = self
            .gateway
            .create_checkout_session(&request)
            .await
            .map_err(|source| {
                warn!(order = %order.uuid, error = %source, "payment session creation failed");

                CheckoutError::Gateway {
                    order: order.uuid,
                    source,
                }
            })?;

        let mut tx = self.db.begin().await?;

        self.orders_repository
            .set_payment_reference(&mut tx, order.uuid, &session.reference)
            .await?;

        tx.commit().await?;

        Ok(session)
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutCreated, CheckoutError> {
        if !is_valid_email(&request.email) {
            return Err(CheckoutError::InvalidEmail);
        }

        let cart = self.carts.get_cart(&request.session).await?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let has_events = cart
            .lines
            .iter()
            .any(|line| matches!(line.item, ItemRef::Event(_)));

        if has_events && request.user.is_none() {
            return Err(CheckoutError::AuthenticationRequired);
        }

        let mut tx = self.db.begin().await?;
        let mut lines = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            lines.push(self.price_line(&mut tx, line.item, line.quantity).await?);
        }

        let new_order = self.new_order(
            request.user,
            Some(request.session.to_string()),
            &request.email,
            &lines,
        );

        let order = self.create_or_reopen_order(&mut tx, new_order).await?;
        let bookings = self.write_items(&mut tx, &order, &lines).await?;

        for booking in bookings {
            self.bookings.reserve(&mut tx, booking).await?;
        }

        tx.commit().await?;

        info!(
            order = %order.uuid,
            lines = lines.len(),
            total = order.total,
            "created pending order"
        );

        let session = self
            .open_payment_session(
                &order,
                request.success_url.as_deref(),
                request.cancel_url.as_deref(),
            )
            .await?;

        Ok(CheckoutCreated {
            order: order.uuid,
            payment_reference: session.reference,
            session_url: session.url,
        })
    }

    async fn book_event(
        &self,
        request: EventBookingRequest,
    ) -> Result<EventBookingCreated, CheckoutError> {
        if !is_valid_email(&request.email) {
            return Err(CheckoutError::InvalidEmail);
        }

        let mut tx = self.db.begin().await?;

        let line = self
            .price_line(&mut tx, ItemRef::Event(request.event), request.attendees)
            .await?;
        let lines = [line];

        let new_order = self.new_order(Some(request.user), None, &request.email, &lines);

        let order = self.orders_repository.create_order(&mut tx, &new_order).await?;

        // Reserve before the item insert so an invalid attendee count surfaces
        // as a booking error rather than a CHECK violation.
        let booking = self
            .bookings
            .reserve(
                &mut tx,
                NewBooking {
                    event: request.event,
                    user: request.user,
                    attendees: request.attendees,
                    order: Some(order.uuid),
                },
            )
            .await?;

        for line in &lines {
            self.orders_repository
                .create_order_item(
                    &mut tx,
                    order.uuid,
                    &NewOrderItem {
                        item: line.record.item,
                        title: line.record.title.clone(),
                        unit_price: line.record.price,
                        quantity: line.quantity,
                    },
                )
                .await?;
        }

        tx.commit().await?;

        info!(order = %order.uuid, booking = %booking.uuid, "created pending event booking");

        let session = self.open_payment_session(&order, None, None).await?;

        Ok(EventBookingCreated {
            booking: booking.uuid,
            order: order.uuid,
            total_price: booking.total_price,
            payment_reference: session.reference,
            session_url: session.url,
        })
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Turn the session's cart into a pending order and a hosted payment session.
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutCreated, CheckoutError>;

    /// Book seats for one event and open a payment session for them.
    async fn book_event(
        &self,
        request: EventBookingRequest,
    ) -> Result<EventBookingCreated, CheckoutError>;
}
