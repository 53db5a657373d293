//! Payment webhook processing and order fulfillment.
//!
//! Every order transition is a conditional write guarded by the statuses it
//! may leave, so redelivered or out-of-order events can never move an order
//! backwards or fulfil it twice. Webhooks and direct client confirmation share
//! [`PgFulfillmentService::complete`], which makes a concurrent webhook and
//! confirmation complete the order exactly once.
//!
//! Notifications and cart clearing run after commit and only log failures.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        bookings::{BookingError, PgBookingEngine},
        carts::{CartsService, records::SessionKey},
        catalog::records::ItemRef,
        enrollments::repository::PgEnrollmentsRepository,
        fulfillment::errors::FulfillmentError,
        notifications::{Notification, NotificationDispatcher, NotificationKind},
        orders::{OrderRecord, OrderStatus, OrderUuid, repository::PgOrdersRepository},
        payments::{PaymentEvent, PaymentGateway, ProviderEvent, WebhookVerifier},
    },
    identity::Identity,
};

/// Result of handling one payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event moved the order to a new status.
    Processed,

    /// The order had already left the source status; nothing changed.
    AlreadyHandled,

    /// The event is irrelevant to this system.
    Ignored,
}

impl WebhookOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::AlreadyHandled => "already_handled",
            Self::Ignored => "ignored",
        }
    }
}

#[derive(Clone)]
pub struct PgFulfillmentService {
    db: Db,
    carts: Arc<dyn CartsService>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: WebhookVerifier,
    notifications: NotificationDispatcher,
    orders_repository: PgOrdersRepository,
    enrollments_repository: PgEnrollmentsRepository,
    bookings: PgBookingEngine,
}

impl std::fmt::Debug for PgFulfillmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgFulfillmentService").finish_non_exhaustive()
    }
}

impl PgFulfillmentService {
    #[must_use]
    pub fn new(
        db: Db,
        carts: Arc<dyn CartsService>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: WebhookVerifier,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            db,
            carts,
            gateway,
            verifier,
            notifications,
            orders_repository: PgOrdersRepository::new(),
            enrollments_repository: PgEnrollmentsRepository::new(),
            bookings: PgBookingEngine::new(),
        }
    }

    async fn read_order(&self, order: OrderUuid) -> Result<OrderRecord, FulfillmentError> {
        let mut tx = self.db.begin().await?;

        let record = self.orders_repository.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(record)
    }

    /// Explain a transition guard that matched no row.
    async fn guard_missed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        attempted: OrderStatus,
    ) -> Result<WebhookOutcome, FulfillmentError> {
        match self.orders_repository.get_order(tx, order).await {
            Ok(current) => {
                info!(
                    %order,
                    status = %current.status,
                    %attempted,
                    "order cannot make this transition; treating event as handled"
                );

                Ok(WebhookOutcome::AlreadyHandled)
            }
            Err(sqlx::Error::RowNotFound) => {
                warn!(%order, %attempted, "payment event references an unknown order");

                Ok(WebhookOutcome::Ignored)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// `pending -> completed`, granting access in the same transaction.
    pub async fn complete(
        &self,
        order: OrderUuid,
        payment_reference: &str,
    ) -> Result<WebhookOutcome, FulfillmentError> {
        let mut tx = self.db.begin().await?;

        let Some(record) = self
            .orders_repository
            .transition(&mut tx, order, OrderStatus::Completed)
            .await?
        else {
            return self
                .guard_missed(&mut tx, order, OrderStatus::Completed)
                .await;
        };

        if record.payment_reference.is_none() {
            self.orders_repository
                .set_payment_reference(&mut tx, order, payment_reference)
                .await?;
        }

        let items = self.orders_repository.get_order_items(&mut tx, order).await?;
        let mut enrolled = 0_u32;

        for item in &items {
            let ItemRef::Course(course) = item.item else {
                continue;
            };

            let Some(user) = record.user else {
                warn!(%order, %course, "guest order; skipping course enrollment");
                continue;
            };

            if self
                .enrollments_repository
                .grant(&mut tx, user, course, order)
                .await?
            {
                enrolled += 1;
            }
        }

        for booking in self.bookings.bookings_for_order(&mut tx, order).await? {
            match self.bookings.confirm(&mut tx, booking.uuid).await {
                Ok(_) => {}
                Err(BookingError::NotActive(status)) => warn!(
                    %order,
                    booking = %booking.uuid,
                    %status,
                    "paid order holds an inactive booking; needs manual follow-up"
                ),
                Err(error) => return Err(error.into()),
            }
        }

        tx.commit().await?;

        info!(%order, enrolled, "order completed");

        self.notify(NotificationKind::OrderCompleted, &record);
        self.clear_cart(&record).await;

        Ok(WebhookOutcome::Processed)
    }

    /// `pending -> payment_failed`. Seats stay held until refund or stale release.
    async fn fail(&self, order: OrderUuid) -> Result<WebhookOutcome, FulfillmentError> {
        let mut tx = self.db.begin().await?;

        if self
            .orders_repository
            .transition(&mut tx, order, OrderStatus::PaymentFailed)
            .await?
            .is_none()
        {
            return self
                .guard_missed(&mut tx, order, OrderStatus::PaymentFailed)
                .await;
        }

        tx.commit().await?;

        info!(%order, "order payment failed");

        Ok(WebhookOutcome::Processed)
    }

    /// `pending|completed -> refunded`, revoking access and returning seats.
    async fn refund(&self, order: OrderUuid) -> Result<WebhookOutcome, FulfillmentError> {
        let mut tx = self.db.begin().await?;

        let Some(record) = self
            .orders_repository
            .transition(&mut tx, order, OrderStatus::Refunded)
            .await?
        else {
            return self
                .guard_missed(&mut tx, order, OrderStatus::Refunded)
                .await;
        };

        let revoked = self
            .enrollments_repository
            .revoke_for_order(&mut tx, order)
            .await?;

        for booking in self.bookings.bookings_for_order(&mut tx, order).await? {
            match self.bookings.cancel(&mut tx, booking.uuid).await {
                Ok(_) => {}
                Err(BookingError::NotActive(status)) => warn!(
                    %order,
                    booking = %booking.uuid,
                    %status,
                    "refunded order holds a booking that cannot be cancelled"
                ),
                Err(error) => return Err(error.into()),
            }
        }

        tx.commit().await?;

        info!(%order, revoked, "order refunded");

        self.notify(NotificationKind::OrderRefunded, &record);

        Ok(WebhookOutcome::Processed)
    }

    fn notify(&self, kind: NotificationKind, order: &OrderRecord) {
        self.notifications.dispatch(Notification {
            kind,
            order: order.uuid,
            customer_email: order.email.clone(),
            total: order.total,
            currency: order.currency.clone(),
        });
    }

    async fn clear_cart(&self, order: &OrderRecord) {
        let Some(key) = order.session_key.as_deref() else {
            return;
        };

        let session = match SessionKey::parse(key) {
            Ok(session) => session,
            Err(error) => {
                warn!(order = %order.uuid, %error, "order carries an unusable cart session");
                return;
            }
        };

        if let Err(error) = self.carts.clear(&session).await {
            warn!(order = %order.uuid, %error, "failed to clear cart after payment");
        }
    }
}

#[async_trait]
impl FulfillmentService for PgFulfillmentService {
    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, FulfillmentError> {
        self.verifier.verify(payload, signature, Timestamp::now())?;

        let event = ProviderEvent::decode(payload)?;

        debug!(event = %event.id, kind = %event.kind, "verified payment event");

        self.process_event(event.event).await
    }

    async fn process_event(&self, event: PaymentEvent) -> Result<WebhookOutcome, FulfillmentError> {
        match event {
            PaymentEvent::CheckoutCompleted {
                order,
                payment_reference,
            } => self.complete(order, &payment_reference).await,
            PaymentEvent::PaymentFailed { order } => self.fail(order).await,
            PaymentEvent::ChargeRefunded { order } => self.refund(order).await,
            PaymentEvent::Ignored { kind } => {
                debug!(%kind, "ignoring payment event");

                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn confirm(
        &self,
        order: OrderUuid,
        identity: Option<Identity>,
    ) -> Result<OrderStatus, FulfillmentError> {
        let record = self.read_order(order).await?;

        if let Some(owner) = record.user {
            let allowed = identity
                .is_some_and(|identity| identity.user == owner || identity.is_admin());

            if !allowed {
                return Err(FulfillmentError::Forbidden);
            }
        }

        if record.status != OrderStatus::Pending {
            return Ok(record.status);
        }

        let Some(reference) = record.payment_reference.as_deref() else {
            return Ok(OrderStatus::Pending);
        };

        let session = self.gateway.retrieve_session(reference).await?;

        if !session.paid {
            return Ok(OrderStatus::Pending);
        }

        self.complete(order, &session.reference).await?;

        Ok(self.read_order(order).await?.status)
    }

    async fn request_refund(&self, order: OrderUuid) -> Result<(), FulfillmentError> {
        let record = self.read_order(order).await?;

        let (OrderStatus::Completed, Some(reference)) =
            (record.status, record.payment_reference.as_deref())
        else {
            return Err(FulfillmentError::NotRefundable(record.status));
        };

        self.gateway.refund(reference, order).await?;

        info!(%order, "refund requested from payment provider");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait FulfillmentService: Send + Sync {
    /// Verify, decode and process one raw webhook delivery.
    async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, FulfillmentError>;

    /// Drive the order state machine for an already decoded event.
    async fn process_event(&self, event: PaymentEvent) -> Result<WebhookOutcome, FulfillmentError>;

    /// Client return from the provider: complete the order if the provider
    /// reports it paid, and report the order's current status.
    async fn confirm(
        &self,
        order: OrderUuid,
        identity: Option<Identity>,
    ) -> Result<OrderStatus, FulfillmentError>;

    /// Ask the provider to refund a completed order. The resulting
    /// `charge.refunded` webhook performs the state change.
    async fn request_refund(&self, order: OrderUuid) -> Result<(), FulfillmentError>;
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use mockall::predicate::eq;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::records::BookingStatus,
            carts::{CartStoreError, CartsServiceError, MockCartsService},
            catalog::records::{CourseUuid, EventUuid},
            notifications::{LogNotifier, MockNotifier, NotifyError},
            payments::{MockPaymentGateway, SessionStatus},
        },
        identity::{Role, UserUuid},
        secrets::Secret,
        test::{
            TestContext,
            helpers::{self, PlaceOrder},
        },
    };

    use super::*;

    const WEBHOOK_SECRET: &str = "whsec_fulfillment";

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Secret::new(WEBHOOK_SECRET), Duration::from_secs(300))
    }

    fn service(
        ctx: &TestContext,
        carts: MockCartsService,
        gateway: MockPaymentGateway,
    ) -> PgFulfillmentService {
        PgFulfillmentService::new(
            Db::new(ctx.db.pool().clone()),
            Arc::new(carts),
            Arc::new(gateway),
            verifier(),
            NotificationDispatcher::new(Arc::new(LogNotifier), Vec::new()),
        )
    }

    fn signed(kind: &str, order: OrderUuid) -> Result<(Vec<u8>, String), FulfillmentError> {
        let payload = json!({
            "id": "evt_test",
            "type": kind,
            "data": {
                "object": {
                    "id": format!("cs_{order}"),
                    "payment_status": "paid",
                    "metadata": { "order_uuid": order.to_string() },
                },
            },
        })
        .to_string()
        .into_bytes();

        let header = verifier().sign(&payload, Timestamp::now().as_second())?;

        Ok((payload, header))
    }

    struct Fixture {
        user: UserUuid,
        course: CourseUuid,
        event: EventUuid,
        order: OrderUuid,
        session: SessionKey,
    }

    async fn course_and_event_order(ctx: &TestContext) -> TestResult<Fixture> {
        let user = UserUuid::new();
        let session = SessionKey::generate();
        let course = helpers::create_course(ctx, "Rust 101", 10_00).await?;
        let event = helpers::create_event(ctx, "Workshop", 20_00, 4).await?;

        let order = helpers::place_order(
            ctx,
            PlaceOrder {
                user: Some(user),
                session_key: Some(session.to_string()),
                lines: vec![(ItemRef::Course(course), 1), (ItemRef::Event(event), 2)],
            },
        )
        .await?;

        Ok(Fixture {
            user,
            course,
            event,
            order,
            session,
        })
    }

    #[tokio::test]
    async fn redelivered_completion_fulfils_once() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();

        carts
            .expect_clear()
            .with(eq(fixture.session.clone()))
            .once()
            .returning(|_| Ok(()));

        let service = service(&ctx, carts, MockPaymentGateway::new());
        let (payload, header) = signed("checkout.session.completed", fixture.order)?;

        let first = service.handle_webhook(&payload, &header).await?;
        let second = service.handle_webhook(&payload, &header).await?;

        assert_eq!(first, WebhookOutcome::Processed);
        assert_eq!(second, WebhookOutcome::AlreadyHandled);

        let order = helpers::get_order(&ctx, fixture.order).await?;

        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 1);
        assert!(helpers::is_enrolled(&ctx, fixture.user, fixture.course).await?);

        let bookings = helpers::get_order_bookings(&ctx, fixture.order).await?;

        assert!(bookings.iter().all(|b| b.status == BookingStatus::Confirmed));
        assert_eq!(helpers::available_spots(&ctx, fixture.event).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn completion_survives_cart_and_notifier_failures() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();
        let mut notifier = MockNotifier::new();
        let attempts = Arc::new(AtomicUsize::new(0));

        carts.expect_clear().once().returning(|_| {
            Err(CartsServiceError::Store(CartStoreError::Redis(
                redis::RedisError::from((redis::ErrorKind::IoError, "connection reset")),
            )))
        });

        let counted = Arc::clone(&attempts);

        notifier.expect_notify().returning(move |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Rejected(503))
        });

        let service = PgFulfillmentService::new(
            Db::new(ctx.db.pool().clone()),
            Arc::new(carts),
            Arc::new(MockPaymentGateway::new()),
            verifier(),
            NotificationDispatcher::new(Arc::new(notifier), Vec::new()),
        );
        let (payload, header) = signed("checkout.session.completed", fixture.order)?;

        let outcome = service.handle_webhook(&payload, &header).await?;

        assert_eq!(outcome, WebhookOutcome::Processed);

        for _ in 0..100 {
            if attempts.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        let order = helpers::get_order(&ctx, fixture.order).await?;

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 1);
        assert!(helpers::is_enrolled(&ctx, fixture.user, fixture.course).await?);

        Ok(())
    }

    #[tokio::test]
    async fn bad_signature_has_no_side_effects() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();

        carts.expect_clear().never();

        let service = service(&ctx, carts, MockPaymentGateway::new());
        let (payload, _) = signed("checkout.session.completed", fixture.order)?;
        let forged = format!("t={},v1={}", Timestamp::now().as_second(), "00".repeat(32));

        let result = service.handle_webhook(&payload, &forged).await;

        assert!(
            matches!(result, Err(FulfillmentError::Signature(_))),
            "expected Signature error, got {result:?}"
        );
        assert_eq!(
            helpers::get_order(&ctx, fixture.order).await?.status,
            OrderStatus::Pending
        );

        Ok(())
    }

    #[tokio::test]
    async fn refund_revokes_access_and_returns_seats() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();

        carts.expect_clear().returning(|_| Ok(()));

        let service = service(&ctx, carts, MockPaymentGateway::new());

        service
            .process_event(PaymentEvent::CheckoutCompleted {
                order: fixture.order,
                payment_reference: format!("cs_{}", fixture.order),
            })
            .await?;

        let outcome = service
            .process_event(PaymentEvent::ChargeRefunded {
                order: fixture.order,
            })
            .await?;

        assert_eq!(outcome, WebhookOutcome::Processed);

        let order = helpers::get_order(&ctx, fixture.order).await?;

        assert_eq!(order.status, OrderStatus::Refunded);
        assert!(order.refunded_at.is_some());
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 0);

        let bookings = helpers::get_order_bookings(&ctx, fixture.order).await?;

        assert!(bookings.iter().all(|b| b.status == BookingStatus::Cancelled));
        assert_eq!(helpers::available_spots(&ctx, fixture.event).await?, 4);

        Ok(())
    }

    #[tokio::test]
    async fn late_completion_never_resurrects_refunded_order() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();

        carts.expect_clear().never();

        let service = service(&ctx, carts, MockPaymentGateway::new());

        service
            .process_event(PaymentEvent::ChargeRefunded {
                order: fixture.order,
            })
            .await?;

        let outcome = service
            .process_event(PaymentEvent::CheckoutCompleted {
                order: fixture.order,
                payment_reference: "cs_late".to_string(),
            })
            .await?;

        assert_eq!(outcome, WebhookOutcome::AlreadyHandled);
        assert_eq!(
            helpers::get_order(&ctx, fixture.order).await?.status,
            OrderStatus::Refunded
        );
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn payment_failure_keeps_bookings_pending() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let service = service(&ctx, MockCartsService::new(), MockPaymentGateway::new());

        let outcome = service
            .process_event(PaymentEvent::PaymentFailed {
                order: fixture.order,
            })
            .await?;

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(
            helpers::get_order(&ctx, fixture.order).await?.status,
            OrderStatus::PaymentFailed
        );

        let bookings = helpers::get_order_bookings(&ctx, fixture.order).await?;

        assert!(bookings.iter().all(|b| b.status == BookingStatus::Pending));
        assert_eq!(helpers::available_spots(&ctx, fixture.event).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_acknowledged() -> TestResult {
        let ctx = TestContext::new().await;
        let service = service(&ctx, MockCartsService::new(), MockPaymentGateway::new());
        let (payload, header) = signed("checkout.session.completed", OrderUuid::new())?;

        let outcome = service.handle_webhook(&payload, &header).await?;

        assert_eq!(outcome, WebhookOutcome::Ignored);

        Ok(())
    }

    #[tokio::test]
    async fn guest_order_completes_without_enrollment() -> TestResult {
        let ctx = TestContext::new().await;
        let course = helpers::create_course(&ctx, "Rust 101", 10_00).await?;
        let order = helpers::place_order(
            &ctx,
            PlaceOrder {
                user: None,
                session_key: None,
                lines: vec![(ItemRef::Course(course), 1)],
            },
        )
        .await?;

        let service = service(&ctx, MockCartsService::new(), MockPaymentGateway::new());

        service
            .process_event(PaymentEvent::CheckoutCompleted {
                order,
                payment_reference: format!("cs_{order}"),
            })
            .await?;

        assert_eq!(
            helpers::get_order(&ctx, order).await?.status,
            OrderStatus::Completed
        );
        assert_eq!(helpers::count_enrollments(&ctx, order).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn confirm_completes_paid_session() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();
        let mut gateway = MockPaymentGateway::new();

        carts.expect_clear().once().returning(|_| Ok(()));
        gateway
            .expect_retrieve_session()
            .once()
            .returning(|reference| {
                Ok(SessionStatus {
                    reference: reference.to_string(),
                    paid: true,
                })
            });

        let status = service(&ctx, carts, gateway)
            .confirm(
                fixture.order,
                Some(Identity::new(fixture.user, Role::Customer)),
            )
            .await?;

        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn confirm_reports_pending_while_unpaid() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_retrieve_session().returning(|reference| {
            Ok(SessionStatus {
                reference: reference.to_string(),
                paid: false,
            })
        });

        let status = service(&ctx, MockCartsService::new(), gateway)
            .confirm(
                fixture.order,
                Some(Identity::new(fixture.user, Role::Customer)),
            )
            .await?;

        assert_eq!(status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn confirm_by_another_user_is_forbidden() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_retrieve_session().never();

        let service = service(&ctx, MockCartsService::new(), gateway);

        let stranger = service
            .confirm(
                fixture.order,
                Some(Identity::new(UserUuid::new(), Role::Customer)),
            )
            .await;
        let anonymous = service.confirm(fixture.order, None).await;

        assert!(matches!(stranger, Err(FulfillmentError::Forbidden)), "got {stranger:?}");
        assert!(matches!(anonymous, Err(FulfillmentError::Forbidden)), "got {anonymous:?}");

        Ok(())
    }

    #[tokio::test]
    async fn webhook_racing_confirmation_completes_once() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();
        let mut gateway = MockPaymentGateway::new();

        carts.expect_clear().once().returning(|_| Ok(()));
        gateway.expect_retrieve_session().returning(|reference| {
            Ok(SessionStatus {
                reference: reference.to_string(),
                paid: true,
            })
        });

        let service = service(&ctx, carts, gateway);
        let (payload, header) = signed("checkout.session.completed", fixture.order)?;
        let identity = Some(Identity::new(fixture.user, Role::Customer));

        let (webhook, confirmation) = tokio::join!(
            service.handle_webhook(&payload, &header),
            service.confirm(fixture.order, identity),
        );

        assert_eq!(confirmation?, OrderStatus::Completed);
        assert!(matches!(
            webhook?,
            WebhookOutcome::Processed | WebhookOutcome::AlreadyHandled
        ));
        assert_eq!(helpers::count_enrollments(&ctx, fixture.order).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn refund_request_requires_completed_order() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = course_and_event_order(&ctx).await?;
        let mut carts = MockCartsService::new();
        let mut gateway = MockPaymentGateway::new();
        let order = fixture.order;

        carts.expect_clear().returning(|_| Ok(()));
        gateway
            .expect_refund()
            .withf(move |reference, refunded| {
                reference == format!("cs_{order}") && *refunded == order
            })
            .once()
            .returning(|_, _| Ok(()));

        let service = service(&ctx, carts, gateway);

        let early = service.request_refund(order).await;

        assert!(
            matches!(early, Err(FulfillmentError::NotRefundable(OrderStatus::Pending))),
            "got {early:?}"
        );

        service
            .process_event(PaymentEvent::CheckoutCompleted {
                order,
                payment_reference: format!("cs_{order}"),
            })
            .await?;

        service.request_refund(order).await?;

        assert_eq!(
            helpers::get_order(&ctx, order).await?.status,
            OrderStatus::Completed,
            "state changes only when the refund webhook arrives"
        );

        Ok(())
    }
}
