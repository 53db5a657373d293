//! Test Helpers

use sqlx::query_scalar;
use testresult::TestResult;

use crate::{
    database::{amount_to_i64, count_to_i32},
    domain::{
        bookings::{
            PgBookingEngine,
            records::{BookingRecord, NewBooking},
            repository::PgBookingsRepository,
        },
        catalog::{
            CatalogService,
            records::{CourseUuid, DigitalProductUuid, EventUuid, ItemRef},
        },
        enrollments::repository::PgEnrollmentsRepository,
        orders::{
            OrderItemRecord, OrderRecord, OrderUuid,
            records::{NewOrder, NewOrderItem},
            repository::PgOrdersRepository,
        },
        pricing::line_subtotal,
    },
    identity::UserUuid,
    test::TestContext,
};

pub(crate) async fn create_course(
    ctx: &TestContext,
    title: &str,
    price: u64,
) -> Result<CourseUuid, sqlx::Error> {
    let course = CourseUuid::new();

    sqlx::query("INSERT INTO courses (uuid, title, price) VALUES ($1, $2, $3)")
        .bind(course.into_uuid())
        .bind(title)
        .bind(amount_to_i64(price, "price")?)
        .execute(ctx.db.pool())
        .await?;

    Ok(course)
}

pub(crate) async fn create_event(
    ctx: &TestContext,
    title: &str,
    price: u64,
    capacity: u32,
) -> Result<EventUuid, sqlx::Error> {
    let event = EventUuid::new();
    let capacity = count_to_i32(capacity, "capacity")?;

    sqlx::query(
        "INSERT INTO events (uuid, title, price, capacity, available_spots) \
         VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(event.into_uuid())
    .bind(title)
    .bind(amount_to_i64(price, "price")?)
    .bind(capacity)
    .execute(ctx.db.pool())
    .await?;

    Ok(event)
}

/// Creates a product whose `file_key` is `files/{slug}.pdf`.
pub(crate) async fn create_digital_product(
    ctx: &TestContext,
    title: &str,
    price: u64,
    download_limit: u32,
) -> Result<DigitalProductUuid, sqlx::Error> {
    let product = DigitalProductUuid::new();
    let slug = title.to_ascii_lowercase().replace(' ', "-");

    sqlx::query(
        "INSERT INTO digital_products (uuid, title, price, download_limit, file_key) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(product.into_uuid())
    .bind(title)
    .bind(amount_to_i64(price, "price")?)
    .bind(count_to_i32(download_limit, "download_limit")?)
    .bind(format!("files/{slug}.pdf"))
    .execute(ctx.db.pool())
    .await?;

    Ok(product)
}

pub(crate) async fn unpublish_course(
    ctx: &TestContext,
    course: CourseUuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET published = FALSE WHERE uuid = $1")
        .bind(course.into_uuid())
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

/// A bare pending order with no items.
pub(crate) async fn create_order(
    ctx: &TestContext,
    user: Option<UserUuid>,
    total: u64,
) -> Result<OrderUuid, sqlx::Error> {
    let mut tx = ctx.db.begin_test_transaction().await;

    let order = PgOrdersRepository::new()
        .create_order(
            &mut tx,
            &NewOrder {
                uuid: OrderUuid::new(),
                user,
                session_key: None,
                email: "buyer@example.test".to_string(),
                subtotal: total,
                tax: 0,
                currency: "usd".to_string(),
            },
        )
        .await?;

    tx.commit().await?;

    Ok(order.uuid)
}

/// Force an order's status, bypassing the transition guards.
pub(crate) async fn set_order_status(
    ctx: &TestContext,
    order: OrderUuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $2 WHERE uuid = $1")
        .bind(order.into_uuid())
        .bind(status)
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

/// Inputs for [`place_order`].
pub(crate) struct PlaceOrder {
    pub user: Option<UserUuid>,
    pub session_key: Option<String>,
    pub lines: Vec<(ItemRef, u32)>,
}

/// Write a pending order the way checkout does: items at catalog prices,
/// event seats reserved, and payment reference `cs_{order}`.
pub(crate) async fn place_order(ctx: &TestContext, input: PlaceOrder) -> TestResult<OrderUuid> {
    let orders = PgOrdersRepository::new();
    let engine = PgBookingEngine::new();
    let uuid = OrderUuid::new();

    let mut items = Vec::with_capacity(input.lines.len());

    for (item, quantity) in input.lines {
        let record = ctx.catalog.get_item(item).await?;

        items.push(NewOrderItem {
            item,
            title: record.title,
            unit_price: record.price,
            quantity,
        });
    }

    let subtotal = items
        .iter()
        .map(|item| line_subtotal(item.unit_price, item.quantity))
        .sum();

    let mut tx = ctx.db.begin_test_transaction().await;

    orders
        .create_order(
            &mut tx,
            &NewOrder {
                uuid,
                user: input.user,
                session_key: input.session_key,
                email: "buyer@example.test".to_string(),
                subtotal,
                tax: 0,
                currency: "usd".to_string(),
            },
        )
        .await?;

    for item in &items {
        orders.create_order_item(&mut tx, uuid, item).await?;

        if let ItemRef::Event(event) = item.item {
            engine
                .reserve(
                    &mut tx,
                    NewBooking {
                        event,
                        user: input.user.unwrap_or_default(),
                        attendees: item.quantity,
                        order: Some(uuid),
                    },
                )
                .await?;
        }
    }

    orders
        .set_payment_reference(&mut tx, uuid, &format!("cs_{uuid}"))
        .await?;

    tx.commit().await?;

    Ok(uuid)
}

pub(crate) async fn get_order(
    ctx: &TestContext,
    order: OrderUuid,
) -> Result<OrderRecord, sqlx::Error> {
    let mut tx = ctx.db.begin_test_transaction().await;

    PgOrdersRepository::new().get_order(&mut tx, order).await
}

pub(crate) async fn get_order_items(
    ctx: &TestContext,
    order: OrderUuid,
) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
    let mut tx = ctx.db.begin_test_transaction().await;

    PgOrdersRepository::new().get_order_items(&mut tx, order).await
}

pub(crate) async fn get_order_bookings(
    ctx: &TestContext,
    order: OrderUuid,
) -> Result<Vec<BookingRecord>, sqlx::Error> {
    let mut tx = ctx.db.begin_test_transaction().await;

    PgBookingsRepository::new()
        .get_order_bookings(&mut tx, order)
        .await
}

pub(crate) async fn available_spots(
    ctx: &TestContext,
    event: EventUuid,
) -> Result<i32, sqlx::Error> {
    query_scalar("SELECT available_spots FROM events WHERE uuid = $1")
        .bind(event.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn count_orders(ctx: &TestContext) -> Result<i64, sqlx::Error> {
    query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn count_enrollments(
    ctx: &TestContext,
    order: OrderUuid,
) -> Result<i64, sqlx::Error> {
    query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE order_uuid = $1")
        .bind(order.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn is_enrolled(
    ctx: &TestContext,
    user: UserUuid,
    course: CourseUuid,
) -> Result<bool, sqlx::Error> {
    let mut tx = ctx.db.begin_test_transaction().await;

    PgEnrollmentsRepository::new()
        .is_enrolled(&mut tx, user, course)
        .await
}
