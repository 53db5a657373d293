//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_to_i64, count_to_i32, try_get_amount, try_get_count},
    domain::{
        catalog::records::ItemRef,
        orders::records::{
            NewOrder, NewOrderItem, OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus,
            OrderUuid,
        },
        pricing::line_subtotal,
    },
    identity::UserUuid,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const TRANSITION_ORDER_SQL: &str = include_str!("sql/transition_order.sql");
const SET_PAYMENT_REFERENCE_SQL: &str = include_str!("sql/set_payment_reference.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const LOCK_SESSION_UNPAID_ORDER_SQL: &str = include_str!("sql/lock_session_unpaid_order.sql");
const DELETE_ORDER_ITEMS_SQL: &str = include_str!("sql/delete_order_items.sql");
const REOPEN_ORDER_SQL: &str = include_str!("sql/reopen_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        let total = order.subtotal.saturating_add(order.tax);

        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user.map(UserUuid::into_uuid))
            .bind(order.session_key.as_deref())
            .bind(&order.email)
            .bind(amount_to_i64(order.subtotal, "subtotal")?)
            .bind(amount_to_i64(order.tax, "tax")?)
            .bind(amount_to_i64(total, "total")?)
            .bind(&order.currency)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: &NewOrderItem,
    ) -> Result<OrderItemRecord, sqlx::Error> {
        let (course, event, digital_product) = match item.item {
            ItemRef::Course(uuid) => (Some(uuid.into_uuid()), None, None),
            ItemRef::Event(uuid) => (None, Some(uuid.into_uuid()), None),
            ItemRef::DigitalProduct(uuid) => (None, None, Some(uuid.into_uuid())),
        };

        let subtotal = line_subtotal(item.unit_price, item.quantity);

        query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
            .bind(OrderItemUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(course)
            .bind(event)
            .bind(digital_product)
            .bind(&item.title)
            .bind(amount_to_i64(item.unit_price, "unit_price")?)
            .bind(count_to_i32(item.quantity, "quantity")?)
            .bind(amount_to_i64(subtotal, "subtotal")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read the order and hold its row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock the newest `pending` or `payment_failed` order a cart session
    /// created, if any.
    pub(crate) async fn lock_session_unpaid_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session_key: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_SESSION_UNPAID_ORDER_SQL)
            .bind(session_key)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Replace a pending order's items with a fresh snapshot.
    ///
    /// Items are deleted and the totals, buyer and currency are rewritten from
    /// `order`; the stale payment reference is cleared. Bookings are the
    /// caller's concern.
    pub(crate) async fn reopen_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderUuid,
        order: &NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query(DELETE_ORDER_ITEMS_SQL)
            .bind(uuid.into_uuid())
            .execute(&mut **tx)
            .await?;

        let total = order.subtotal.saturating_add(order.tax);

        query_as::<Postgres, OrderRecord>(REOPEN_ORDER_SQL)
            .bind(uuid.into_uuid())
            .bind(order.user.map(UserUuid::into_uuid))
            .bind(&order.email)
            .bind(amount_to_i64(order.subtotal, "subtotal")?)
            .bind(amount_to_i64(order.tax, "tax")?)
            .bind(amount_to_i64(total, "total")?)
            .bind(&order.currency)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Move the order to `next` if its current status allows it.
    ///
    /// Returns `None` when the guard did not match (unknown order or a status
    /// that cannot move to `next`), leaving the row untouched.
    pub(crate) async fn transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let sources: Vec<&str> = next
            .allowed_sources()
            .iter()
            .copied()
            .map(OrderStatus::as_str)
            .collect();

        query_as::<Postgres, OrderRecord>(TRANSITION_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(next.as_str())
            .bind(sources)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn set_payment_reference(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        reference: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_PAYMENT_REFERENCE_SQL)
            .bind(order.into_uuid())
            .bind(reference)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user: row
                .try_get::<Option<Uuid>, _>("user_uuid")?
                .map(UserUuid::from_uuid),
            session_key: row.try_get("session_key")?,
            email: row.try_get("email")?,
            subtotal: try_get_amount(row, "subtotal")?,
            tax: try_get_amount(row, "tax")?,
            total: try_get_amount(row, "total")?,
            currency: row.try_get("currency")?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            payment_reference: row.try_get("payment_reference")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
            refunded_at: row
                .try_get::<Option<SqlxTimestamp>, _>("refunded_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let course: Option<Uuid> = row.try_get("course_uuid")?;
        let event: Option<Uuid> = row.try_get("event_uuid")?;
        let digital_product: Option<Uuid> = row.try_get("digital_product_uuid")?;

        let item = match (course, event, digital_product) {
            (Some(uuid), None, None) => ItemRef::Course(uuid.into()),
            (None, Some(uuid), None) => ItemRef::Event(uuid.into()),
            (None, None, Some(uuid)) => ItemRef::DigitalProduct(uuid.into()),
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "course_uuid".to_string(),
                    source: "order item must reference exactly one catalog item".into(),
                });
            }
        };

        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            item,
            title: row.try_get("title")?,
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_count(row, "quantity")?,
            subtotal: try_get_amount(row, "subtotal")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
