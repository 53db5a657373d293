//! Bookings Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{amount_to_i64, count_to_i32, try_get_amount, try_get_count},
    domain::{
        bookings::records::{BookingRecord, BookingUuid, NewBooking},
        catalog::records::EventUuid,
        orders::OrderUuid,
    },
    identity::UserUuid,
};

const RESERVE_SPOTS_SQL: &str = include_str!("sql/reserve_spots.sql");
const RELEASE_SPOTS_SQL: &str = include_str!("sql/release_spots.sql");
const EVENT_IS_BOOKABLE_SQL: &str = include_str!("sql/event_is_bookable.sql");
const CREATE_BOOKING_SQL: &str = include_str!("sql/create_booking.sql");
const GET_BOOKING_SQL: &str = include_str!("sql/get_booking.sql");
const CONFIRM_BOOKING_SQL: &str = include_str!("sql/confirm_booking.sql");
const CANCEL_BOOKING_SQL: &str = include_str!("sql/cancel_booking.sql");
const GET_ORDER_BOOKINGS_SQL: &str = include_str!("sql/get_order_bookings.sql");
const FIND_STALE_BOOKINGS_SQL: &str = include_str!("sql/find_stale_bookings.sql");
const FIND_STALE_ORPHAN_BOOKINGS_SQL: &str = include_str!("sql/find_stale_orphan_bookings.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBookingsRepository;

impl PgBookingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Atomically take `attendees` seats, returning the event's unit price.
    ///
    /// `None` means the predicate failed: missing, unpublished, or full.
    pub(crate) async fn reserve_spots(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: EventUuid,
        attendees: u32,
    ) -> Result<Option<u64>, sqlx::Error> {
        let row = query(RESERVE_SPOTS_SQL)
            .bind(event.into_uuid())
            .bind(count_to_i32(attendees, "attendees")?)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|row| try_get_amount(&row, "price")).transpose()
    }

    pub(crate) async fn release_spots(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: EventUuid,
        attendees: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_SPOTS_SQL)
            .bind(event.into_uuid())
            .bind(count_to_i32(attendees, "attendees")?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn event_is_bookable(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: EventUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(EVENT_IS_BOOKABLE_SQL)
            .bind(event.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &NewBooking,
        total_price: u64,
    ) -> Result<BookingRecord, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(CREATE_BOOKING_SQL)
            .bind(BookingUuid::new().into_uuid())
            .bind(booking.user.into_uuid())
            .bind(booking.event.into_uuid())
            .bind(booking.order.map(OrderUuid::into_uuid))
            .bind(count_to_i32(booking.attendees, "attendees")?)
            .bind(amount_to_i64(total_price, "total_price")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<BookingRecord, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(GET_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn confirm_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(CONFIRM_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn cancel_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(CANCEL_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(GET_ORDER_BOOKINGS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Lock pending bookings created before `cutoff` whose order never paid.
    ///
    /// Order-backed bookings lock their order row too, and rows another
    /// transaction holds are skipped, so an in-flight completion wins.
    pub(crate) async fn find_stale_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cutoff: Timestamp,
    ) -> Result<Vec<BookingUuid>, sqlx::Error> {
        let mut uuids = query_scalar::<Postgres, Uuid>(FIND_STALE_BOOKINGS_SQL)
            .bind(SqlxTimestamp::from(cutoff))
            .fetch_all(&mut **tx)
            .await?;

        uuids.extend(
            query_scalar::<Postgres, Uuid>(FIND_STALE_ORPHAN_BOOKINGS_SQL)
                .bind(SqlxTimestamp::from(cutoff))
                .fetch_all(&mut **tx)
                .await?,
        );

        Ok(uuids.into_iter().map(BookingUuid::from_uuid).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for BookingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            uuid: BookingUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            event: EventUuid::from_uuid(row.try_get("event_uuid")?),
            order: row
                .try_get::<Option<Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            attendees: try_get_count(row, "attendees")?,
            total_price: try_get_amount(row, "total_price")?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
