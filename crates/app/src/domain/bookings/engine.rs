//! Capacity-safe booking engine.
//!
//! Every operation runs inside a caller-provided transaction so seat changes
//! commit or roll back together with the order writes around them. Seat
//! accounting never reads then writes: `reserve` is a single predicate update
//! on the event's `available_spots` counter, and `cancel` returns seats only
//! when its own conditional status update matched.

use jiff::Timestamp;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::domain::{
    bookings::{
        errors::BookingError,
        records::{BookingRecord, BookingStatus, BookingUuid, MAX_ATTENDEES, NewBooking},
        repository::PgBookingsRepository,
    },
    orders::OrderUuid,
    pricing::line_subtotal,
};

#[derive(Debug, Clone, Default)]
pub struct PgBookingEngine {
    repository: PgBookingsRepository,
}

impl PgBookingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: PgBookingsRepository::new(),
        }
    }

    /// Take seats and record a `pending` booking.
    ///
    /// Fails with [`BookingError::CapacityExceeded`] when too few seats remain
    /// and [`BookingError::DuplicateBooking`] when the user already holds an
    /// active booking for the event. In both cases the caller must roll back.
    pub async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: NewBooking,
    ) -> Result<BookingRecord, BookingError> {
        if booking.attendees == 0 || booking.attendees > MAX_ATTENDEES {
            return Err(BookingError::InvalidAttendees(booking.attendees));
        }

        let Some(price) = self
            .repository
            .reserve_spots(tx, booking.event, booking.attendees)
            .await?
        else {
            if self.repository.event_is_bookable(tx, booking.event).await? {
                return Err(BookingError::CapacityExceeded);
            }

            return Err(BookingError::EventNotFound);
        };

        let total_price = line_subtotal(price, booking.attendees);

        let record = self
            .repository
            .create_booking(tx, &booking, total_price)
            .await?;

        debug!(
            booking = %record.uuid,
            event = %record.event,
            attendees = record.attendees,
            "reserved seats"
        );

        Ok(record)
    }

    /// Mark a pending booking confirmed. Seats were already taken at reservation.
    pub async fn confirm(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<BookingRecord, BookingError> {
        if let Some(record) = self.repository.confirm_booking(tx, booking).await? {
            return Ok(record);
        }

        let current = self.repository.get_booking(tx, booking).await?;

        match current.status {
            BookingStatus::Confirmed => Ok(current),
            status @ (BookingStatus::Pending
            | BookingStatus::Cancelled
            | BookingStatus::Attended) => Err(BookingError::NotActive(status)),
        }
    }

    /// Cancel an active booking and return its seats to the event.
    ///
    /// Cancelling an already-cancelled booking returns it unchanged.
    pub async fn cancel(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<BookingRecord, BookingError> {
        if let Some(record) = self.repository.cancel_booking(tx, booking).await? {
            self.repository
                .release_spots(tx, record.event, record.attendees)
                .await?;

            debug!(
                booking = %record.uuid,
                event = %record.event,
                attendees = record.attendees,
                "released seats"
            );

            return Ok(record);
        }

        let current = self.repository.get_booking(tx, booking).await?;

        match current.status {
            BookingStatus::Cancelled => Ok(current),
            status @ (BookingStatus::Pending
            | BookingStatus::Confirmed
            | BookingStatus::Attended) => Err(BookingError::NotActive(status)),
        }
    }

    pub async fn bookings_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        Ok(self.repository.get_order_bookings(tx, order).await?)
    }

    pub async fn get_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<BookingRecord, BookingError> {
        Ok(self.repository.get_booking(tx, booking).await?)
    }

    /// Cancel pending bookings older than `cutoff` whose order never completed.
    pub async fn release_stale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cutoff: Timestamp,
    ) -> Result<u64, BookingError> {
        let stale = self.repository.find_stale_bookings(tx, cutoff).await?;

        let mut released = 0;

        for booking in stale {
            self.cancel(tx, booking).await?;
            released += 1;
        }

        info!(%cutoff, released, "released stale bookings");

        Ok(released)
    }
}
