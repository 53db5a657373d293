//! Bookings service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    database::Db,
    domain::bookings::{
        engine::PgBookingEngine,
        errors::BookingError,
        records::{BookingRecord, BookingUuid},
    },
};

#[derive(Debug, Clone)]
pub struct PgBookingsService {
    db: Db,
    engine: PgBookingEngine,
}

impl PgBookingsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            engine: PgBookingEngine::new(),
        }
    }
}

#[async_trait]
impl BookingsService for PgBookingsService {
    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, BookingError> {
        let mut tx = self.db.begin().await?;

        let record = self.engine.get_booking(&mut tx, booking).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn cancel_booking(&self, booking: BookingUuid) -> Result<BookingRecord, BookingError> {
        let mut tx = self.db.begin().await?;

        let record = self.engine.cancel(&mut tx, booking).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn release_stale(&self, cutoff: Timestamp) -> Result<u64, BookingError> {
        let mut tx = self.db.begin().await?;

        let released = self.engine.release_stale(&mut tx, cutoff).await?;

        tx.commit().await?;

        Ok(released)
    }
}

#[automock]
#[async_trait]
pub trait BookingsService: Send + Sync {
    /// Retrieve a single booking.
    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, BookingError>;

    /// Cancel a booking and return its seats.
    async fn cancel_booking(&self, booking: BookingUuid) -> Result<BookingRecord, BookingError>;

    /// Operator action: release seats held by unpaid bookings created before `cutoff`.
    async fn release_stale(&self, cutoff: Timestamp) -> Result<u64, BookingError>;
}
