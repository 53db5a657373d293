//! Booking engine errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::bookings::records::{BookingStatus, MAX_ATTENDEES},
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("attendees must be between 1 and {MAX_ATTENDEES}, got {0}")]
    InvalidAttendees(u32),

    #[error("event not found")]
    EventNotFound,

    #[error("not enough seats available")]
    CapacityExceeded,

    #[error("user already holds an active booking for this event")]
    DuplicateBooking,

    #[error("booking not found")]
    NotFound,

    #[error("booking is {0}")]
    NotActive(BookingStatus),

    #[error("related resource not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for BookingError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::DuplicateBooking,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::CapacityExceeded,
            Some(ErrorKind::NotNullViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl Classify for BookingError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidAttendees(_) | Self::InvalidReference => ErrorClass::Validation,
            Self::EventNotFound | Self::NotFound => ErrorClass::NotFound,
            Self::CapacityExceeded | Self::DuplicateBooking | Self::NotActive(_) => {
                ErrorClass::Conflict
            }
            Self::Sql(_) => ErrorClass::Unavailable,
        }
    }
}
