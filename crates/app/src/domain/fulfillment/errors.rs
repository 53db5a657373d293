//! Fulfillment errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    domain::{
        bookings::BookingError,
        orders::OrderStatus,
        payments::{EventDecodeError, GatewayError, SignatureError},
    },
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    #[error("order not found")]
    OrderNotFound,

    #[error("order belongs to another user")]
    Forbidden,

    #[error("order is {0} and cannot be refunded")]
    NotRefundable(OrderStatus),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for FulfillmentError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::OrderNotFound;
        }

        Self::Sql(error)
    }
}

impl Classify for FulfillmentError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Signature(error) => error.class(),
            Self::Decode(error) => error.class(),
            Self::OrderNotFound => ErrorClass::NotFound,
            Self::Forbidden => ErrorClass::Authorization,
            Self::NotRefundable(_) => ErrorClass::Conflict,
            Self::Booking(error) => error.class(),
            Self::Gateway(error) => error.class(),
            Self::Sql(_) => ErrorClass::Unavailable,
        }
    }
}
