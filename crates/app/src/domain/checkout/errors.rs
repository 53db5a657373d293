//! Checkout errors.

use thiserror::Error;

use crate::{
    domain::{
        bookings::BookingError, carts::CartsServiceError, catalog::records::ItemRef,
        orders::OrderUuid, payments::GatewayError,
    },
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("a valid customer email is required")]
    InvalidEmail,

    #[error("cart is empty")]
    EmptyCart,

    #[error("event bookings require a signed-in user")]
    AuthenticationRequired,

    #[error("{} {} is no longer available", .0.item_type(), .0.uuid())]
    ItemUnavailable(ItemRef),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Cart(#[from] CartsServiceError),

    #[error("payment session could not be created for order {order}")]
    Gateway {
        order: OrderUuid,
        #[source]
        source: GatewayError,
    },

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

impl Classify for CheckoutError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidEmail | Self::EmptyCart => ErrorClass::Validation,
            Self::AuthenticationRequired => ErrorClass::Authentication,
            Self::ItemUnavailable(_) => ErrorClass::Conflict,
            Self::Booking(error) => error.class(),
            Self::Cart(error) => error.class(),
            Self::Gateway { .. } | Self::Sql(_) => ErrorClass::Unavailable,
        }
    }
}
