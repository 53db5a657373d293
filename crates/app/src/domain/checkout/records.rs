//! Checkout Records

use crate::{
    domain::{
        bookings::records::BookingUuid, carts::records::SessionKey, catalog::records::EventUuid,
        orders::OrderUuid, pricing::TaxPolicy,
    },
    identity::UserUuid,
};

/// Placeholder replaced with the order id in success and cancel URLs.
pub const ORDER_ID_PLACEHOLDER: &str = "{ORDER_ID}";

const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub currency: String,
    pub tax: TaxPolicy,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutConfig {
    pub(crate) fn success_url(&self, requested: Option<&str>, order: OrderUuid) -> String {
        requested
            .unwrap_or(&self.success_url)
            .replace(ORDER_ID_PLACEHOLDER, &order.to_string())
    }

    pub(crate) fn cancel_url(&self, requested: Option<&str>, order: OrderUuid) -> String {
        requested
            .unwrap_or(&self.cancel_url)
            .replace(ORDER_ID_PLACEHOLDER, &order.to_string())
    }
}

/// Cart checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub session: SessionKey,
    pub email: String,
    pub user: Option<UserUuid>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// A pending order with its hosted payment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCreated {
    pub order: OrderUuid,
    pub payment_reference: String,
    pub session_url: String,
}

/// Direct single-event booking request; bypasses the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBookingRequest {
    pub user: UserUuid,
    pub event: EventUuid,
    pub attendees: u32,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBookingCreated {
    pub booking: BookingUuid,
    pub order: OrderUuid,
    pub total_price: u64,
    pub payment_reference: String,
    pub session_url: String,
}

/// Basic shape check: `local@domain.tld`, no whitespace, at most 254 bytes.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > EMAIL_MAX_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}
