//! Storefront Domain Concerns

pub mod bookings;
pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod downloads;
pub mod enrollments;
pub mod fulfillment;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod pricing;
