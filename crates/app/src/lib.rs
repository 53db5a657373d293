//! Storefront fulfillment core.
//!
//! Carts live in Redis; orders, bookings, enrollments and download logs live
//! in `PostgreSQL`. The payment provider is reached over HTTP and reports
//! back through signed webhooks. Transports (the JSON API and the operator
//! CLI) talk to the services through [`context::AppContext`].

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod secrets;
pub mod uuids;

#[cfg(test)]
mod test;
