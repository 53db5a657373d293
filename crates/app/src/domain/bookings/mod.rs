//! Bookings

pub mod engine;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use engine::PgBookingEngine;
pub use errors::BookingError;
pub use service::*;
