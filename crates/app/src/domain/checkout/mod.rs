//! Checkout

pub mod errors;
pub mod records;
pub mod service;

pub use errors::CheckoutError;
pub use service::*;
