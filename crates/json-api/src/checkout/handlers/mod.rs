//! Checkout Handlers

pub(crate) mod confirm;
pub(crate) mod create;
