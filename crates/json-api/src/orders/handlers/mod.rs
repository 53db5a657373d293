//! Order Handlers

pub(crate) mod refund;
