//! Inbound provider webhooks

pub(crate) mod payments;
