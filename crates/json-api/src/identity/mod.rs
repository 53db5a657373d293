//! Caller identity supplied by the upstream gateway.

pub(crate) mod middleware;
