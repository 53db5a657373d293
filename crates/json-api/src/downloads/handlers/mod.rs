//! Download Handlers

pub(crate) mod authorize;
pub(crate) mod get;
