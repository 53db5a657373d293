//! Carts

mod handlers;
mod models;
mod session;

pub(crate) use handlers::*;
pub(crate) use models::ItemKind;
pub(crate) use session::{CART_SESSION_COOKIE, session_key};
