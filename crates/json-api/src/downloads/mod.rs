//! Digital Product Downloads

mod handlers;

pub(crate) use handlers::*;
