//! Order Ledger

pub mod records;
pub(crate) mod repository;

pub use records::{OrderItemRecord, OrderRecord, OrderStatus, OrderUuid};
