//! Cart wire models.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    carts::records::{CartLineRecord, CartRecord},
    catalog::records::ItemType,
};

/// Kind of sellable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ItemKind {
    Course,
    Event,
    DigitalProduct,
}

impl From<ItemKind> for ItemType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Course => Self::Course,
            ItemKind::Event => Self::Event,
            ItemKind::DigitalProduct => Self::DigitalProduct,
        }
    }
}

impl From<ItemType> for ItemKind {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Course => Self::Course,
            ItemType::Event => Self::Event,
            ItemType::DigitalProduct => Self::DigitalProduct,
        }
    }
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartResponse {
    pub lines: Vec<CartLineResponse>,

    /// Sum of line subtotals in minor units
    pub subtotal: u64,

    pub tax: u64,

    pub total: u64,

    /// When the cart was last modified
    pub updated_at: Option<String>,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        Self {
            lines: cart.lines.into_iter().map(CartLineResponse::from).collect(),
            subtotal: cart.subtotal,
            tax: cart.tax,
            total: cart.total,
            updated_at: cart.updated_at.map(|at| at.to_string()),
        }
    }
}

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLineResponse {
    pub item_type: ItemKind,
    pub item_id: Uuid,
    pub title: String,

    /// Catalog price when the line was last added
    pub unit_price: u64,

    pub quantity: u32,
    pub subtotal: u64,
}

impl From<CartLineRecord> for CartLineResponse {
    fn from(line: CartLineRecord) -> Self {
        Self {
            item_type: line.item.item_type().into(),
            item_id: line.item.uuid(),
            subtotal: line.subtotal(),
            title: line.title,
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}
