//! Cart Records

use std::{fmt, time::Duration};

use jiff::Timestamp;
use rand::{Rng as _, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    catalog::records::ItemRef,
    pricing::{TaxPolicy, line_subtotal},
};

/// Maximum quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

const SESSION_KEY_MAX_LEN: usize = 128;
const GENERATED_SESSION_KEY_LEN: usize = 32;

/// Opaque cart session identifier, usually carried in a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

#[derive(Debug, Error)]
#[error("invalid cart session key")]
pub struct InvalidSessionKey;

impl SessionKey {
    /// Validate an externally supplied session key.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSessionKey`] for empty, oversized or non `[A-Za-z0-9_-]` keys.
    pub fn parse(value: &str) -> Result<Self, InvalidSessionKey> {
        let valid = !value.is_empty()
            && value.len() <= SESSION_KEY_MAX_LEN
            && value
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');

        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidSessionKey)
        }
    }

    /// Generate a fresh random session key.
    #[must_use]
    pub fn generate() -> Self {
        let key = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_SESSION_KEY_LEN)
            .map(char::from)
            .collect();

        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cart store settings.
#[derive(Debug, Clone, Copy)]
pub struct CartsConfig {
    /// Sliding inactivity window; every mutation restarts it.
    pub ttl: Duration,
    pub tax: TaxPolicy,
}

/// Cart Line Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineRecord {
    pub item: ItemRef,
    pub title: String,
    pub unit_price: u64,
    pub quantity: u32,
}

impl CartLineRecord {
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        line_subtotal(self.unit_price, self.quantity)
    }
}

/// Cart Record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartRecord {
    pub lines: Vec<CartLineRecord>,
    pub subtotal: u64,
    pub tax: u64,
    pub total: u64,
    pub updated_at: Option<Timestamp>,
}

impl CartRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn line(&self, item: ItemRef) -> Option<&CartLineRecord> {
        self.lines.iter().find(|line| line.item == item)
    }

    /// Merge `quantity` of `item` into the cart, keeping one line per item.
    ///
    /// Quantities above [`MAX_LINE_QUANTITY`] are clamped, not rejected. The
    /// line's title and unit price are refreshed to the latest catalog values.
    pub fn merge_line(&mut self, item: ItemRef, title: String, unit_price: u64, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.item == item) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            line.title = title;
            line.unit_price = unit_price;

            return;
        }

        self.lines.push(CartLineRecord {
            item,
            title,
            unit_price,
            quantity: quantity.min(MAX_LINE_QUANTITY),
        });
    }

    /// Remove the line for `item`, returning whether one existed.
    pub fn remove_line(&mut self, item: ItemRef) -> bool {
        let before = self.lines.len();

        self.lines.retain(|line| line.item != item);

        self.lines.len() != before
    }

    /// Recompute subtotal, tax and total from the current lines.
    pub fn recompute(&mut self, tax: TaxPolicy) {
        self.subtotal = self
            .lines
            .iter()
            .map(CartLineRecord::subtotal)
            .fold(0_u64, u64::saturating_add);
        self.tax = tax.tax_on(self.subtotal);
        self.total = self.subtotal.saturating_add(self.tax);
    }
}
