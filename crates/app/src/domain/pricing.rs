//! Tax policy shared by carts and checkout.

/// Basis points in one whole.
const BPS_DENOMINATOR: u128 = 10_000;

/// Flat-rate tax policy expressed in basis points (`1_000` = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxPolicy {
    rate_bps: u32,
}

impl TaxPolicy {
    #[must_use]
    pub const fn new(rate_bps: u32) -> Self {
        Self { rate_bps }
    }

    #[must_use]
    pub const fn rate_bps(self) -> u32 {
        self.rate_bps
    }

    /// Tax owed on `subtotal` minor units, rounded half up.
    #[must_use]
    pub fn tax_on(self, subtotal: u64) -> u64 {
        let scaled = u128::from(subtotal) * u128::from(self.rate_bps);
        let rounded = (scaled + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR;

        u64::try_from(rounded).unwrap_or(u64::MAX)
    }
}

/// Line subtotal, saturating rather than wrapping on absurd inputs.
#[must_use]
pub fn line_subtotal(unit_price: u64, quantity: u32) -> u64 {
    unit_price.saturating_mul(u64::from(quantity))
}
