//! Document totals, always derived from the line items.

use rust_decimal::Decimal;
use serde::Serialize;

/// Scale of the stored monetary columns
pub const MONEY_SCALE: u32 = 2;

/// `quantity * unit_price`, exact
pub fn line_amount(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl DocumentTotals {
    /// Sums the item amounts and applies `tax_percentage` when positive.
    ///
    /// Tax is rounded to the storage scale (banker's rounding), so
    /// `total == subtotal + tax_amount` holds for the persisted values too.
    pub fn compute<I>(amounts: I, tax_percentage: Decimal) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal: Decimal = amounts.into_iter().sum();
        let tax_amount = if tax_percentage > Decimal::ZERO {
            (subtotal * tax_percentage / Decimal::ONE_HUNDRED).round_dp(MONEY_SCALE)
        } else {
            Decimal::ZERO
        };

        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}
