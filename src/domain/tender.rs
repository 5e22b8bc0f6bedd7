//! Tender financials, recomputed from the current expenses and payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Collection state of a tender. Persisted on the tender row as a cache of
/// the payment totals.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
pub enum PaymentStatus {
    #[strum(serialize = "Pending")]
    #[serde(rename = "Pending")]
    Pending,
    #[strum(serialize = "Partially Paid")]
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[strum(serialize = "Paid")]
    #[serde(rename = "Paid")]
    Paid,
}

impl PaymentStatus {
    /// `Pending` until something is paid, `Paid` once the value is covered
    pub fn derive(total_paid: Decimal, total_value: Decimal) -> Self {
        if total_paid <= Decimal::ZERO {
            PaymentStatus::Pending
        } else if total_paid < total_value {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Paid
        }
    }

    /// Key used in summary status counts
    pub fn summary_key(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::PartiallyPaid => "Partially_Paid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenderFinancials {
    pub total_value: Decimal,
    pub total_expenses: Decimal,
    pub total_paid: Decimal,
    /// May go negative when overpaid
    pub balance: Decimal,
    /// Negative means a loss
    pub profit: Decimal,
    pub expense_overrun: Decimal,
    pub payment_status: PaymentStatus,
}

impl TenderFinancials {
    pub fn compute<E, P>(total_value: Decimal, expenses: E, payments: P) -> Self
    where
        E: IntoIterator<Item = Decimal>,
        P: IntoIterator<Item = Decimal>,
    {
        let total_expenses: Decimal = expenses.into_iter().sum();
        let total_paid: Decimal = payments.into_iter().sum();

        Self {
            total_value,
            total_expenses,
            total_paid,
            balance: total_value - total_paid,
            profit: total_value - total_expenses,
            expense_overrun: expense_overrun(total_value, total_expenses),
            payment_status: PaymentStatus::derive(total_paid, total_value),
        }
    }

    /// Profit as a percentage of the contract value
    pub fn profit_margin(&self) -> Option<Decimal> {
        if self.total_value.is_zero() {
            return None;
        }
        Some((self.profit / self.total_value * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

/// `max(0, expenses - value)`
pub fn expense_overrun(total_value: Decimal, total_expenses: Decimal) -> Decimal {
    (total_expenses - total_value).max(Decimal::ZERO)
}

/// Calendar days from start to end, when both are known
pub fn duration_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
    match (start, end) {
        (Some(start), Some(end)) => Some((end - start).num_days()),
        _ => None,
    }
}
