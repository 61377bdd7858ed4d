use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::LineItem;

/// Derived amounts of a bill. `total` is always `subtotal + tax`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Sums `quantity × unit_price` over the items and adds the tax.
    /// Used both when a dispense is created and when its items change.
    ///
    /// Fails only when an amount leaves the `Decimal` range.
    pub fn compute(items: &[LineItem], tax: Decimal) -> Result<Self, Error> {
        let subtotal = items.iter().try_fold(Decimal::ZERO, |subtotal, item| {
            item.amount().and_then(|amount| subtotal.checked_add(amount))
        });
        let subtotal = subtotal.ok_or_else(out_of_range)?;
        let total = subtotal.checked_add(tax).ok_or_else(out_of_range)?;

        Ok(Self { subtotal, total })
    }
}

pub(crate) fn out_of_range() -> Error {
    Error::validation("Bill amount is out of range")
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn for_amounts(paid_amount: Decimal, total: Decimal) -> Self {
        if paid_amount >= total {
            Self::Paid
        } else if paid_amount > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}
