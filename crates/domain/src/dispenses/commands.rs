use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::resolver::DispenseIdentity;
use crate::billing::LineItem;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Open a bill for a patient, identified directly or by daily token
    CreateDispense {
        id: String,
        identity: DispenseIdentity,
        items: Vec<LineItem>,
        tax: Decimal,
        dispensed_by: String,
    },

    /// Replace items and/or tax; omitted fields keep their stored values
    UpdateDispense {
        items: Option<Vec<LineItem>>,
        tax: Option<Decimal>,
    },

    /// Add a payment towards the bill
    RecordPayment {
        amount: Decimal,
    },
}
