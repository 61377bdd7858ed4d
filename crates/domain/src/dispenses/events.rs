use chrono::{DateTime, NaiveDate, Utc};
use cqrs_es::DomainEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::{LineItem, PaymentStatus};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    DispenseCreated {
        id: String,
        patient_ref: String,
        appointment_ref: Option<String>,
        appointment_day: Option<NaiveDate>,
        daily_token: Option<u32>,
        items: Vec<LineItem>,
        subtotal: Decimal,
        tax: Decimal,
        total: Decimal,
        bill_number: Option<String>,
        dispensed_by: String,
        created_at: DateTime<Utc>,
    },

    ItemsUpdated {
        id: String,
        items: Vec<LineItem>,
        subtotal: Decimal,
        tax: Decimal,
        total: Decimal,
        updated_at: DateTime<Utc>,
    },

    PaymentRecorded {
        id: String,
        amount: Decimal,
        paid_amount: Decimal,
        payment_status: PaymentStatus,
        updated_at: DateTime<Utc>,
    },

    BillNumberAssigned {
        id: String,
        bill_number: String,
        updated_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::DispenseCreated { .. } => "Dispense:Created".to_string(),
            Event::ItemsUpdated { .. } => "Dispense:ItemsUpdated".to_string(),
            Event::PaymentRecorded { .. } => "Dispense:PaymentRecorded".to_string(),
            Event::BillNumberAssigned { .. } => "Dispense:BillNumberAssigned".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
