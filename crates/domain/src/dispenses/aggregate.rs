use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use cqrs_es::Aggregate;
use derive_new::new;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    billing::{BillNumber, BillSuffix, LineItem, PaymentStatus, Totals},
    errors::Error,
};

use super::{resolver::Resolver, Command, Event};

/// Dispense aggregate: one bill for one dispensing event
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Dispense {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Who the medication went to
    pub patient_ref: String,
    pub appointment_ref: Option<String>,
    pub appointment_day: Option<NaiveDate>,
    pub daily_token: Option<u32>,

    // Billing
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub paid_amount: Decimal,
    pub bill_number: Option<String>,

    pub dispensed_by: String,
}

pub const AGGREGATE_TYPE: &str = "Dispense";

#[derive(Clone, new)]
pub struct Services {
    pub resolver: Resolver,
}

#[async_trait]
impl Aggregate for Dispense {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::CreateDispense {
                id,
                identity,
                items,
                tax,
                dispensed_by,
            } => {
                self.validate_new()?;
                validate_items(&items)?;

                let resolved = services.resolver.resolve(&identity).await?;
                let totals = Totals::compute(&items, tax)?;
                let (appointment_day, daily_token) = identity.day_and_token();
                let now = Utc::now();

                Ok(vec![Event::DispenseCreated {
                    id,
                    patient_ref: resolved.patient.id,
                    appointment_ref: resolved.appointment.map(|appointment| appointment.id),
                    appointment_day,
                    daily_token,
                    items,
                    subtotal: totals.subtotal,
                    tax,
                    total: totals.total,
                    bill_number: Some(BillNumber::generate(now, BillSuffix::Random)),
                    dispensed_by,
                    created_at: now,
                }])
            }

            Command::UpdateDispense { items, tax } => {
                self.validate_existing()?;

                let items = items.unwrap_or_else(|| self.items.clone());
                validate_items(&items)?;
                let tax = tax.unwrap_or(self.tax);
                let totals = Totals::compute(&items, tax)?;

                Ok(vec![Event::ItemsUpdated {
                    id: self.id.clone(),
                    items,
                    subtotal: totals.subtotal,
                    tax,
                    total: totals.total,
                    updated_at: Utc::now(),
                }])
            }

            Command::RecordPayment { amount } => {
                self.validate_existing()?;
                if amount < Decimal::ZERO {
                    return Err(Error::validation("Payment amount cannot be negative"));
                }

                let now = Utc::now();
                let paid_amount = self
                    .paid_amount
                    .checked_add(amount)
                    .ok_or_else(|| Error::validation("Payment amount is out of range"))?;
                let payment_status = PaymentStatus::for_amounts(paid_amount, self.total);

                let mut events = vec![Event::PaymentRecorded {
                    id: self.id.clone(),
                    amount,
                    paid_amount,
                    payment_status,
                    updated_at: now,
                }];

                if self.bill_number.is_none() && payment_status != PaymentStatus::Pending {
                    events.push(Event::BillNumberAssigned {
                        id: self.id.clone(),
                        bill_number: BillNumber::generate(now, BillSuffix::FromId(&self.id)),
                        updated_at: now,
                    });
                }

                Ok(events)
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::DispenseCreated {
                id,
                patient_ref,
                appointment_ref,
                appointment_day,
                daily_token,
                items,
                subtotal,
                tax,
                total,
                bill_number,
                dispensed_by,
                created_at,
            } => {
                self.id = id;
                self.created_at = created_at;
                self.updated_at = created_at;
                self.patient_ref = patient_ref;
                self.appointment_ref = appointment_ref;
                self.appointment_day = appointment_day;
                self.daily_token = daily_token;
                self.items = items;
                self.subtotal = subtotal;
                self.tax = tax;
                self.total = total;
                self.payment_status = PaymentStatus::Pending;
                self.paid_amount = Decimal::ZERO;
                self.bill_number = bill_number;
                self.dispensed_by = dispensed_by;
            }

            Event::ItemsUpdated {
                items,
                subtotal,
                tax,
                total,
                updated_at,
                ..
            } => {
                self.items = items;
                self.subtotal = subtotal;
                self.tax = tax;
                self.total = total;
                self.updated_at = updated_at;
            }

            Event::PaymentRecorded {
                paid_amount,
                payment_status,
                updated_at,
                ..
            } => {
                self.paid_amount = paid_amount;
                self.payment_status = payment_status;
                self.updated_at = updated_at;
            }

            Event::BillNumberAssigned {
                bill_number,
                updated_at,
                ..
            } => {
                if self.bill_number.is_none() {
                    self.bill_number = Some(bill_number);
                }
                self.updated_at = updated_at;
            }
        }
    }
}

impl Dispense {
    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness {
                field: "id".to_string(),
            });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::not_found(AGGREGATE_TYPE));
        }
        Ok(())
    }
}

fn validate_items(items: &[LineItem]) -> Result<(), Error> {
    if items.is_empty() {
        return Err(Error::validation("At least one item is required"));
    }
    if items.iter().any(|item| item.name.trim().is_empty()) {
        return Err(Error::validation("Every item needs a name"));
    }
    Ok(())
}
