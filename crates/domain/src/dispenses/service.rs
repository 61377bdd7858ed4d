use std::{collections::HashMap, sync::Arc};

use cqrs_es::{AggregateContext, CqrsFramework, EventStore};
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::{billing::LineItem, clinic::Clinic, errors::Error};

use super::{
    cqrs,
    inputs::{parse_optional_day, CreateDispenseInput, PayDispenseInput, UpdateDispenseInput},
    prefill::{Prefill, PrefillTarget},
    resolver::DispenseIdentity,
    view::{DispenseDetails, DispenseFilter, DispenseViewStore},
    Command, Dispense,
};

/// Dispensing and billing operations over an event store of dispenses.
///
/// Single dispenses are read from the event store; lists come from the read
/// model.
pub struct Dispensary<ES>
where
    ES: EventStore<Dispense> + 'static,
{
    cqrs: CqrsFramework<Dispense, ES>,
    history: Arc<ES>,
    views: Arc<dyn DispenseViewStore>,
    clinic: Clinic,
    prefill: Prefill,
}

impl<ES> Dispensary<ES>
where
    ES: EventStore<Dispense> + 'static,
{
    /// `store` takes the commands; `history` reads the same events back.
    pub fn new(
        store: ES,
        history: ES,
        views: Arc<dyn DispenseViewStore>,
        clinic: Clinic,
    ) -> Self {
        let history = Arc::new(history);
        Self {
            cqrs: cqrs::framework(store, history.clone(), views.clone(), clinic.clone()),
            prefill: Prefill::new(clinic.clone()),
            history,
            views,
            clinic,
        }
    }

    /// Newest first.
    pub async fn list(&self, filter: &DispenseFilter) -> Result<Vec<DispenseDetails>, Error> {
        let mut dispenses = self.views.find(filter).await?;
        dispenses.retain(|dispense| filter.matches(dispense));
        dispenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut details = Vec::with_capacity(dispenses.len());
        for dispense in dispenses {
            details.push(self.details(dispense).await?);
        }
        Ok(details)
    }

    pub async fn get(&self, id: &str) -> Result<DispenseDetails, Error> {
        let dispense = self.load(id).await?;
        self.details(dispense).await
    }

    pub async fn create(
        &self,
        input: CreateDispenseInput,
        dispensed_by: &str,
    ) -> Result<Dispense, Error> {
        let day = parse_optional_day(input.date.as_deref())?;
        let identity = DispenseIdentity::from_parts(input.patient, day, input.token)?;
        let id = Ulid::new().to_string();

        let command = Command::CreateDispense {
            id: id.clone(),
            identity,
            items: input.items,
            tax: input.tax.unwrap_or(Decimal::ZERO),
            dispensed_by: dispensed_by.to_string(),
        };
        self.execute(&id, command).await?;

        let dispense = self.reload(&id).await?;
        tracing::info!(
            dispense_id = %dispense.id,
            patient_ref = %dispense.patient_ref,
            total = %dispense.total,
            "dispense created"
        );
        Ok(dispense)
    }

    pub async fn update(&self, id: &str, input: UpdateDispenseInput) -> Result<Dispense, Error> {
        let command = Command::UpdateDispense {
            items: input.items,
            tax: input.tax,
        };
        self.execute(id, command).await?;
        self.reload(id).await
    }

    pub async fn pay(&self, id: &str, input: PayDispenseInput) -> Result<Dispense, Error> {
        let amount = input
            .amount
            .ok_or_else(|| Error::validation("amount is required"))?;

        self.execute(id, Command::RecordPayment { amount }).await?;

        let dispense = self.reload(id).await?;
        tracing::info!(
            dispense_id = %dispense.id,
            amount = %amount,
            paid_amount = %dispense.paid_amount,
            payment_status = dispense.payment_status.as_str(),
            "payment recorded"
        );
        Ok(dispense)
    }

    pub async fn prefill(&self, target: &PrefillTarget) -> Result<Vec<LineItem>, Error> {
        self.prefill.draft_items(target).await
    }

    async fn execute(&self, id: &str, command: Command) -> Result<(), Error> {
        let mut metadata = HashMap::new();
        metadata.insert("command_id".to_string(), Ulid::new().to_string());

        self.cqrs
            .execute_with_metadata(id, command, metadata)
            .await
            .map_err(Error::from)
    }

    async fn load(&self, id: &str) -> Result<Dispense, Error> {
        let context = self.history.load_aggregate(id).await?;
        let dispense = context.aggregate();
        if dispense.id.is_empty() {
            return Err(Error::not_found(super::AGGREGATE_TYPE));
        }
        Ok(dispense.clone())
    }

    /// Reads back a dispense a command has just committed.
    async fn reload(&self, id: &str) -> Result<Dispense, Error> {
        self.load(id).await.map_err(|err| match err {
            Error::NotFound { .. } => Error::storage(format!("dispense {id} missing after commit")),
            err => err,
        })
    }

    async fn details(&self, dispense: Dispense) -> Result<DispenseDetails, Error> {
        let patient = self.clinic.patients.find_patient(&dispense.patient_ref).await?;
        let appointment = match &dispense.appointment_ref {
            Some(id) => self.clinic.appointments.find_appointment(id).await?,
            None => None,
        };

        Ok(DispenseDetails {
            dispense,
            patient: patient.map(Into::into),
            appointment: appointment.map(Into::into),
        })
    }
}
