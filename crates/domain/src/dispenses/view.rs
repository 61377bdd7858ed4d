use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use cqrs_es::{Aggregate, AggregateContext, EventEnvelope, EventStore};
use derive_new::new;
use serde::Serialize;

use crate::{
    clinic::{Appointment, AppointmentStatus, Patient},
    errors::Error,
};

use super::Dispense;

/// Read model of dispenses, queryable by patient or by day and token.
#[async_trait]
pub trait DispenseViewStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Dispense>, Error>;

    async fn save(&self, dispense: &Dispense) -> Result<(), Error>;

    /// Matching dispenses in no particular order.
    async fn find(&self, filter: &DispenseFilter) -> Result<Vec<Dispense>, Error>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DispenseFilter {
    pub patient_ref: Option<String>,
    pub token: Option<(NaiveDate, u32)>,
}

impl DispenseFilter {
    /// Needs a patient, or a complete day/token pair. Both narrow together.
    pub fn new(
        patient_ref: Option<String>,
        day: Option<NaiveDate>,
        token: Option<u32>,
    ) -> Result<Self, Error> {
        let patient_ref = patient_ref.filter(|id| !id.trim().is_empty());
        let token = day.zip(token);
        if patient_ref.is_none() && token.is_none() {
            return Err(Error::validation("Provide patientId or date and token"));
        }
        Ok(Self { patient_ref, token })
    }

    pub fn matches(&self, dispense: &Dispense) -> bool {
        let patient_ok = self
            .patient_ref
            .as_ref()
            .map_or(true, |patient| &dispense.patient_ref == patient);
        let token_ok = self.token.map_or(true, |(day, token)| {
            dispense.appointment_day == Some(day) && dispense.daily_token == Some(token)
        });
        patient_ok && token_ok
    }
}

#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl From<Patient> for PatientSummary {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            phone: patient.phone,
            age: patient.age,
            gender: patient.gender,
        }
    }
}

#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct AppointmentSummary {
    pub id: String,
    pub appointment_day: NaiveDate,
    pub daily_token: u32,
    pub status: AppointmentStatus,
}

impl From<Appointment> for AppointmentSummary {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            appointment_day: appointment.appointment_day,
            daily_token: appointment.daily_token,
            status: appointment.status,
        }
    }
}

/// A dispense with the patient and appointment it refers to, for display.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct DispenseDetails {
    #[serde(flatten)]
    pub dispense: Dispense,
    pub patient: Option<PatientSummary>,
    pub appointment: Option<AppointmentSummary>,
}

/// Projects committed events into the dispense read model.
///
/// A row missing from the read model, for example after a failed save, is
/// rebuilt from the full event history.
#[derive(new)]
pub struct ViewProjector<ES> {
    views: Arc<dyn DispenseViewStore>,
    history: Arc<ES>,
}

impl<ES> ViewProjector<ES>
where
    ES: EventStore<Dispense>,
{
    async fn update(
        &self,
        dispense_id: &str,
        events: &[EventEnvelope<Dispense>],
    ) -> Result<(), Error> {
        let dispense = match self.views.load(dispense_id).await? {
            Some(mut dispense) => {
                for event in events {
                    dispense.id.clone_from(&event.aggregate_id);
                    dispense.apply(event.payload.clone());
                }
                dispense
            }
            None => self.rebuild(dispense_id).await?,
        };

        self.views.save(&dispense).await
    }

    async fn rebuild(&self, dispense_id: &str) -> Result<Dispense, Error> {
        let context = self.history.load_aggregate(dispense_id).await?;
        let mut dispense = context.aggregate().clone();
        dispense.id = dispense_id.to_string();
        Ok(dispense)
    }
}

#[async_trait]
impl<ES> cqrs_es::Query<Dispense> for ViewProjector<ES>
where
    ES: EventStore<Dispense>,
{
    async fn dispatch(&self, dispense_id: &str, events: &[EventEnvelope<Dispense>]) {
        if let Err(err) = self.update(dispense_id, events).await {
            tracing::error!(dispense_id, error = %err, "dispense view projection failed");
        }
    }
}
