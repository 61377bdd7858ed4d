use std::sync::Arc;

use chrono::NaiveDate;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    clinic::{Appointment, AppointmentBook, Patient, PatientDirectory},
    errors::Error,
};

/// How a new dispense names its patient.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum DispenseIdentity {
    /// The appointment holding `token` in the queue of `day`.
    ByToken { day: NaiveDate, token: u32 },
    /// A patient chosen directly.
    ByPatient { patient_id: String },
}

impl DispenseIdentity {
    /// A complete day/token pair wins over a patient id.
    pub fn from_parts(
        patient_id: Option<String>,
        day: Option<NaiveDate>,
        token: Option<u32>,
    ) -> Result<Self, Error> {
        match (day, token, patient_id) {
            (Some(day), Some(token), _) => Ok(Self::ByToken { day, token }),
            (_, _, Some(patient_id)) if !patient_id.trim().is_empty() => {
                Ok(Self::ByPatient { patient_id })
            }
            _ => Err(Error::validation("Provide patient or date and token")),
        }
    }

    pub fn day_and_token(&self) -> (Option<NaiveDate>, Option<u32>) {
        match self {
            Self::ByToken { day, token } => (Some(*day), Some(*token)),
            Self::ByPatient { .. } => (None, None),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolved {
    pub patient: Patient,
    pub appointment: Option<Appointment>,
}

#[derive(Clone, new)]
pub struct Resolver {
    patients: Arc<dyn PatientDirectory>,
    appointments: Arc<dyn AppointmentBook>,
}

impl Resolver {
    pub async fn resolve(&self, identity: &DispenseIdentity) -> Result<Resolved, Error> {
        match identity {
            DispenseIdentity::ByToken { day, token } => {
                let appointment = self
                    .appointments
                    .find_by_token(*day, *token)
                    .await?
                    .ok_or_else(|| Error::not_found("Appointment"))?;
                let patient = self.patient(&appointment.patient_ref).await?;

                Ok(Resolved {
                    patient,
                    appointment: Some(appointment),
                })
            }
            DispenseIdentity::ByPatient { patient_id } => Ok(Resolved {
                patient: self.patient(patient_id).await?,
                appointment: None,
            }),
        }
    }

    async fn patient(&self, id: &str) -> Result<Patient, Error> {
        self.patients
            .find_patient(id)
            .await?
            .ok_or_else(|| Error::not_found("Patient"))
    }
}
