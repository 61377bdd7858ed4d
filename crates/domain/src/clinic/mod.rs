//! Clinic records the dispensary reads and writes: patients, appointments,
//! the pharmacy medicine catalog and medical records.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_new::new;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// DynamoDB-backed stores
pub mod dynamo;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Booked,
    CheckedIn,
    Completed,
    PrescriptionDispensed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::PrescriptionDispensed => "prescription_dispensed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_ref: String,
    pub appointment_day: NaiveDate,
    pub daily_token: u32,
    #[serde(default)]
    pub status: AppointmentStatus,
}

/// A catalog entry with its selling price and stock on hand.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    pub selling_price: Decimal,
    pub stock: Decimal,
}

impl Medicine {
    /// Catalog entries store "no strength" as absent or empty alike.
    pub fn matches(&self, name: &str, strength: &str, form: &str) -> bool {
        self.name == name
            && self.strength.as_deref().unwrap_or("") == strength
            && self.form.as_deref().unwrap_or("") == form
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescribedMedication {
    pub name: String,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct MedicalRecord {
    pub id: String,
    pub patient_ref: String,
    #[serde(default)]
    pub appointment_ref: Option<String>,
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub prescriptions: Vec<PrescribedMedication>,
}

#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn find_patient(&self, id: &str) -> Result<Option<Patient>, Error>;
}

#[async_trait]
pub trait AppointmentBook: Send + Sync {
    async fn find_appointment(&self, id: &str) -> Result<Option<Appointment>, Error>;

    /// The appointment holding `token` on `day`, if any.
    async fn find_by_token(&self, day: NaiveDate, token: u32) -> Result<Option<Appointment>, Error>;

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<(), Error>;
}

#[async_trait]
pub trait MedicineCatalog: Send + Sync {
    /// Exact match on name, strength and form. Empty strings match absent values.
    async fn find_exact(&self, name: &str, strength: &str, form: &str) -> Result<Option<Medicine>, Error>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Medicine>, Error>;

    async fn set_stock(&self, id: &str, stock: Decimal) -> Result<(), Error>;
}

#[async_trait]
pub trait MedicalRecords: Send + Sync {
    /// Most recent record (by visit date) for the patient that prescribes at
    /// least one medication, optionally restricted to one appointment.
    async fn latest_with_prescriptions(
        &self,
        patient_id: &str,
        appointment_id: Option<&str>,
    ) -> Result<Option<MedicalRecord>, Error>;
}

/// The clinic stores a dispensary depends on.
#[derive(Clone, new)]
pub struct Clinic {
    pub patients: Arc<dyn PatientDirectory>,
    pub appointments: Arc<dyn AppointmentBook>,
    pub catalog: Arc<dyn MedicineCatalog>,
    pub records: Arc<dyn MedicalRecords>,
}
