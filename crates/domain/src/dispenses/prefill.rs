use derive_new::new;
use rust_decimal::Decimal;

use crate::{
    billing::LineItem,
    clinic::{Clinic, PrescribedMedication},
    errors::Error,
};

/// Whose prescription to draft a bill from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PrefillTarget {
    Appointment(String),
    Patient(String),
}

impl PrefillTarget {
    /// An appointment id wins over a patient id.
    pub fn from_parts(appointment_id: Option<String>, patient_id: Option<String>) -> Result<Self, Error> {
        let present = |id: &Option<String>| id.as_deref().is_some_and(|id| !id.trim().is_empty());

        if present(&appointment_id) {
            Ok(Self::Appointment(appointment_id.unwrap_or_default()))
        } else if present(&patient_id) {
            Ok(Self::Patient(patient_id.unwrap_or_default()))
        } else {
            Err(Error::validation("Provide appointmentId or patientId"))
        }
    }
}

/// Drafts priced line items from the latest prescription.
#[derive(Clone, new)]
pub struct Prefill {
    clinic: Clinic,
}

impl Prefill {
    pub async fn draft_items(&self, target: &PrefillTarget) -> Result<Vec<LineItem>, Error> {
        let (patient_id, appointment_id) = match target {
            PrefillTarget::Appointment(id) => {
                let appointment = self
                    .clinic
                    .appointments
                    .find_appointment(id)
                    .await?
                    .ok_or_else(|| Error::not_found("Appointment"))?;
                (appointment.patient_ref, Some(appointment.id))
            }
            PrefillTarget::Patient(id) => (id.clone(), None),
        };

        let patient = self
            .clinic
            .patients
            .find_patient(&patient_id)
            .await?
            .ok_or_else(|| Error::not_found("Patient"))?;

        let Some(record) = self
            .clinic
            .records
            .latest_with_prescriptions(&patient.id, appointment_id.as_deref())
            .await?
        else {
            return Ok(Vec::new());
        };

        let mut items = Vec::with_capacity(record.prescriptions.len());
        for medication in &record.prescriptions {
            let unit_price = self.price_of(medication).await?;
            items.push(draft_item(medication, unit_price));
        }

        Ok(items)
    }

    async fn price_of(&self, medication: &PrescribedMedication) -> Result<Decimal, Error> {
        let medicine = self
            .clinic
            .catalog
            .find_exact(
                &medication.name,
                medication.strength.as_deref().unwrap_or(""),
                medication.form.as_deref().unwrap_or(""),
            )
            .await?;

        Ok(medicine.map_or(Decimal::ZERO, |medicine| medicine.selling_price))
    }
}

fn draft_item(medication: &PrescribedMedication, unit_price: Decimal) -> LineItem {
    LineItem {
        name: medication.name.clone(),
        strength: medication.strength.clone(),
        form: medication.form.clone(),
        duration: medication.duration.clone(),
        notes: Some(notes_for(medication)),
        quantity: Decimal::ONE,
        unit_price,
    }
}

/// Strength, dosage, frequency and duration joined by single spaces.
/// Each segment is trimmed first and blank ones are dropped, so the notes
/// carry no doubled or edge whitespace.
pub fn notes_for(medication: &PrescribedMedication) -> String {
    [
        &medication.strength,
        &medication.dosage,
        &medication.frequency,
        &medication.duration,
    ]
    .into_iter()
    .filter_map(|segment| segment.as_deref().map(str::trim))
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
