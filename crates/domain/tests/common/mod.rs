#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use cqrs_es::{mem_store::MemStore, EventStore};
use rust_decimal::Decimal;

use domain::{
    clinic::{
        Appointment, AppointmentBook, AppointmentStatus, Clinic, MedicalRecord, MedicalRecords,
        Medicine, MedicineCatalog, Patient, PatientDirectory, PrescribedMedication,
    },
    dispenses::{Dispensary, Dispense, DispenseFilter, DispenseViewStore},
    Error,
};

pub fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Clinic tables held in memory.
#[derive(Default)]
pub struct MemoryClinic {
    patients: Mutex<HashMap<String, Patient>>,
    appointments: Mutex<HashMap<String, Appointment>>,
    medicines: Mutex<Vec<Medicine>>,
    records: Mutex<Vec<MedicalRecord>>,
}

impl MemoryClinic {
    pub fn with_patient(self, id: &str, name: &str) -> Self {
        self.patients.lock().unwrap().insert(
            id.to_string(),
            Patient {
                id: id.to_string(),
                name: name.to_string(),
                phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_appointment(self, id: &str, patient: &str, day: NaiveDate, token: u32) -> Self {
        self.appointments.lock().unwrap().insert(
            id.to_string(),
            Appointment {
                id: id.to_string(),
                patient_ref: patient.to_string(),
                appointment_day: day,
                daily_token: token,
                status: AppointmentStatus::CheckedIn,
            },
        );
        self
    }

    pub fn with_medicine(
        self,
        id: &str,
        name: &str,
        strength: Option<&str>,
        form: Option<&str>,
        price: Decimal,
        stock: Decimal,
    ) -> Self {
        self.medicines.lock().unwrap().push(Medicine {
            id: id.to_string(),
            name: name.to_string(),
            strength: strength.map(str::to_string),
            form: form.map(str::to_string),
            selling_price: price,
            stock,
        });
        self
    }

    pub fn with_record(
        self,
        id: &str,
        patient: &str,
        appointment: Option<&str>,
        visit_day: u32,
        prescriptions: Vec<PrescribedMedication>,
    ) -> Self {
        self.records.lock().unwrap().push(MedicalRecord {
            id: id.to_string(),
            patient_ref: patient.to_string(),
            appointment_ref: appointment.map(str::to_string),
            visit_date: Utc.with_ymd_and_hms(2024, 3, visit_day, 10, 0, 0).unwrap(),
            prescriptions,
        });
        self
    }

    pub fn stock_of(&self, id: &str) -> Decimal {
        self.medicines
            .lock()
            .unwrap()
            .iter()
            .find(|medicine| medicine.id == id)
            .map(|medicine| medicine.stock)
            .unwrap()
    }

    pub fn appointment_status(&self, id: &str) -> AppointmentStatus {
        self.appointments.lock().unwrap()[id].status
    }
}

#[async_trait]
impl PatientDirectory for MemoryClinic {
    async fn find_patient(&self, id: &str) -> Result<Option<Patient>, Error> {
        Ok(self.patients.lock().unwrap().get(id).cloned())
    }
}

#[async_trait]
impl AppointmentBook for MemoryClinic {
    async fn find_appointment(&self, id: &str) -> Result<Option<Appointment>, Error> {
        Ok(self.appointments.lock().unwrap().get(id).cloned())
    }

    async fn find_by_token(&self, day: NaiveDate, token: u32) -> Result<Option<Appointment>, Error> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .values()
            .find(|appointment| appointment.appointment_day == day && appointment.daily_token == token)
            .cloned())
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<(), Error> {
        match self.appointments.lock().unwrap().get_mut(id) {
            Some(appointment) => {
                appointment.status = status;
                Ok(())
            }
            None => Err(Error::not_found("Appointment")),
        }
    }
}

#[async_trait]
impl MedicineCatalog for MemoryClinic {
    async fn find_exact(&self, name: &str, strength: &str, form: &str) -> Result<Option<Medicine>, Error> {
        Ok(self
            .medicines
            .lock()
            .unwrap()
            .iter()
            .find(|medicine| medicine.matches(name, strength, form))
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Medicine>, Error> {
        Ok(self
            .medicines
            .lock()
            .unwrap()
            .iter()
            .find(|medicine| medicine.name == name)
            .cloned())
    }

    async fn set_stock(&self, id: &str, stock: Decimal) -> Result<(), Error> {
        let mut medicines = self.medicines.lock().unwrap();
        let medicine = medicines
            .iter_mut()
            .find(|medicine| medicine.id == id)
            .ok_or_else(|| Error::not_found("Medicine"))?;
        medicine.stock = stock;
        Ok(())
    }
}

#[async_trait]
impl MedicalRecords for MemoryClinic {
    async fn latest_with_prescriptions(
        &self,
        patient_id: &str,
        appointment_id: Option<&str>,
    ) -> Result<Option<MedicalRecord>, Error> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.patient_ref == patient_id && !record.prescriptions.is_empty())
            .filter(|record| appointment_id.map_or(true, |id| record.appointment_ref.as_deref() == Some(id)))
            .max_by_key(|record| record.visit_date)
            .cloned())
    }
}

/// A catalog whose every call fails, as when its table is unreachable.
pub struct UnreachableCatalog;

#[async_trait]
impl MedicineCatalog for UnreachableCatalog {
    async fn find_exact(&self, _: &str, _: &str, _: &str) -> Result<Option<Medicine>, Error> {
        Err(Error::storage("catalog unreachable"))
    }

    async fn find_by_name(&self, _: &str) -> Result<Option<Medicine>, Error> {
        Err(Error::storage("catalog unreachable"))
    }

    async fn set_stock(&self, _: &str, _: Decimal) -> Result<(), Error> {
        Err(Error::storage("catalog unreachable"))
    }
}

#[derive(Default)]
pub struct MemoryViews {
    dispenses: Mutex<HashMap<String, Dispense>>,
    failing_saves: AtomicUsize,
}

#[async_trait]
impl DispenseViewStore for MemoryViews {
    async fn load(&self, id: &str) -> Result<Option<Dispense>, Error> {
        Ok(self.dispenses.lock().unwrap().get(id).cloned())
    }

    async fn save(&self, dispense: &Dispense) -> Result<(), Error> {
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::storage("view table unavailable"));
        }

        self.dispenses
            .lock()
            .unwrap()
            .insert(dispense.id.clone(), dispense.clone());
        Ok(())
    }

    async fn find(&self, filter: &DispenseFilter) -> Result<Vec<Dispense>, Error> {
        Ok(self
            .dispenses
            .lock()
            .unwrap()
            .values()
            .filter(|dispense| filter.matches(dispense))
            .cloned()
            .collect())
    }
}

impl MemoryViews {
    /// The next `saves` saves fail.
    pub fn failing(saves: usize) -> Self {
        Self {
            failing_saves: AtomicUsize::new(saves),
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.dispenses.lock().unwrap().len()
    }

    pub fn stored(&self, id: &str) -> Option<Dispense> {
        self.dispenses.lock().unwrap().get(id).cloned()
    }
}

/// Appointments that can be read but never updated.
pub struct ReadOnlyAppointments(pub Arc<MemoryClinic>);

#[async_trait]
impl AppointmentBook for ReadOnlyAppointments {
    async fn find_appointment(&self, id: &str) -> Result<Option<Appointment>, Error> {
        self.0.find_appointment(id).await
    }

    async fn find_by_token(&self, day: NaiveDate, token: u32) -> Result<Option<Appointment>, Error> {
        self.0.find_by_token(day, token).await
    }

    async fn set_status(&self, _: &str, _: AppointmentStatus) -> Result<(), Error> {
        Err(Error::storage("appointments table is read-only"))
    }
}

pub fn clinic_of(memory: &Arc<MemoryClinic>) -> Clinic {
    Clinic::new(memory.clone(), memory.clone(), memory.clone(), memory.clone())
}

pub struct Harness {
    pub clinic: Arc<MemoryClinic>,
    pub views: Arc<MemoryViews>,
    pub store: MemStore<Dispense>,
    pub dispensary: Dispensary<MemStore<Dispense>>,
}

impl Harness {
    pub fn new(clinic: MemoryClinic) -> Self {
        let clinic = Arc::new(clinic);
        Self::with_clinic(clinic.clone(), clinic_of(&clinic))
    }

    /// Lets a test swap individual stores, e.g. for a failing catalog.
    pub fn with_clinic(memory: Arc<MemoryClinic>, clinic: Clinic) -> Self {
        Self::assemble(memory, clinic, MemoryViews::default())
    }

    pub fn with_views(clinic: MemoryClinic, views: MemoryViews) -> Self {
        let clinic = Arc::new(clinic);
        Self::assemble(clinic.clone(), clinic_of(&clinic), views)
    }

    fn assemble(memory: Arc<MemoryClinic>, clinic: Clinic, views: MemoryViews) -> Self {
        let views = Arc::new(views);
        let store = MemStore::<Dispense>::default();
        let dispensary = Dispensary::new(store.clone(), store.clone(), views.clone(), clinic);

        Self {
            clinic: memory,
            views,
            store,
            dispensary,
        }
    }

    /// Events committed for one dispense.
    pub async fn event_count(&self, id: &str) -> usize {
        self.store.load_events(id).await.unwrap().len()
    }
}
