use std::sync::Arc;

use async_trait::async_trait;
use cqrs_es::EventEnvelope;
use derive_new::new;

use crate::clinic::{AppointmentBook, AppointmentStatus};

use super::{Dispense, Event};

/// Flags the linked appointment once its prescription has been dispensed.
/// Failures are logged only.
#[derive(new)]
pub struct AppointmentMarker {
    appointments: Arc<dyn AppointmentBook>,
}

#[async_trait]
impl cqrs_es::Query<Dispense> for AppointmentMarker {
    async fn dispatch(&self, dispense_id: &str, events: &[EventEnvelope<Dispense>]) {
        for event in events {
            let Event::DispenseCreated {
                appointment_ref: Some(appointment_id),
                ..
            } = &event.payload
            else {
                continue;
            };

            if let Err(err) = self
                .appointments
                .set_status(appointment_id, AppointmentStatus::PrescriptionDispensed)
                .await
            {
                tracing::warn!(
                    dispense_id,
                    appointment_id = %appointment_id,
                    error = %err,
                    "appointment status not updated"
                );
            }
        }
    }
}
