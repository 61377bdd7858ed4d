use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    operation::query::builders::QueryFluentBuilder, types::AttributeValue, Client,
};
use chrono::NaiveDate;
use derive_new::new;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::{config::TableNames, errors::Error};

use super::{
    Appointment, AppointmentBook, AppointmentStatus, MedicalRecord, MedicalRecords, Medicine,
    MedicineCatalog, Patient, PatientDirectory,
};

pub const APPOINTMENT_TOKEN_INDEX: &str = "appointment_day-daily_token-index";
pub const MEDICINE_NAME_INDEX: &str = "name-index";
pub const RECORD_PATIENT_INDEX: &str = "patient_ref-visit_date-index";

type Item = HashMap<String, AttributeValue>;

/// Clinic stores backed by one DynamoDB table per entity.
#[derive(Clone, new)]
pub struct DynamoClinic {
    client: Client,
    tables: TableNames,
}

impl DynamoClinic {
    async fn get<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>, Error> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(Error::storage)?;

        output.item.map(from_item::<T>).transpose()
    }

    async fn update_attribute(
        &self,
        table: &str,
        id: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), Error> {
        self.client
            .update_item()
            .table_name(table)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression("SET #attr = :value")
            .condition_expression("attribute_exists(id)")
            .expression_attribute_names("#attr", attribute)
            .expression_attribute_values(":value", value)
            .send()
            .await
            .map_err(Error::storage)?;

        Ok(())
    }

    async fn medicines_named(&self, name: &str) -> Result<Vec<Medicine>, Error> {
        let query = self
            .client
            .query()
            .table_name(&self.tables.medicines)
            .index_name(MEDICINE_NAME_INDEX)
            .key_condition_expression("#name = :name")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":name", AttributeValue::S(name.to_string()));

        query_all(query).await
    }
}

#[async_trait]
impl PatientDirectory for DynamoClinic {
    async fn find_patient(&self, id: &str) -> Result<Option<Patient>, Error> {
        self.get(&self.tables.patients, id).await
    }
}

#[async_trait]
impl AppointmentBook for DynamoClinic {
    async fn find_appointment(&self, id: &str) -> Result<Option<Appointment>, Error> {
        self.get(&self.tables.appointments, id).await
    }

    async fn find_by_token(&self, day: NaiveDate, token: u32) -> Result<Option<Appointment>, Error> {
        let output = self
            .client
            .query()
            .table_name(&self.tables.appointments)
            .index_name(APPOINTMENT_TOKEN_INDEX)
            .key_condition_expression("appointment_day = :day AND daily_token = :token")
            .expression_attribute_values(":day", AttributeValue::S(day.to_string()))
            .expression_attribute_values(":token", AttributeValue::N(token.to_string()))
            .limit(1)
            .send()
            .await
            .map_err(Error::storage)?;

        output
            .items
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(from_item)
            .transpose()
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<(), Error> {
        self.update_attribute(
            &self.tables.appointments,
            id,
            "status",
            AttributeValue::S(status.as_str().to_string()),
        )
        .await
    }
}

#[async_trait]
impl MedicineCatalog for DynamoClinic {
    async fn find_exact(&self, name: &str, strength: &str, form: &str) -> Result<Option<Medicine>, Error> {
        let medicines = self.medicines_named(name).await?;
        Ok(medicines
            .into_iter()
            .find(|medicine| medicine.matches(name, strength, form)))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Medicine>, Error> {
        Ok(self.medicines_named(name).await?.into_iter().next())
    }

    async fn set_stock(&self, id: &str, stock: Decimal) -> Result<(), Error> {
        self.update_attribute(
            &self.tables.medicines,
            id,
            "stock",
            AttributeValue::S(stock.to_string()),
        )
        .await
    }
}

#[async_trait]
impl MedicalRecords for DynamoClinic {
    async fn latest_with_prescriptions(
        &self,
        patient_id: &str,
        appointment_id: Option<&str>,
    ) -> Result<Option<MedicalRecord>, Error> {
        let query = self
            .client
            .query()
            .table_name(&self.tables.medical_records)
            .index_name(RECORD_PATIENT_INDEX)
            .key_condition_expression("patient_ref = :patient")
            .expression_attribute_values(":patient", AttributeValue::S(patient_id.to_string()))
            .scan_index_forward(false);

        let records: Vec<MedicalRecord> = query_all(query).await?;
        Ok(latest_prescribing(records, appointment_id))
    }
}

/// Picks the newest record that prescribes something, optionally for one
/// appointment only.
pub(crate) fn latest_prescribing(
    records: Vec<MedicalRecord>,
    appointment_id: Option<&str>,
) -> Option<MedicalRecord> {
    records
        .into_iter()
        .filter(|record| !record.prescriptions.is_empty())
        .filter(|record| match appointment_id {
            Some(id) => record.appointment_ref.as_deref() == Some(id),
            None => true,
        })
        .max_by_key(|record| record.visit_date)
}

/// Runs `query` to the last page.
pub(crate) async fn query_all<T: DeserializeOwned>(query: QueryFluentBuilder) -> Result<Vec<T>, Error> {
    let mut found = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let output = query
            .clone()
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(Error::storage)?;

        found.extend(from_items::<T>(output.items.unwrap_or_default())?);

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    Ok(found)
}

pub(crate) fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, Error> {
    serde_dynamo::from_item(item).map_err(Error::storage)
}

pub(crate) fn from_items<T: DeserializeOwned>(items: Vec<Item>) -> Result<Vec<T>, Error> {
    items.into_iter().map(from_item).collect()
}
