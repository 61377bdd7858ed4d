use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{billing::LineItem, errors::Error};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateDispenseInput {
    #[serde(default)]
    pub patient: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub token: Option<u32>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub tax: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateDispenseInput {
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
    #[serde(default)]
    pub tax: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PayDispenseInput {
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDispensesParams {
    #[serde(default, alias = "patient_id")]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub token: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillParams {
    #[serde(default, alias = "appointment_id")]
    pub appointment_id: Option<String>,
    #[serde(default, alias = "patient_id")]
    pub patient_id: Option<String>,
}

/// Calendar day of an ISO date or date-time; the time of day is dropped.
pub fn parse_day(raw: &str) -> Result<NaiveDate, Error> {
    let raw = raw.trim();

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.date_naive());
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(at.date());
    }

    Err(Error::validation(format!("Invalid date: {raw}")))
}

/// Parses an optional, possibly blank, date field.
pub fn parse_optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_day(raw).map(Some),
    }
}
