//! Request shape checks that run before any dispense logic.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use domain::{
    billing::{line_item::parse_amount, LineItem},
    dispenses::inputs::{parse_optional_day, CreateDispenseInput, PayDispenseInput, UpdateDispenseInput},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, FieldError};

pub trait RequestValidation {
    /// Problems only visible in the raw body, before lenient fields are
    /// coerced during deserialization.
    fn body_problems(_body: &Value) -> Vec<FieldError> {
        Vec::new()
    }

    /// Every problem with the payload, empty when it is acceptable.
    fn problems(&self) -> Vec<FieldError>;

    fn validate(&self) -> Result<(), ApiError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(problems))
        }
    }
}

fn item_problems(items: &[LineItem], problems: &mut Vec<FieldError>) {
    if items.is_empty() {
        problems.push(FieldError::new("items", "At least one item is required"));
    }
    for (index, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            problems.push(FieldError::new(&format!("items[{index}].name"), "Name is required"));
        }
    }
}

/// Quantities and unit prices must be numbers or numeric strings.
fn raw_item_problems(items: Option<&Value>) -> Vec<FieldError> {
    let Some(Value::Array(items)) = items else {
        return Vec::new();
    };

    let mut problems = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let field = |name: &str| item.get(name).and_then(parse_amount);

        if field("quantity").is_none() {
            problems.push(FieldError::new(
                &format!("items[{index}].quantity"),
                "Quantity must be a number",
            ));
        }
        if field("unit_price").or_else(|| field("unitPrice")).is_none() {
            problems.push(FieldError::new(
                &format!("items[{index}].unit_price"),
                "Unit price must be a number",
            ));
        }
    }
    problems
}

impl RequestValidation for CreateDispenseInput {
    fn body_problems(body: &Value) -> Vec<FieldError> {
        raw_item_problems(body.get("items"))
    }

    fn problems(&self) -> Vec<FieldError> {
        let mut problems = Vec::new();
        item_problems(&self.items, &mut problems);

        if parse_optional_day(self.date.as_deref()).is_err() {
            problems.push(FieldError::new("date", "Date must be an ISO 8601 date"));
        }
        problems
    }
}

impl RequestValidation for UpdateDispenseInput {
    fn body_problems(body: &Value) -> Vec<FieldError> {
        raw_item_problems(body.get("items"))
    }

    fn problems(&self) -> Vec<FieldError> {
        let mut problems = Vec::new();
        if let Some(items) = &self.items {
            item_problems(items, &mut problems);
        }
        problems
    }
}

impl RequestValidation for PayDispenseInput {
    fn problems(&self) -> Vec<FieldError> {
        match self.amount {
            Some(_) => Vec::new(),
            None => vec![FieldError::new("amount", "Amount must be a number")],
        }
    }
}

/// JSON body that has passed [`RequestValidation`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + RequestValidation,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        let problems = T::body_problems(&body);
        if !problems.is_empty() {
            return Err(ApiError::Validation(problems));
        }

        let value: T =
            serde_json::from_value(body).map_err(|err| ApiError::BadRequest(err.to_string()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
