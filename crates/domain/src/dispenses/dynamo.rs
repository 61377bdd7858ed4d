use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use chrono::NaiveDate;
use derive_new::new;

use crate::{
    clinic::dynamo::{from_item, query_all},
    errors::Error,
};

use super::{
    view::{DispenseFilter, DispenseViewStore},
    Dispense,
};

pub const PATIENT_INDEX: &str = "patient_ref-created_at-index";
pub const TOKEN_INDEX: &str = "token_key-created_at-index";

/// Sparse index attribute joining appointment day and daily token.
const TOKEN_KEY: &str = "token_key";

/// Dispense read model in a DynamoDB table keyed by `id`.
#[derive(Clone, new)]
pub struct DynamoDispenseViews {
    client: Client,
    table: String,
}

pub fn token_key(day: NaiveDate, token: u32) -> String {
    format!("{day}#{token}")
}

impl DynamoDispenseViews {
    async fn query_index(
        &self,
        index: &str,
        attribute: &str,
        value: String,
    ) -> Result<Vec<Dispense>, Error> {
        let query = self
            .client
            .query()
            .table_name(&self.table)
            .index_name(index)
            .key_condition_expression("#key = :value")
            .expression_attribute_names("#key", attribute)
            .expression_attribute_values(":value", AttributeValue::S(value))
            .scan_index_forward(false);

        query_all(query).await
    }
}

#[async_trait]
impl DispenseViewStore for DynamoDispenseViews {
    async fn load(&self, id: &str) -> Result<Option<Dispense>, Error> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(Error::storage)?;

        output.item.map(from_item::<Dispense>).transpose()
    }

    async fn save(&self, dispense: &Dispense) -> Result<(), Error> {
        let mut item: HashMap<String, AttributeValue> =
            serde_dynamo::to_item(dispense).map_err(Error::storage)?;

        if let (Some(day), Some(token)) = (dispense.appointment_day, dispense.daily_token) {
            item.insert(TOKEN_KEY.to_string(), AttributeValue::S(token_key(day, token)));
        }

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(Error::storage)?;

        Ok(())
    }

    async fn find(&self, filter: &DispenseFilter) -> Result<Vec<Dispense>, Error> {
        match (&filter.token, &filter.patient_ref) {
            (Some((day, token)), _) => {
                self.query_index(TOKEN_INDEX, TOKEN_KEY, token_key(*day, *token))
                    .await
            }
            (None, Some(patient_ref)) => {
                self.query_index(PATIENT_INDEX, "patient_ref", patient_ref.clone())
                    .await
            }
            (None, None) => Ok(Vec::new()),
        }
    }
}
