use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One dispensed medication line on a bill.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct LineItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Decimal,
    #[serde(default, alias = "unitPrice", deserialize_with = "lenient_decimal")]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            ..Default::default()
        }
    }

    /// `quantity × unit_price`, or `None` when it overflows.
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Strength, or the empty string when unspecified.
    pub fn strength_or_empty(&self) -> &str {
        self.strength.as_deref().unwrap_or("")
    }

    /// Form, or the empty string when unspecified.
    pub fn form_or_empty(&self) -> &str {
        self.form.as_deref().unwrap_or("")
    }
}

/// Reads a decimal from a number or numeric string. Anything else
/// (null, text, booleans, objects) reads as zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount).unwrap_or(Decimal::ZERO))
}

/// A decimal from a JSON number or numeric string, `None` for anything else.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            text.parse()
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse()
                .ok()
                .or_else(|| Decimal::from_scientific(text).ok())
        }
        _ => None,
    }
}
