use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Address, Order, ResolvedBook},
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    /// Accepted as a JSON number or a numeric string such as `"45.50"`.
    #[serde(deserialize_with = "number_or_numeric_string")]
    #[schema(value_type = f64)]
    pub total_price: f64,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address.city", &self.address.city),
            ("address.country", &self.address.country),
            ("address.state", &self.address.state),
            ("address.zipcode", &self.address.zipcode),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::validation(format!("{field} is required")));
        }
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(AppError::validation(
                "totalPrice must be a non-negative number",
            ));
        }
        Ok(())
    }

    /// Hex SHA-256 of the serialized submission, stored next to an idempotency key.
    pub fn fingerprint(&self) -> AppResult<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|err| AppError::Internal(anyhow::anyhow!("serialize order request: {err}")))?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number {text:?}"))),
    }
}

/// An order with its product references resolved for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub books: Vec<ResolvedBook>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderDetails>)]
    pub items: Vec<OrderDetails>,
}
