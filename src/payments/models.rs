use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

/// Database model for payments; at most one per appointment
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentModel {
    pub id: String,
    pub appointment_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PaymentModel {
    pub fn new(
        appointment_id: String,
        amount: Decimal,
        payment_method: PaymentMethod,
        paid_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            appointment_id,
            amount,
            payment_method,
            paid_at: paid_at.unwrap_or(now),
            created_at: now,
        }
    }
}
