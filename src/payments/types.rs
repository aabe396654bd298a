use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::models::PaymentMethod;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub appointment_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub paid_at: Option<DateTime<Utc>>,
}
