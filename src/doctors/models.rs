use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for doctor_profiles, one row per doctor-role user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfileModel {
    pub id: String,
    pub user_id: String,
    pub specialty_id: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub experience: i32, // years
    pub rating: Decimal,
    pub consultation_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl DoctorProfileModel {
    pub fn new(user_id: String, specialty_id: String, consultation_fee: Decimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            specialty_id,
            description_ar: None,
            description_en: None,
            experience: 0,
            rating: Decimal::ZERO,
            consultation_fee,
            created_at: Utc::now(),
        }
    }
}

/// Upper bound of the rating scale
pub fn max_rating() -> Decimal {
    Decimal::from(5)
}
