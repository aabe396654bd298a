use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorProfileRequest {
    pub user_id: String,
    pub specialty_id: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub experience: Option<i32>,
    pub rating: Option<Decimal>,
    pub consultation_fee: Decimal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorProfileRequest {
    pub user_id: Option<String>,
    pub specialty_id: Option<String>,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub experience: Option<i32>,
    pub rating: Option<Decimal>,
    pub consultation_fee: Option<Decimal>,
}

impl UpdateDoctorProfileRequest {
    /// True when the update touches fields only an admin may change
    pub fn touches_admin_fields(&self) -> bool {
        self.user_id.is_some() || self.specialty_id.is_some() || self.rating.is_some()
    }
}
