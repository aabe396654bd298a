use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::models::AppointmentStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub specialty_id: String,
    pub appointment_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub specialty_id: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl UpdateAppointmentRequest {
    /// True when the update moves the appointment to other people or another specialty
    pub fn reassigns(&self) -> bool {
        self.patient_id.is_some() || self.doctor_id.is_some() || self.specialty_id.is_some()
    }
}
