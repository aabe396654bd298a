use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use crate::specialties::models::Locale;

/// Appointment lifecycle state, stored as the `appointment_status` Postgres enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Whether moving from `self` to `next` follows the lifecycle.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Confirmed | Completed | Cancelled) | (Confirmed, Completed | Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

/// Database model for the appointments table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentModel {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub specialty_id: String,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AppointmentModel {
    /// New appointments always start out pending
    pub fn new(
        patient_id: String,
        doctor_id: String,
        specialty_id: String,
        appointment_date: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            specialty_id,
            appointment_date,
            status: AppointmentStatus::Pending,
            notes,
            created_at: Utc::now(),
        }
    }
}

/// Appointment joined with the display names of the people and specialty it references
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentDetails {
    #[sqlx(flatten)]
    pub appointment: AppointmentModel,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub specialty_name_ar: Option<String>,
    pub specialty_name_en: Option<String>,
}

impl AppointmentDetails {
    pub fn into_response(self, locale: Locale) -> AppointmentResponse {
        let specialty_name = match (&self.specialty_name_ar, &self.specialty_name_en) {
            (Some(ar), Some(en)) => Some(locale.pick(ar, en).to_string()),
            _ => None,
        };

        AppointmentResponse {
            appointment: self.appointment,
            patient_name: self.patient_name,
            doctor_name: self.doctor_name,
            specialty_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: AppointmentModel,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub specialty_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));

        assert!(Cancelled.can_transition_to(Cancelled));
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_new_appointment_is_pending() {
        let appointment = AppointmentModel::new(
            "patient".to_string(),
            "doctor".to_string(),
            "specialty".to_string(),
            Utc::now(),
            None,
        );
        assert_eq!(appointment.status, Pending);
    }

    #[test]
    fn test_details_pick_localized_specialty_name() {
        let details = AppointmentDetails {
            appointment: AppointmentModel::new(
                "p".to_string(),
                "d".to_string(),
                "s".to_string(),
                Utc::now(),
                None,
            ),
            patient_name: Some("Ahmed".to_string()),
            doctor_name: Some("Dr. Fatima".to_string()),
            specialty_name_ar: Some("الأعصاب".to_string()),
            specialty_name_en: Some("Neurology".to_string()),
        };

        let response = details.clone().into_response(Locale::En);
        assert_eq!(response.specialty_name.as_deref(), Some("Neurology"));

        let json = serde_json::to_value(details.into_response(Locale::Ar)).unwrap();
        assert_eq!(json["specialtyName"], "الأعصاب");
        assert_eq!(json["doctorName"], "Dr. Fatima");
        assert_eq!(json["status"], "pending");
        assert!(json.get("patientId").is_some());
    }
}
