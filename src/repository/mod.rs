use async_trait::async_trait;

use crate::appointments::models::{AppointmentDetails, AppointmentModel};
use crate::doctors::models::DoctorProfileModel;
use crate::payments::models::PaymentModel;
use crate::shared::AppError;
use crate::specialties::models::SpecialtyModel;
use crate::users::models::{Role, UserModel};

mod memory;
mod postgres;

pub use memory::InMemoryClinicRepository;
pub use postgres::PostgresClinicRepository;

/// Narrows an appointment listing to one patient and/or one doctor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

impl AppointmentFilter {
    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            doctor_id: None,
        }
    }

    pub fn for_doctor(doctor_id: impl Into<String>) -> Self {
        Self {
            patient_id: None,
            doctor_id: Some(doctor_id.into()),
        }
    }

    pub fn matches(&self, appointment: &AppointmentModel) -> bool {
        self.patient_id
            .as_ref()
            .map_or(true, |id| *id == appointment.patient_id)
            && self
                .doctor_id
                .as_ref()
                .map_or(true, |id| *id == appointment.doctor_id)
    }
}

/// Persistence operations over the five clinic entities.
///
/// Updates take the full model and fail with `NotFound` when the row is gone.
/// Deletes fail with `NotFound` when nothing was removed, so repeating a delete
/// gives the same answer every time.
#[async_trait]
pub trait ClinicRepository {
    // Users, newest first
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    /// Also removes the user's doctor profile, every appointment they take part in,
    /// and the payments of those appointments
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;

    // Specialties, ordered by Arabic name
    async fn create_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError>;
    async fn get_specialty(&self, specialty_id: &str) -> Result<Option<SpecialtyModel>, AppError>;
    async fn list_specialties(&self) -> Result<Vec<SpecialtyModel>, AppError>;
    async fn update_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError>;
    /// Fails with `Conflict` while doctor profiles or appointments reference it
    async fn delete_specialty(&self, specialty_id: &str) -> Result<(), AppError>;

    // Doctor profiles
    async fn create_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError>;
    async fn get_doctor_profile(
        &self,
        profile_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError>;
    async fn get_doctor_profile_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError>;
    async fn list_doctor_profiles(
        &self,
        specialty_id: Option<&str>,
    ) -> Result<Vec<DoctorProfileModel>, AppError>;
    async fn update_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError>;
    async fn delete_doctor_profile(&self, profile_id: &str) -> Result<(), AppError>;

    // Appointments, latest appointment date first
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError>;
    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError>;
    async fn get_appointment_details(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentDetails>, AppError>;
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetails>, AppError>;
    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError>;
    /// Also removes the appointment's payment
    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), AppError>;

    // Payments, latest first
    async fn create_payment(&self, payment: &PaymentModel) -> Result<(), AppError>;
    async fn get_payment(&self, payment_id: &str) -> Result<Option<PaymentModel>, AppError>;
    async fn get_payment_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<PaymentModel>, AppError>;
    async fn list_payments(&self) -> Result<Vec<PaymentModel>, AppError>;
}

pub(crate) const EMAIL_TAKEN: &str = "Email already registered";
pub(crate) const PROFILE_EXISTS: &str = "Doctor profile already exists for this user";
pub(crate) const PAYMENT_EXISTS: &str = "Payment already recorded for this appointment";
pub(crate) const SPECIALTY_IN_USE: &str = "Specialty is in use by doctors or appointments";
