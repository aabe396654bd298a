use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    AppointmentFilter, ClinicRepository, EMAIL_TAKEN, PAYMENT_EXISTS, PROFILE_EXISTS,
    SPECIALTY_IN_USE,
};
use crate::appointments::models::{AppointmentDetails, AppointmentModel};
use crate::doctors::models::DoctorProfileModel;
use crate::payments::models::PaymentModel;
use crate::shared::AppError;
use crate::specialties::models::SpecialtyModel;
use crate::users::models::{Role, UserModel};

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserModel>,
    specialties: HashMap<String, SpecialtyModel>,
    doctor_profiles: HashMap<String, DoctorProfileModel>,
    appointments: HashMap<String, AppointmentModel>,
    payments: HashMap<String, PaymentModel>,
}

impl Tables {
    fn details(&self, appointment: &AppointmentModel) -> AppointmentDetails {
        let specialty = self.specialties.get(&appointment.specialty_id);

        AppointmentDetails {
            appointment: appointment.clone(),
            patient_name: self
                .users
                .get(&appointment.patient_id)
                .map(|u| u.name.clone()),
            doctor_name: self
                .users
                .get(&appointment.doctor_id)
                .map(|u| u.name.clone()),
            specialty_name_ar: specialty.map(|s| s.name_ar.clone()),
            specialty_name_en: specialty.map(|s| s.name_en.clone()),
        }
    }

    fn remove_appointment(&mut self, appointment_id: &str) -> bool {
        let removed = self.appointments.remove(appointment_id).is_some();
        if removed {
            self.payments.retain(|_, p| p.appointment_id != appointment_id);
        }
        removed
    }
}

/// In-memory implementation of ClinicRepository for development and testing.
///
/// All five tables sit behind one lock so cascading deletes are atomic, matching
/// the referential actions of the Postgres schema. Data is lost on restart.
pub struct InMemoryClinicRepository {
    tables: RwLock<Tables>,
}

impl Default for InMemoryClinicRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClinicRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Returns the number of stored users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl ClinicRepository for InMemoryClinicRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(AppError::DatabaseError("User already exists".to_string()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            warn!("Email already registered in memory");
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }
        tables.users.insert(user.id.clone(), user.clone());

        debug!("User created in memory");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError> {
        let tables = self.tables.read().await;
        let mut users: Vec<UserModel> = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if tables
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(user_id).is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tables.doctor_profiles.retain(|_, p| p.user_id != user_id);
        let appointment_ids: Vec<String> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == user_id || a.doctor_id == user_id)
            .map(|a| a.id.clone())
            .collect();
        for appointment_id in &appointment_ids {
            tables.remove_appointment(appointment_id);
        }

        debug!(
            cascaded_appointments = appointment_ids.len(),
            "User deleted from memory"
        );
        Ok(())
    }

    async fn create_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.specialties.contains_key(&specialty.id) {
            return Err(AppError::DatabaseError(
                "Specialty already exists".to_string(),
            ));
        }
        tables
            .specialties
            .insert(specialty.id.clone(), specialty.clone());
        Ok(())
    }

    async fn get_specialty(&self, specialty_id: &str) -> Result<Option<SpecialtyModel>, AppError> {
        Ok(self.tables.read().await.specialties.get(specialty_id).cloned())
    }

    async fn list_specialties(&self) -> Result<Vec<SpecialtyModel>, AppError> {
        let tables = self.tables.read().await;
        let mut specialties: Vec<SpecialtyModel> = tables.specialties.values().cloned().collect();
        specialties.sort_by(|a, b| a.name_ar.cmp(&b.name_ar));
        Ok(specialties)
    }

    async fn update_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.specialties.get_mut(&specialty.id) {
            Some(existing) => {
                *existing = specialty.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Specialty not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_specialty(&self, specialty_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.specialties.contains_key(specialty_id) {
            return Err(AppError::NotFound("Specialty not found".to_string()));
        }
        let in_use = tables
            .doctor_profiles
            .values()
            .any(|p| p.specialty_id == specialty_id)
            || tables
                .appointments
                .values()
                .any(|a| a.specialty_id == specialty_id);
        if in_use {
            warn!("Refusing to delete referenced specialty");
            return Err(AppError::Conflict(SPECIALTY_IN_USE.to_string()));
        }
        tables.specialties.remove(specialty_id);
        Ok(())
    }

    async fn create_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.doctor_profiles.contains_key(&profile.id) {
            return Err(AppError::DatabaseError(
                "Doctor profile already exists".to_string(),
            ));
        }
        if tables
            .doctor_profiles
            .values()
            .any(|p| p.user_id == profile.user_id)
        {
            return Err(AppError::Conflict(PROFILE_EXISTS.to_string()));
        }
        tables
            .doctor_profiles
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn get_doctor_profile(
        &self,
        profile_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .doctor_profiles
            .get(profile_id)
            .cloned())
    }

    async fn get_doctor_profile_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .doctor_profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn list_doctor_profiles(
        &self,
        specialty_id: Option<&str>,
    ) -> Result<Vec<DoctorProfileModel>, AppError> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<DoctorProfileModel> = tables
            .doctor_profiles
            .values()
            .filter(|p| specialty_id.map_or(true, |id| p.specialty_id == id))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }

    async fn update_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.doctor_profiles.contains_key(&profile.id) {
            return Err(AppError::NotFound("Doctor profile not found".to_string()));
        }
        if tables
            .doctor_profiles
            .values()
            .any(|p| p.user_id == profile.user_id && p.id != profile.id)
        {
            return Err(AppError::Conflict(PROFILE_EXISTS.to_string()));
        }
        tables
            .doctor_profiles
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn delete_doctor_profile(&self, profile_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.doctor_profiles.remove(profile_id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Doctor profile not found".to_string())),
        }
    }

    #[instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.appointments.contains_key(&appointment.id) {
            return Err(AppError::DatabaseError(
                "Appointment already exists".to_string(),
            ));
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        debug!("Appointment created in memory");
        Ok(())
    }

    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .appointments
            .get(appointment_id)
            .cloned())
    }

    async fn get_appointment_details(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentDetails>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .get(appointment_id)
            .map(|a| tables.details(a)))
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetails>, AppError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<&AppointmentModel> = tables
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .collect();
        appointments.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));

        Ok(appointments.into_iter().map(|a| tables.details(a)).collect())
    }

    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Appointment not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.remove_appointment(appointment_id) {
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }
        Ok(())
    }

    async fn create_payment(&self, payment: &PaymentModel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.payments.contains_key(&payment.id) {
            return Err(AppError::DatabaseError("Payment already exists".to_string()));
        }
        if tables
            .payments
            .values()
            .any(|p| p.appointment_id == payment.appointment_id)
        {
            return Err(AppError::Conflict(PAYMENT_EXISTS.to_string()));
        }
        tables.payments.insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Option<PaymentModel>, AppError> {
        Ok(self.tables.read().await.payments.get(payment_id).cloned())
    }

    async fn get_payment_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<PaymentModel>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .find(|p| p.appointment_id == appointment_id)
            .cloned())
    }

    async fn list_payments(&self) -> Result<Vec<PaymentModel>, AppError> {
        let tables = self.tables.read().await;
        let mut payments: Vec<PaymentModel> = tables.payments.values().cloned().collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }
}
