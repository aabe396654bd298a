use async_trait::async_trait;
use sqlx::PgPool;
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

const USER_COLUMNS: &str = "id, email, password_hash, name, role, phone, avatar, created_at";
const SPECIALTY_COLUMNS: &str =
    "id, name_ar, name_en, description_ar, description_en, icon, created_at";
const PROFILE_COLUMNS: &str = "id, user_id, specialty_id, description_ar, description_en, \
     experience, rating, consultation_fee, created_at";
const PAYMENT_COLUMNS: &str = "id, appointment_id, amount, payment_method, paid_at, created_at";

const APPOINTMENT_DETAILS_SELECT: &str = "SELECT a.id, a.patient_id, a.doctor_id, \
     a.specialty_id, a.appointment_date, a.status, a.notes, a.created_at, \
     p.name AS patient_name, d.name AS doctor_name, \
     s.name_ar AS specialty_name_ar, s.name_en AS specialty_name_en \
     FROM appointments a \
     LEFT JOIN users p ON p.id = a.patient_id \
     LEFT JOIN users d ON d.id = a.doctor_id \
     LEFT JOIN specialties s ON s.id = a.specialty_id";

/// Converts a sqlx error, turning constraint violations into client errors
fn map_db_error(error: sqlx::Error, conflict_message: &str) -> AppError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_unique_violation() {
            return AppError::Conflict(conflict_message.to_string());
        }
        if db_error.is_foreign_key_violation() {
            return AppError::Validation("Referenced record does not exist".to_string());
        }
    }
    warn!(error = %error, "Database operation failed");
    AppError::DatabaseError(error.to_string())
}

fn query_error(error: sqlx::Error) -> AppError {
    warn!(error = %error, "Database query failed");
    AppError::DatabaseError(error.to_string())
}

fn ensure_affected(rows_affected: u64, what: &str) -> Result<(), AppError> {
    if rows_affected == 0 {
        debug!(entity = what, "No rows affected");
        return Err(AppError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

/// PostgreSQL implementation of the clinic repository.
///
/// Cascades are enforced by the schema in `migrations/` (ON DELETE CASCADE on
/// profiles, appointments, payments and sessions).
pub struct PostgresClinicRepository {
    pool: PgPool,
}

impl PostgresClinicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl ClinicRepository for PostgresClinicRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, phone, avatar, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

        debug!("User created in database");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {} FROM users WHERE ($1::user_role IS NULL OR role = $1) \
             ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, name = $4, role = $5, \
             phone = $6, avatar = $7 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

        ensure_affected(result.rows_affected(), "User")
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        ensure_affected(result.rows_affected(), "User")
    }

    async fn create_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO specialties \
             (id, name_ar, name_en, description_ar, description_en, icon, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&specialty.id)
        .bind(&specialty.name_ar)
        .bind(&specialty.name_en)
        .bind(&specialty.description_ar)
        .bind(&specialty.description_en)
        .bind(&specialty.icon)
        .bind(specialty.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Specialty already exists"))?;
        Ok(())
    }

    async fn get_specialty(&self, specialty_id: &str) -> Result<Option<SpecialtyModel>, AppError> {
        sqlx::query_as::<_, SpecialtyModel>(&format!(
            "SELECT {} FROM specialties WHERE id = $1",
            SPECIALTY_COLUMNS
        ))
        .bind(specialty_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list_specialties(&self) -> Result<Vec<SpecialtyModel>, AppError> {
        sqlx::query_as::<_, SpecialtyModel>(&format!(
            "SELECT {} FROM specialties ORDER BY name_ar",
            SPECIALTY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn update_specialty(&self, specialty: &SpecialtyModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE specialties SET name_ar = $2, name_en = $3, description_ar = $4, \
             description_en = $5, icon = $6 WHERE id = $1",
        )
        .bind(&specialty.id)
        .bind(&specialty.name_ar)
        .bind(&specialty.name_en)
        .bind(&specialty.description_ar)
        .bind(&specialty.description_en)
        .bind(&specialty.icon)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        ensure_affected(result.rows_affected(), "Specialty")
    }

    #[instrument(skip(self))]
    async fn delete_specialty(&self, specialty_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM specialties WHERE id = $1")
            .bind(specialty_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_error) if db_error.is_foreign_key_violation() => {
                    AppError::Conflict(SPECIALTY_IN_USE.to_string())
                }
                _ => query_error(e),
            })?;

        ensure_affected(result.rows_affected(), "Specialty")
    }

    async fn create_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO doctor_profiles (id, user_id, specialty_id, description_ar, \
             description_en, experience, rating, consultation_fee, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.specialty_id)
        .bind(&profile.description_ar)
        .bind(&profile.description_en)
        .bind(profile.experience)
        .bind(profile.rating)
        .bind(profile.consultation_fee)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, PROFILE_EXISTS))?;
        Ok(())
    }

    async fn get_doctor_profile(
        &self,
        profile_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError> {
        sqlx::query_as::<_, DoctorProfileModel>(&format!(
            "SELECT {} FROM doctor_profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn get_doctor_profile_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<DoctorProfileModel>, AppError> {
        sqlx::query_as::<_, DoctorProfileModel>(&format!(
            "SELECT {} FROM doctor_profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list_doctor_profiles(
        &self,
        specialty_id: Option<&str>,
    ) -> Result<Vec<DoctorProfileModel>, AppError> {
        sqlx::query_as::<_, DoctorProfileModel>(&format!(
            "SELECT {} FROM doctor_profiles WHERE ($1::varchar IS NULL OR specialty_id = $1) \
             ORDER BY created_at",
            PROFILE_COLUMNS
        ))
        .bind(specialty_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn update_doctor_profile(&self, profile: &DoctorProfileModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE doctor_profiles SET user_id = $2, specialty_id = $3, description_ar = $4, \
             description_en = $5, experience = $6, rating = $7, consultation_fee = $8 \
             WHERE id = $1",
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.specialty_id)
        .bind(&profile.description_ar)
        .bind(&profile.description_en)
        .bind(profile.experience)
        .bind(profile.rating)
        .bind(profile.consultation_fee)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, PROFILE_EXISTS))?;

        ensure_affected(result.rows_affected(), "Doctor profile")
    }

    async fn delete_doctor_profile(&self, profile_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM doctor_profiles WHERE id = $1")
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        ensure_affected(result.rows_affected(), "Doctor profile")
    }

    #[instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO appointments (id, patient_id, doctor_id, specialty_id, \
             appointment_date, status, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&appointment.id)
        .bind(&appointment.patient_id)
        .bind(&appointment.doctor_id)
        .bind(&appointment.specialty_id)
        .bind(appointment.appointment_date)
        .bind(appointment.status)
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Appointment already exists"))?;

        debug!("Appointment created in database");
        Ok(())
    }

    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        sqlx::query_as::<_, AppointmentModel>(
            "SELECT id, patient_id, doctor_id, specialty_id, appointment_date, status, notes, \
             created_at FROM appointments WHERE id = $1",
        )
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn get_appointment_details(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentDetails>, AppError> {
        sqlx::query_as::<_, AppointmentDetails>(&format!(
            "{} WHERE a.id = $1",
            APPOINTMENT_DETAILS_SELECT
        ))
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetails>, AppError> {
        sqlx::query_as::<_, AppointmentDetails>(&format!(
            "{} WHERE ($1::varchar IS NULL OR a.patient_id = $1) \
             AND ($2::varchar IS NULL OR a.doctor_id = $2) \
             ORDER BY a.appointment_date DESC",
            APPOINTMENT_DETAILS_SELECT
        ))
        .bind(filter.patient_id.as_deref())
        .bind(filter.doctor_id.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE appointments SET patient_id = $2, doctor_id = $3, specialty_id = $4, \
             appointment_date = $5, status = $6, notes = $7 WHERE id = $1",
        )
        .bind(&appointment.id)
        .bind(&appointment.patient_id)
        .bind(&appointment.doctor_id)
        .bind(&appointment.specialty_id)
        .bind(appointment.appointment_date)
        .bind(appointment.status)
        .bind(&appointment.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Appointment already exists"))?;

        ensure_affected(result.rows_affected(), "Appointment")
    }

    #[instrument(skip(self))]
    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        ensure_affected(result.rows_affected(), "Appointment")
    }

    async fn create_payment(&self, payment: &PaymentModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payments (id, appointment_id, amount, payment_method, paid_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&payment.id)
        .bind(&payment.appointment_id)
        .bind(payment.amount)
        .bind(payment.payment_method)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, PAYMENT_EXISTS))?;
        Ok(())
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Option<PaymentModel>, AppError> {
        sqlx::query_as::<_, PaymentModel>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn get_payment_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<PaymentModel>, AppError> {
        sqlx::query_as::<_, PaymentModel>(&format!(
            "SELECT {} FROM payments WHERE appointment_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentModel>, AppError> {
        sqlx::query_as::<_, PaymentModel>(&format!(
            "SELECT {} FROM payments ORDER BY paid_at DESC",
            PAYMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }
}
