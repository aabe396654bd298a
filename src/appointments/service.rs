use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{AppointmentModel, AppointmentResponse, AppointmentStatus},
    types::{CreateAppointmentRequest, UpdateAppointmentRequest},
};
use crate::access::{context::AuthenticatedUser, Access};
use crate::repository::{AppointmentFilter, ClinicRepository};
use crate::shared::{optional_text, AppError};
use crate::specialties::models::Locale;
use crate::users::models::Role;

/// Service for booking and managing appointments.
///
/// Under `Access::Own` a doctor sees the appointments where they are the doctor
/// and a patient the ones where they are the patient.
pub struct AppointmentService {
    repository: Arc<dyn ClinicRepository + Send + Sync>,
}

impl AppointmentService {
    pub fn new(repository: Arc<dyn ClinicRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Lists appointments, narrowed to the caller's own when their access is scoped
    #[instrument(skip(self, access))]
    pub async fn list_appointments(
        &self,
        access: &Access,
        filter: AppointmentFilter,
        locale: Locale,
    ) -> Result<Vec<AppointmentResponse>, AppError> {
        let filter = scoped_filter(access, filter)?;
        let appointments = self.repository.list_appointments(&filter).await?;
        debug!(appointment_count = appointments.len(), "Appointments fetched");

        Ok(appointments
            .into_iter()
            .map(|details| details.into_response(locale))
            .collect())
    }

    #[instrument(skip(self, access))]
    pub async fn get_appointment(
        &self,
        access: &Access,
        appointment_id: &str,
        locale: Locale,
    ) -> Result<AppointmentResponse, AppError> {
        let details = self
            .repository
            .get_appointment_details(appointment_id)
            .await?
            .ok_or_else(not_found)?;
        ensure_party(access, &details.appointment)?;

        Ok(details.into_response(locale))
    }

    /// Books a new pending appointment. Patients can only book for themselves.
    #[instrument(skip(self, access, request))]
    pub async fn create_appointment(
        &self,
        access: &Access,
        request: CreateAppointmentRequest,
        locale: Locale,
    ) -> Result<AppointmentResponse, AppError> {
        let appointment = AppointmentModel::new(
            request.patient_id,
            request.doctor_id,
            request.specialty_id,
            request.appointment_date,
            optional_text(request.notes),
        );
        ensure_party(access, &appointment)?;
        self.validate_references(
            Some(&appointment.patient_id),
            Some(&appointment.doctor_id),
            Some(&appointment.specialty_id),
        )
        .await?;

        self.repository.create_appointment(&appointment).await?;
        info!(
            appointment_id = %appointment.id,
            patient_id = %appointment.patient_id,
            doctor_id = %appointment.doctor_id,
            "Appointment booked"
        );

        self.details(&appointment.id, locale).await
    }

    /// Applies a partial update within what the caller's role may change
    #[instrument(skip(self, access, request))]
    pub async fn update_appointment(
        &self,
        access: &Access,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
        locale: Locale,
    ) -> Result<AppointmentResponse, AppError> {
        let mut appointment = self
            .repository
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(not_found)?;
        ensure_party(access, &appointment)?;

        if !access.is_admin() {
            let actor = access.actor().ok_or_else(AppError::not_authenticated)?;
            check_update_allowed(actor, &appointment, &request)?;
        }
        self.validate_references(
            request.patient_id.as_deref(),
            request.doctor_id.as_deref(),
            request.specialty_id.as_deref(),
        )
        .await?;

        if let Some(patient_id) = request.patient_id {
            appointment.patient_id = patient_id;
        }
        if let Some(doctor_id) = request.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(specialty_id) = request.specialty_id {
            appointment.specialty_id = specialty_id;
        }
        if let Some(appointment_date) = request.appointment_date {
            appointment.appointment_date = appointment_date;
        }
        if let Some(status) = request.status {
            debug!(from = %appointment.status, to = %status, "Appointment status change");
            appointment.status = status;
        }
        if request.notes.is_some() {
            appointment.notes = optional_text(request.notes);
        }

        self.repository.update_appointment(&appointment).await?;
        info!(appointment_id = %appointment.id, status = %appointment.status, "Appointment updated");

        self.details(&appointment.id, locale).await
    }

    #[instrument(skip(self))]
    pub async fn delete_appointment(&self, appointment_id: &str) -> Result<(), AppError> {
        self.repository.delete_appointment(appointment_id).await?;
        info!(appointment_id = %appointment_id, "Appointment deleted");
        Ok(())
    }

    async fn details(
        &self,
        appointment_id: &str,
        locale: Locale,
    ) -> Result<AppointmentResponse, AppError> {
        self.repository
            .get_appointment_details(appointment_id)
            .await?
            .map(|details| details.into_response(locale))
            .ok_or_else(not_found)
    }

    /// Checks the given references: patient and doctor must exist with the
    /// matching roles, and the specialty must exist. `None` leaves a reference unchecked.
    async fn validate_references(
        &self,
        patient_id: Option<&str>,
        doctor_id: Option<&str>,
        specialty_id: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(patient_id) = patient_id {
            self.ensure_user_role("patientId", patient_id, Role::Patient)
                .await?;
        }
        if let Some(doctor_id) = doctor_id {
            self.ensure_user_role("doctorId", doctor_id, Role::Doctor)
                .await?;
        }

        if let Some(specialty_id) = specialty_id {
            if self.repository.get_specialty(specialty_id).await?.is_none() {
                return Err(AppError::Validation(
                    "specialtyId does not exist".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn ensure_user_role(&self, field: &str, user_id: &str, role: Role) -> Result<(), AppError> {
        match self.repository.get_user(user_id).await? {
            Some(user) if user.role == role => Ok(()),
            Some(_) => Err(AppError::Validation(format!(
                "{} must reference a user with the {} role",
                field, role
            ))),
            None => Err(AppError::Validation(format!("{} does not exist", field))),
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Appointment not found".to_string())
}

/// The side of an appointment a scoped caller is on
fn party_id<'a>(actor: &AuthenticatedUser, appointment: &'a AppointmentModel) -> Option<&'a str> {
    match actor.role {
        Role::Doctor => Some(&appointment.doctor_id),
        Role::Patient => Some(&appointment.patient_id),
        _ => None,
    }
}

fn ensure_party(access: &Access, appointment: &AppointmentModel) -> Result<(), AppError> {
    match access {
        Access::Own(actor) => match party_id(actor, appointment) {
            Some(owner_id) => access.ensure_owner(owner_id),
            None => Err(AppError::forbidden()),
        },
        _ => Ok(()),
    }
}

/// Narrows a listing filter to the caller's own side. Asking for somebody
/// else's side explicitly is forbidden rather than silently empty.
fn scoped_filter(
    access: &Access,
    mut filter: AppointmentFilter,
) -> Result<AppointmentFilter, AppError> {
    let Access::Own(actor) = access else {
        return Ok(filter);
    };

    let side = match actor.role {
        Role::Doctor => &mut filter.doctor_id,
        Role::Patient => &mut filter.patient_id,
        _ => return Err(AppError::forbidden()),
    };
    if side.as_deref().is_some_and(|id| id != actor.id) {
        warn!(user_id = %actor.id, "Scoped caller asked for another user's appointments");
        return Err(AppError::forbidden());
    }
    *side = Some(actor.id.clone());

    Ok(filter)
}

/// Field rules for non-admin updates: patients reschedule, edit notes, and cancel;
/// doctors move the status along the lifecycle and edit notes.
fn check_update_allowed(
    actor: &AuthenticatedUser,
    appointment: &AppointmentModel,
    request: &UpdateAppointmentRequest,
) -> Result<(), AppError> {
    if request.reassigns() {
        return Err(AppError::forbidden());
    }

    match actor.role {
        Role::Patient => {
            if request
                .status
                .is_some_and(|status| status != AppointmentStatus::Cancelled)
            {
                return Err(AppError::Forbidden(
                    "Patients can only cancel appointments".to_string(),
                ));
            }
            if request.appointment_date.is_some() && appointment.status.is_terminal() {
                return Err(AppError::Validation(format!(
                    "Cannot reschedule a {} appointment",
                    appointment.status
                )));
            }
        }
        Role::Doctor => {
            if request.appointment_date.is_some() {
                return Err(AppError::Forbidden(
                    "Doctors cannot reschedule appointments".to_string(),
                ));
            }
        }
        _ => return Err(AppError::forbidden()),
    }

    if let Some(status) = request.status {
        if !appointment.status.can_transition_to(status) {
            return Err(AppError::Validation(format!(
                "Cannot change appointment status from {} to {}",
                appointment.status, status
            )));
        }
    }
    Ok(())
}
