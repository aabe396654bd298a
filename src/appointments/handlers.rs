use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::AppointmentResponse,
    service::AppointmentService,
    types::{CreateAppointmentRequest, UpdateAppointmentRequest},
};
use crate::access::{authorize, context::RequestContext, Action, Resource};
use crate::repository::AppointmentFilter;
use crate::shared::{AppError, AppState, ValidJson};
use crate::specialties::models::Locale;

fn appointment_service(state: &AppState) -> AppointmentService {
    AppointmentService::new(Arc::clone(&state.repository))
}

/// GET /api/appointments
///
/// Admins and accountants see everything; doctors and patients their own.
#[instrument(name = "list_appointments", skip_all)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::List)?;

    let appointments = appointment_service(&state)
        .list_appointments(
            &access,
            AppointmentFilter::default(),
            Locale::from_headers(&headers),
        )
        .await?;
    info!(appointment_count = appointments.len(), "Appointments listed");

    Ok(Json(appointments))
}

/// GET /api/appointments/doctor/:id
#[instrument(name = "list_doctor_appointments", skip(state, ctx, headers))]
pub async fn list_doctor_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(doctor_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::List)?;
    let appointments = appointment_service(&state)
        .list_appointments(
            &access,
            AppointmentFilter::for_doctor(doctor_id),
            Locale::from_headers(&headers),
        )
        .await?;
    Ok(Json(appointments))
}

/// GET /api/appointments/patient/:id
#[instrument(name = "list_patient_appointments", skip(state, ctx, headers))]
pub async fn list_patient_appointments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::List)?;
    let appointments = appointment_service(&state)
        .list_appointments(
            &access,
            AppointmentFilter::for_patient(patient_id),
            Locale::from_headers(&headers),
        )
        .await?;
    Ok(Json(appointments))
}

/// GET /api/appointments/:id
#[instrument(name = "get_appointment", skip(state, ctx, headers))]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AppointmentResponse>, AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::Read)?;
    let appointment = appointment_service(&state)
        .get_appointment(&access, &appointment_id, Locale::from_headers(&headers))
        .await?;
    Ok(Json(appointment))
}

/// POST /api/appointments
#[instrument(name = "create_appointment", skip(state, ctx, headers))]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
    ValidJson(request): ValidJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::Create)?;
    let appointment = appointment_service(&state)
        .create_appointment(&access, request, Locale::from_headers(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// PATCH /api/appointments/:id
#[instrument(name = "update_appointment", skip(state, ctx, headers))]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<String>,
    headers: HeaderMap,
    ValidJson(request): ValidJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let access = authorize(&ctx, Resource::Appointments, Action::Update)?;
    let appointment = appointment_service(&state)
        .update_appointment(
            &access,
            &appointment_id,
            request,
            Locale::from_headers(&headers),
        )
        .await?;
    Ok(Json(appointment))
}

/// DELETE /api/appointments/:id
#[instrument(name = "delete_appointment", skip(state, ctx))]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&ctx, Resource::Appointments, Action::Delete)?;
    appointment_service(&state)
        .delete_appointment(&appointment_id)
        .await?;
    Ok(Json(json!({ "message": "Appointment deleted" })))
}
