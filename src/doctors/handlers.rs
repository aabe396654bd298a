use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::DoctorProfileModel,
    service::DoctorService,
    types::{CreateDoctorProfileRequest, UpdateDoctorProfileRequest},
};
use crate::access::{authorize, context::RequestContext, Action, Resource};
use crate::shared::{AppError, AppState, ValidJson};

fn doctor_service(state: &AppState) -> DoctorService {
    DoctorService::new(Arc::clone(&state.repository))
}

/// GET /api/doctors
#[instrument(name = "list_doctors", skip(state, ctx))]
pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<DoctorProfileModel>>, AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::List)?;

    let profiles = doctor_service(&state).list_profiles(None).await?;
    info!(profile_count = profiles.len(), "Doctor profiles listed");

    Ok(Json(profiles))
}

/// GET /api/doctors/specialty/:id
#[instrument(name = "list_doctors_by_specialty", skip(state, ctx))]
pub async fn list_doctors_by_specialty(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(specialty_id): Path<String>,
) -> Result<Json<Vec<DoctorProfileModel>>, AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::List)?;
    let profiles = doctor_service(&state)
        .list_profiles(Some(&specialty_id))
        .await?;
    Ok(Json(profiles))
}

/// GET /api/doctors/:id
#[instrument(name = "get_doctor", skip(state, ctx))]
pub async fn get_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(profile_id): Path<String>,
) -> Result<Json<DoctorProfileModel>, AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::Read)?;
    let profile = doctor_service(&state).get_profile(&profile_id).await?;
    Ok(Json(profile))
}

/// GET /api/doctors/user/:id
#[instrument(name = "get_doctor_by_user", skip(state, ctx))]
pub async fn get_doctor_by_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> Result<Json<DoctorProfileModel>, AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::Read)?;
    let profile = doctor_service(&state).get_profile_by_user(&user_id).await?;
    Ok(Json(profile))
}

/// POST /api/doctors
#[instrument(name = "create_doctor", skip(state, ctx))]
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidJson(request): ValidJson<CreateDoctorProfileRequest>,
) -> Result<(StatusCode, Json<DoctorProfileModel>), AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::Create)?;
    let profile = doctor_service(&state).create_profile(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PATCH /api/doctors/:id
#[instrument(name = "update_doctor", skip(state, ctx))]
pub async fn update_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(profile_id): Path<String>,
    ValidJson(request): ValidJson<UpdateDoctorProfileRequest>,
) -> Result<Json<DoctorProfileModel>, AppError> {
    let access = authorize(&ctx, Resource::DoctorProfiles, Action::Update)?;
    let profile = doctor_service(&state)
        .update_profile(&access, &profile_id, request)
        .await?;
    Ok(Json(profile))
}

/// DELETE /api/doctors/:id
#[instrument(name = "delete_doctor", skip(state, ctx))]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(profile_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&ctx, Resource::DoctorProfiles, Action::Delete)?;
    doctor_service(&state).delete_profile(&profile_id).await?;
    Ok(Json(json!({ "message": "Doctor profile deleted" })))
}
