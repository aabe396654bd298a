use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::SpecialtyModel,
    service::SpecialtyService,
    types::{CreateSpecialtyRequest, UpdateSpecialtyRequest},
};
use crate::access::{authorize, context::RequestContext, Action, Resource};
use crate::shared::{AppError, AppState, ValidJson};

fn specialty_service(state: &AppState) -> SpecialtyService {
    SpecialtyService::new(Arc::clone(&state.repository))
}

/// GET /api/specialties, open to anonymous callers
#[instrument(name = "list_specialties", skip(state, ctx))]
pub async fn list_specialties(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<SpecialtyModel>>, AppError> {
    authorize(&ctx, Resource::Specialties, Action::List)?;

    let specialties = specialty_service(&state).list_specialties().await?;
    info!(specialty_count = specialties.len(), "Specialties listed");

    Ok(Json(specialties))
}

/// GET /api/specialties/:id
#[instrument(name = "get_specialty", skip(state, ctx))]
pub async fn get_specialty(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(specialty_id): Path<String>,
) -> Result<Json<SpecialtyModel>, AppError> {
    authorize(&ctx, Resource::Specialties, Action::Read)?;
    let specialty = specialty_service(&state).get_specialty(&specialty_id).await?;
    Ok(Json(specialty))
}

/// POST /api/specialties
#[instrument(name = "create_specialty", skip(state, ctx))]
pub async fn create_specialty(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidJson(request): ValidJson<CreateSpecialtyRequest>,
) -> Result<(StatusCode, Json<SpecialtyModel>), AppError> {
    authorize(&ctx, Resource::Specialties, Action::Create)?;
    let specialty = specialty_service(&state).create_specialty(request).await?;
    Ok((StatusCode::CREATED, Json(specialty)))
}

/// PATCH /api/specialties/:id
#[instrument(name = "update_specialty", skip(state, ctx))]
pub async fn update_specialty(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(specialty_id): Path<String>,
    ValidJson(request): ValidJson<UpdateSpecialtyRequest>,
) -> Result<Json<SpecialtyModel>, AppError> {
    authorize(&ctx, Resource::Specialties, Action::Update)?;
    let specialty = specialty_service(&state)
        .update_specialty(&specialty_id, request)
        .await?;
    Ok(Json(specialty))
}

/// DELETE /api/specialties/:id
#[instrument(name = "delete_specialty", skip(state, ctx))]
pub async fn delete_specialty(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(specialty_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&ctx, Resource::Specialties, Action::Delete)?;
    specialty_service(&state)
        .delete_specialty(&specialty_id)
        .await?;
    Ok(Json(json!({ "message": "Specialty deleted" })))
}
