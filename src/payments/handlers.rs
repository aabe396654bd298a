use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{models::PaymentModel, service::PaymentService, types::CreatePaymentRequest};
use crate::access::{authorize, context::RequestContext, Action, Resource};
use crate::shared::{AppError, AppState, ValidJson};

fn payment_service(state: &AppState) -> PaymentService {
    PaymentService::new(Arc::clone(&state.repository))
}

/// GET /api/payments
#[instrument(name = "list_payments", skip(state, ctx))]
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<PaymentModel>>, AppError> {
    authorize(&ctx, Resource::Payments, Action::List)?;

    let payments = payment_service(&state).list_payments().await?;
    info!(payment_count = payments.len(), "Payments listed");

    Ok(Json(payments))
}

/// GET /api/payments/:id
#[instrument(name = "get_payment", skip(state, ctx))]
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentModel>, AppError> {
    authorize(&ctx, Resource::Payments, Action::Read)?;
    let payment = payment_service(&state).get_payment(&payment_id).await?;
    Ok(Json(payment))
}

/// GET /api/payments/appointment/:id
#[instrument(name = "get_appointment_payment", skip(state, ctx))]
pub async fn get_appointment_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<PaymentModel>, AppError> {
    authorize(&ctx, Resource::Payments, Action::Read)?;
    let payment = payment_service(&state)
        .get_payment_by_appointment(&appointment_id)
        .await?;
    Ok(Json(payment))
}

/// POST /api/payments
#[instrument(name = "create_payment", skip(state, ctx))]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidJson(request): ValidJson<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentModel>), AppError> {
    authorize(&ctx, Resource::Payments, Action::Create)?;
    let payment = payment_service(&state).create_payment(request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
