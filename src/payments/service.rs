use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{models::PaymentModel, types::CreatePaymentRequest};
use crate::repository::ClinicRepository;
use crate::shared::{validate_money, AppError};

pub struct PaymentService {
    repository: Arc<dyn ClinicRepository + Send + Sync>,
}

impl PaymentService {
    pub fn new(repository: Arc<dyn ClinicRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_payments(&self) -> Result<Vec<PaymentModel>, AppError> {
        self.repository.list_payments().await
    }

    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentModel, AppError> {
        self.repository
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_payment_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<PaymentModel, AppError> {
        self.repository
            .get_payment_by_appointment(appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }

    /// Records the payment of an appointment; each appointment is paid once
    #[instrument(skip(self, request), fields(appointment_id = %request.appointment_id))]
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentModel, AppError> {
        validate_money("amount", request.amount)?;
        if request.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if self
            .repository
            .get_appointment(&request.appointment_id)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(
                "appointmentId does not exist".to_string(),
            ));
        }

        let payment = PaymentModel::new(
            request.appointment_id,
            request.amount,
            request.payment_method,
            request.paid_at,
        );
        self.repository.create_payment(&payment).await?;
        info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            method = %payment.payment_method,
            "Payment recorded"
        );

        Ok(payment)
    }
}
