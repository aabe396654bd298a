use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{max_rating, DoctorProfileModel},
    types::{CreateDoctorProfileRequest, UpdateDoctorProfileRequest},
};
use crate::access::Access;
use crate::repository::ClinicRepository;
use crate::shared::{check_decimal_places, optional_text, validate_money, AppError};
use crate::users::models::Role;

pub struct DoctorService {
    repository: Arc<dyn ClinicRepository + Send + Sync>,
}

impl DoctorService {
    pub fn new(repository: Arc<dyn ClinicRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_profiles(
        &self,
        specialty_id: Option<&str>,
    ) -> Result<Vec<DoctorProfileModel>, AppError> {
        self.repository.list_doctor_profiles(specialty_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, profile_id: &str) -> Result<DoctorProfileModel, AppError> {
        self.repository
            .get_doctor_profile(profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor profile not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_profile_by_user(&self, user_id: &str) -> Result<DoctorProfileModel, AppError> {
        self.repository
            .get_doctor_profile_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor profile not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn create_profile(
        &self,
        request: CreateDoctorProfileRequest,
    ) -> Result<DoctorProfileModel, AppError> {
        self.ensure_doctor_user(&request.user_id).await?;
        self.ensure_specialty(&request.specialty_id).await?;
        validate_fee(request.consultation_fee)?;

        let mut profile = DoctorProfileModel::new(
            request.user_id,
            request.specialty_id,
            request.consultation_fee,
        );
        profile.description_ar = optional_text(request.description_ar);
        profile.description_en = optional_text(request.description_en);
        if let Some(experience) = request.experience {
            profile.experience = validate_experience(experience)?;
        }
        if let Some(rating) = request.rating {
            profile.rating = validate_rating(rating)?;
        }

        self.repository.create_doctor_profile(&profile).await?;
        info!(profile_id = %profile.id, user_id = %profile.user_id, "Doctor profile created");

        Ok(profile)
    }

    /// Doctors may edit the descriptive fields and fee of their own profile.
    /// Specialty, rating, and the owning user are admin-only.
    #[instrument(skip(self, access, request))]
    pub async fn update_profile(
        &self,
        access: &Access,
        profile_id: &str,
        request: UpdateDoctorProfileRequest,
    ) -> Result<DoctorProfileModel, AppError> {
        let mut profile = self.get_profile(profile_id).await?;
        access.ensure_owner(&profile.user_id)?;

        if request.touches_admin_fields() && !access.is_admin() {
            warn!(profile_id = %profile_id, "Doctor attempted to change admin-only fields");
            return Err(AppError::forbidden());
        }

        if let Some(user_id) = request.user_id {
            if user_id != profile.user_id {
                self.ensure_doctor_user(&user_id).await?;
                profile.user_id = user_id;
            }
        }
        if let Some(specialty_id) = request.specialty_id {
            self.ensure_specialty(&specialty_id).await?;
            profile.specialty_id = specialty_id;
        }
        if let Some(rating) = request.rating {
            profile.rating = validate_rating(rating)?;
        }
        if request.description_ar.is_some() {
            profile.description_ar = optional_text(request.description_ar);
        }
        if request.description_en.is_some() {
            profile.description_en = optional_text(request.description_en);
        }
        if let Some(experience) = request.experience {
            profile.experience = validate_experience(experience)?;
        }
        if let Some(fee) = request.consultation_fee {
            profile.consultation_fee = validate_fee(fee)?;
        }

        self.repository.update_doctor_profile(&profile).await?;
        info!(profile_id = %profile.id, "Doctor profile updated");

        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), AppError> {
        self.repository.delete_doctor_profile(profile_id).await?;
        info!(profile_id = %profile_id, "Doctor profile deleted");
        Ok(())
    }

    async fn ensure_doctor_user(&self, user_id: &str) -> Result<(), AppError> {
        match self.repository.get_user(user_id).await? {
            Some(user) if user.role == Role::Doctor => Ok(()),
            Some(_) => Err(AppError::Validation(
                "userId must reference a user with the doctor role".to_string(),
            )),
            None => Err(AppError::Validation("userId does not exist".to_string())),
        }
    }

    async fn ensure_specialty(&self, specialty_id: &str) -> Result<(), AppError> {
        match self.repository.get_specialty(specialty_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation("specialtyId does not exist".to_string())),
        }
    }
}

fn validate_experience(experience: i32) -> Result<i32, AppError> {
    if experience < 0 {
        return Err(AppError::Validation(
            "experience cannot be negative".to_string(),
        ));
    }
    Ok(experience)
}

fn validate_rating(rating: Decimal) -> Result<Decimal, AppError> {
    check_decimal_places("rating", rating, 2)?;
    if rating < Decimal::ZERO || rating > max_rating() {
        return Err(AppError::Validation(format!(
            "rating must be between 0 and {}",
            max_rating()
        )));
    }
    Ok(rating)
}

fn validate_fee(fee: Decimal) -> Result<Decimal, AppError> {
    validate_money("consultationFee", fee)?;
    if fee < Decimal::ZERO {
        return Err(AppError::Validation(
            "consultationFee cannot be negative".to_string(),
        ));
    }
    Ok(fee)
}
