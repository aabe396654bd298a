use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::SpecialtyModel,
    types::{CreateSpecialtyRequest, UpdateSpecialtyRequest},
};
use crate::repository::ClinicRepository;
use crate::shared::{optional_text, require_text, AppError};

pub struct SpecialtyService {
    repository: Arc<dyn ClinicRepository + Send + Sync>,
}

impl SpecialtyService {
    pub fn new(repository: Arc<dyn ClinicRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_specialties(&self) -> Result<Vec<SpecialtyModel>, AppError> {
        self.repository.list_specialties().await
    }

    #[instrument(skip(self))]
    pub async fn get_specialty(&self, specialty_id: &str) -> Result<SpecialtyModel, AppError> {
        self.repository
            .get_specialty(specialty_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Specialty not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn create_specialty(
        &self,
        request: CreateSpecialtyRequest,
    ) -> Result<SpecialtyModel, AppError> {
        let mut specialty = SpecialtyModel::new(
            require_text("nameAr", &request.name_ar)?,
            require_text("nameEn", &request.name_en)?,
        );
        specialty.description_ar = optional_text(request.description_ar);
        specialty.description_en = optional_text(request.description_en);
        specialty.icon = optional_text(request.icon);

        self.repository.create_specialty(&specialty).await?;
        info!(specialty_id = %specialty.id, name = %specialty.name_en, "Specialty created");

        Ok(specialty)
    }

    #[instrument(skip(self, request))]
    pub async fn update_specialty(
        &self,
        specialty_id: &str,
        request: UpdateSpecialtyRequest,
    ) -> Result<SpecialtyModel, AppError> {
        let mut specialty = self.get_specialty(specialty_id).await?;

        if let Some(name_ar) = request.name_ar {
            specialty.name_ar = require_text("nameAr", &name_ar)?;
        }
        if let Some(name_en) = request.name_en {
            specialty.name_en = require_text("nameEn", &name_en)?;
        }
        if request.description_ar.is_some() {
            specialty.description_ar = optional_text(request.description_ar);
        }
        if request.description_en.is_some() {
            specialty.description_en = optional_text(request.description_en);
        }
        if request.icon.is_some() {
            specialty.icon = optional_text(request.icon);
        }

        self.repository.update_specialty(&specialty).await?;
        info!(specialty_id = %specialty.id, "Specialty updated");

        Ok(specialty)
    }

    #[instrument(skip(self))]
    pub async fn delete_specialty(&self, specialty_id: &str) -> Result<(), AppError> {
        self.repository.delete_specialty(specialty_id).await?;
        info!(specialty_id = %specialty_id, "Specialty deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryClinicRepository;

    fn create_request(name_en: &str) -> CreateSpecialtyRequest {
        CreateSpecialtyRequest {
            name_ar: "طب الأطفال".to_string(),
            name_en: name_en.to_string(),
            description_ar: Some("  ".to_string()),
            description_en: Some("Children".to_string()),
            icon: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_update_specialty() {
        let service = SpecialtyService::new(Arc::new(InMemoryClinicRepository::new()));
        let created = service.create_specialty(create_request("Pediatrics")).await.unwrap();
        assert_eq!(created.description_ar, None);

        let updated = service
            .update_specialty(
                &created.id,
                UpdateSpecialtyRequest {
                    icon: Some("baby".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.icon.as_deref(), Some("baby"));
        assert_eq!(updated.name_en, "Pediatrics");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let service = SpecialtyService::new(Arc::new(InMemoryClinicRepository::new()));
        let result = service.create_specialty(create_request(" ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_specialty() {
        let service = SpecialtyService::new(Arc::new(InMemoryClinicRepository::new()));
        assert!(matches!(
            service.get_specialty("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update_specialty("missing", UpdateSpecialtyRequest::default())
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
