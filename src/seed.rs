//! Demo data for a fresh clinic: one account per role, a few specialties,
//! and a booked, paid appointment.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::appointments::models::AppointmentModel;
use crate::doctors::models::DoctorProfileModel;
use crate::payments::models::{PaymentMethod, PaymentModel};
use crate::shared::{AppError, AppState};
use crate::specialties::models::SpecialtyModel;
use crate::users::{
    models::{Role, UserResponse},
    types::CreateUserRequest,
    UserService,
};

pub const ADMIN_EMAIL: &str = "admin@clinic.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded,
    AlreadySeeded,
}

struct SpecialtySeed {
    name_ar: &'static str,
    name_en: &'static str,
    description_ar: &'static str,
    description_en: &'static str,
    icon: &'static str,
}

const SPECIALTIES: [SpecialtySeed; 3] = [
    SpecialtySeed {
        name_ar: "القلب والأوعية الدموية",
        name_en: "Cardiology",
        description_ar: "تشخيص وعلاج أمراض القلب والأوعية الدموية",
        description_en: "Diagnosis and treatment of heart and vascular diseases",
        icon: "heart",
    },
    SpecialtySeed {
        name_ar: "الأعصاب",
        name_en: "Neurology",
        description_ar: "تشخيص وعلاج أمراض الجهاز العصبي",
        description_en: "Diagnosis and treatment of nervous system disorders",
        icon: "brain",
    },
    SpecialtySeed {
        name_ar: "العظام",
        name_en: "Orthopedics",
        description_ar: "تشخيص وعلاج أمراض العظام والمفاصل",
        description_en: "Diagnosis and treatment of bone and joint disorders",
        icon: "bone",
    },
];

/// Loads the demo data unless the admin account already exists.
/// A run that fails partway leaves no admin, so the next run fails loudly on
/// the leftover rows instead of reporting the data as seeded.
#[instrument(skip(state))]
pub async fn seed(state: &AppState) -> Result<SeedOutcome, AppError> {
    let repository = &state.repository;
    if repository.get_user_by_email(ADMIN_EMAIL).await?.is_some() {
        info!("Seed data already present, skipping");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let users = UserService::new(Arc::clone(repository), state.password_hasher.clone());
    let account = |email: &str, password: &str, name: &str, role: Role, phone: &str| {
        CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Some(role),
            phone: Some(phone.to_string()),
            avatar: None,
        }
    };

    let mut specialties = Vec::with_capacity(SPECIALTIES.len());
    for seed in &SPECIALTIES {
        let mut specialty = SpecialtyModel::new(seed.name_ar.to_string(), seed.name_en.to_string());
        specialty.description_ar = Some(seed.description_ar.to_string());
        specialty.description_en = Some(seed.description_en.to_string());
        specialty.icon = Some(seed.icon.to_string());
        repository.create_specialty(&specialty).await?;
        specialties.push(specialty);
    }
    info!(specialty_count = specialties.len(), "Seeded specialties");

    let cardiology = &specialties[0];
    let neurology = &specialties[1];

    let doctor1 = users
        .create_user(account(
            "doctor1@clinic.com",
            "doctor123",
            "د. محمد أحمد",
            Role::Doctor,
            "+966 50 222 2222",
        ))
        .await?;
    let doctor2 = users
        .create_user(account(
            "doctor2@clinic.com",
            "doctor123",
            "د. فاطمة علي",
            Role::Doctor,
            "+966 50 333 3333",
        ))
        .await?;

    seed_profile(
        state,
        &doctor1,
        cardiology,
        15,
        Decimal::from(300),
        ("استشاري أمراض القلب مع خبرة 15 عام", "Cardiology consultant with 15 years experience"),
    )
    .await?;
    seed_profile(
        state,
        &doctor2,
        neurology,
        12,
        Decimal::from(350),
        ("استشارية أمراض الأعصاب مع خبرة 12 عام", "Neurology consultant with 12 years experience"),
    )
    .await?;

    let patient = users
        .create_user(account(
            "patient@clinic.com",
            "patient123",
            "أحمد محمود",
            Role::Patient,
            "+966 55 444 4444",
        ))
        .await?;
    users
        .create_user(account(
            "accountant@clinic.com",
            "accountant123",
            "خالد السعيد",
            Role::Accountant,
            "+966 56 555 5555",
        ))
        .await?;

    let appointment = AppointmentModel::new(
        patient.id,
        doctor1.id,
        cardiology.id.clone(),
        Utc::now() + Duration::days(1),
        Some("فحص دوري للقلب".to_string()),
    );
    repository.create_appointment(&appointment).await?;

    let payment = PaymentModel::new(
        appointment.id.clone(),
        Decimal::from(300),
        PaymentMethod::Card,
        None,
    );
    repository.create_payment(&payment).await?;

    // Written last: its presence marks a completed seed
    users
        .create_user(account(
            ADMIN_EMAIL,
            "admin123",
            "المدير العام",
            Role::Admin,
            "+966 50 111 1111",
        ))
        .await?;

    info!(admin = ADMIN_EMAIL, "Demo data seeded");
    Ok(SeedOutcome::Seeded)
}

async fn seed_profile(
    state: &AppState,
    doctor: &UserResponse,
    specialty: &SpecialtyModel,
    experience: i32,
    fee: Decimal,
    (description_ar, description_en): (&str, &str),
) -> Result<(), AppError> {
    let mut profile = DoctorProfileModel::new(doctor.id.clone(), specialty.id.clone(), fee);
    profile.experience = experience;
    profile.description_ar = Some(description_ar.to_string());
    profile.description_en = Some(description_en.to_string());
    state.repository.create_doctor_profile(&profile).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::AppointmentFilter;
    use crate::shared::test_utils::AppStateBuilder;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let state = AppStateBuilder::new().build();

        assert_eq!(seed(&state).await.unwrap(), SeedOutcome::Seeded);
        assert_eq!(seed(&state).await.unwrap(), SeedOutcome::AlreadySeeded);

        assert_eq!(state.repository.list_users(None).await.unwrap().len(), 5);
        assert_eq!(state.repository.list_specialties().await.unwrap().len(), 3);
        assert_eq!(
            state.repository.list_doctor_profiles(None).await.unwrap().len(),
            2
        );

        let appointments = state
            .repository
            .list_appointments(&AppointmentFilter::default())
            .await
            .unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(state.repository.list_payments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let state = AppStateBuilder::new().build();
        seed(&state).await.unwrap();

        let users = UserService::new(
            Arc::clone(&state.repository),
            state.password_hasher.clone(),
        );
        let admin = users.authenticate(ADMIN_EMAIL, "admin123").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_partial_seed_is_not_reported_as_seeded() {
        let state = AppStateBuilder::new().build();
        let leftover = crate::users::models::UserModel::new(
            "patient@clinic.com".to_string(),
            "hash".to_string(),
            "Leftover".to_string(),
            Role::Patient,
            None,
        );
        state.repository.create_user(&leftover).await.unwrap();

        assert!(matches!(seed(&state).await, Err(AppError::Conflict(_))));
        assert!(state
            .repository
            .get_user_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .is_none());
        assert!(seed(&state).await.is_err());
    }
}
