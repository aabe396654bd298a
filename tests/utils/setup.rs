#![allow(dead_code)] // Not every test binary uses every helper

use axum::Router;
use rust_decimal::Decimal;
use std::sync::Arc;

use clinic::{
    auth::{PasswordHasher, MIN_BCRYPT_COST},
    build_router,
    doctors::models::DoctorProfileModel,
    session::{repository::InMemorySessionRepository, service::SessionService, token::TokenConfig},
    specialties::models::SpecialtyModel,
    users::models::{Role, UserModel},
    AppState, InMemoryClinicRepository,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A stored account together with its plain-text password
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password: String,
}

pub struct TestSetup {
    pub app: Router,
    pub state: AppState,
    pub admin: Account,
    pub doctor: Account,
    pub specialty: SpecialtyModel,
    pub doctor_profile_id: Option<String>,
}

pub struct TestSetupBuilder {
    with_doctor_profile: bool,
    session_ttl_hours: i64,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            with_doctor_profile: false,
            session_ttl_hours: 24,
        }
    }

    pub fn with_doctor_profile(mut self) -> Self {
        self.with_doctor_profile = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryClinicRepository::new());
        let session_service = SessionService::new(
            Arc::new(InMemorySessionRepository::new()),
            TokenConfig::new("integration-secret".to_string(), self.session_ttl_hours),
        );
        let state = AppState::new(
            repository,
            Arc::new(session_service),
            PasswordHasher::new(MIN_BCRYPT_COST),
        );

        let admin = store_account(&state, "admin@clinic.com", "Admin", Role::Admin).await;
        let doctor = store_account(&state, "fatima@clinic.com", "Dr. Fatima", Role::Doctor).await;

        let mut specialty =
            SpecialtyModel::new("الأعصاب".to_string(), "Neurology".to_string());
        specialty.icon = Some("brain".to_string());
        state.repository.create_specialty(&specialty).await.unwrap();

        let doctor_profile_id = if self.with_doctor_profile {
            let profile = DoctorProfileModel::new(
                doctor.id.clone(),
                specialty.id.clone(),
                Decimal::from(350),
            );
            state.repository.create_doctor_profile(&profile).await.unwrap();
            Some(profile.id)
        } else {
            None
        };

        TestSetup {
            app: build_router(state.clone(), None),
            state,
            admin,
            doctor,
            specialty,
            doctor_profile_id,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stores a user directly, bypassing the API
pub async fn store_account(state: &AppState, email: &str, name: &str, role: Role) -> Account {
    let password = format!("{}-pass", role);
    let hash = state.password_hasher.hash(&password).await.unwrap();
    let user = UserModel::new(email.to_string(), hash, name.to_string(), role, None);
    state.repository.create_user(&user).await.unwrap();

    Account {
        id: user.id,
        email: email.to_string(),
        password,
    }
}
