// Library crate for the clinic management API
// This file exposes the router and services for the binary and integration tests

pub mod access;
pub mod appointments;
pub mod auth;
pub mod config;
pub mod doctors;
pub mod payments;
pub mod repository;
pub mod seed;
pub mod session;
pub mod shared;
pub mod specialties;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use repository::{ClinicRepository, InMemoryClinicRepository, PostgresClinicRepository};
pub use shared::{AppError, AppState};

/// Builds the `/api` router with session resolution, request tracing, and panic handling.
/// A CORS layer allowing credentials is added when an origin is given.
pub fn build_router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/specialties",
            get(specialties::list_specialties).post(specialties::create_specialty),
        )
        .route(
            "/specialties/:id",
            get(specialties::get_specialty)
                .patch(specialties::update_specialty)
                .delete(specialties::delete_specialty),
        )
        .route(
            "/doctors",
            get(doctors::list_doctors).post(doctors::create_doctor),
        )
        .route(
            "/doctors/:id",
            get(doctors::get_doctor)
                .patch(doctors::update_doctor)
                .delete(doctors::delete_doctor),
        )
        .route(
            "/doctors/specialty/:id",
            get(doctors::list_doctors_by_specialty),
        )
        .route("/doctors/user/:id", get(doctors::get_doctor_by_user))
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(appointments::get_appointment)
                .patch(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/appointments/doctor/:id",
            get(appointments::list_doctor_appointments),
        )
        .route(
            "/appointments/patient/:id",
            get(appointments::list_patient_appointments),
        )
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/:id", get(payments::get_payment))
        .route(
            "/payments/appointment/:id",
            get(payments::get_appointment_payment),
        );

    let router = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_context,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(shared::panic_response));

    let router = match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        ),
        None => router,
    };

    router.with_state(state)
}
