// Public API - what other modules can use
pub use handlers::{
    create_specialty, delete_specialty, get_specialty, list_specialties, update_specialty,
};
pub use service::SpecialtyService;

mod handlers;
pub mod models;
pub mod service;
pub mod types;
