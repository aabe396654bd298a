// Public API - what other modules can use
pub use handlers::{
    create_doctor, delete_doctor, get_doctor, get_doctor_by_user, list_doctors,
    list_doctors_by_specialty, update_doctor,
};
pub use service::DoctorService;

mod handlers;
pub mod models;
pub mod service;
pub mod types;
