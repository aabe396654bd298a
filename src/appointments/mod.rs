// Public API - what other modules can use
pub use handlers::{
    create_appointment, delete_appointment, get_appointment, list_appointments,
    list_doctor_appointments, list_patient_appointments, update_appointment,
};
pub use service::AppointmentService;

mod handlers;
pub mod models;
pub mod service;
pub mod types;
