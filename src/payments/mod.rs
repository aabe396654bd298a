// Public API - what other modules can use
pub use handlers::{create_payment, get_appointment_payment, get_payment, list_payments};
pub use service::PaymentService;

mod handlers;
pub mod models;
pub mod service;
pub mod types;
