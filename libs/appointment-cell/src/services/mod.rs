pub mod appointment;
pub mod lifecycle;
pub mod validation;

pub use appointment::AppointmentService;
