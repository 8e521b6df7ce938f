//! Client side of appointment booking: the form state machine, the REST
//! client it talks through, and a plain-text renderer for its state.

pub mod api;
pub mod form;
pub mod models;
pub mod session;
pub mod view;

pub use api::{ApiError, BookingApi, HttpBookingApi};
pub use form::{BookingForm, CatalogState, FormState, SubmitError};
pub use models::{BookedAppointment, NewAppointment, Service, Session};
