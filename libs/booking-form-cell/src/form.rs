use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, BookingApi};
use crate::models::{BookedAppointment, NewAppointment, Service, Session};

pub const MOBILE_NUMBER_LENGTH: usize = 10;
pub const LOGIN_PATH: &str = "/login";

pub const MSG_BOOKED: &str = "Appointment booked successfully!";
pub const MSG_SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
const BOOKING_FAILED_PREFIX: &str = "Booking failed: ";
const BOOKING_FAILED_FALLBACK: &str = "Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    LoadingServices,
    Ready,
    Submitting,
    Booked,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    Loaded,
    /// The catalog call failed; the selector stays empty.
    Unavailable(String),
}

/// Reasons a submit never reached the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("A booking request is already in progress.")]
    InFlight,

    #[error("You must be logged in to book an appointment.")]
    NotLoggedIn,

    #[error("Please enter a valid 10-digit mobile number.")]
    InvalidMobileNumber,

    #[error("Please fill in all required fields.")]
    MissingFields,
}

/// Everything the patient can edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFields {
    pub service_id: Option<i64>,
    pub date: String,
    pub time: String,
    pub description: String,
    pub patient_name: String,
    pub mobile_number: String,
    pub email: String,
}

impl BookingFields {
    fn has_required_values(&self) -> bool {
        self.service_id.is_some()
            && [&self.date, &self.time, &self.patient_name, &self.mobile_number, &self.email]
                .iter()
                .all(|value| !value.trim().is_empty())
    }
}

/// A request that passed every guard and is waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub token: String,
    pub appointment: NewAppointment,
}

/// State of the booking screen.
///
/// `loading-services -> ready -> submitting -> booked | failed`, and back to
/// `submitting` from either end state when the patient submits again.
#[derive(Debug, Clone)]
pub struct BookingForm {
    session: Option<Session>,
    state: FormState,
    catalog: CatalogState,
    services: Vec<Service>,
    pub fields: BookingFields,
    message: Option<String>,
    booked: Option<BookedAppointment>,
    redirect: Option<&'static str>,
}

impl BookingForm {
    /// Identity fields are prefilled from the session but stay editable.
    pub fn new(session: Option<Session>) -> Self {
        let mut fields = BookingFields::default();
        if let Some(session) = &session {
            fields.patient_name = session.name.clone();
            fields.email = session.email.clone();
        }

        Self {
            session,
            state: FormState::LoadingServices,
            catalog: CatalogState::Loading,
            services: Vec::new(),
            fields,
            message: None,
            booked: None,
            redirect: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected_service(&self) -> Option<&Service> {
        let id = self.fields.service_id?;
        self.services.iter().find(|s| s.id == id)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn booked(&self) -> Option<&BookedAppointment> {
        self.booked.as_ref()
    }

    /// Where the form wants to navigate, if anywhere.
    pub fn redirect(&self) -> Option<&'static str> {
        self.redirect
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Picks a service from the loaded catalog. Unknown ids are ignored.
    pub fn select_service(&mut self, service_id: i64) -> bool {
        if self.services.iter().any(|s| s.id == service_id) {
            self.fields.service_id = Some(service_id);
            true
        } else {
            false
        }
    }

    /// Loads the catalog and moves to `Ready` whatever the outcome.
    pub async fn mount<A: BookingApi + ?Sized>(&mut self, api: &A) {
        let result = api.fetch_services().await;
        self.apply_catalog(result);
    }

    pub fn apply_catalog(&mut self, result: Result<Vec<Service>, ApiError>) {
        match result {
            Ok(services) => {
                debug!("Loaded {} services", services.len());
                self.fields.service_id = services.first().map(|s| s.id);
                self.services = services;
                self.catalog = CatalogState::Loaded;
            }
            Err(e) => {
                error!("Failed to fetch services: {}", e);
                self.services.clear();
                self.fields.service_id = None;
                self.catalog = CatalogState::Unavailable(e.to_string());
            }
        }

        if self.state == FormState::LoadingServices {
            self.state = FormState::Ready;
        }
    }

    /// Runs the guards and, if they pass, marks the form as submitting.
    /// A guard failure leaves only its message behind.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.state == FormState::Submitting {
            warn!("Ignoring submit while a booking request is outstanding");
            return Err(SubmitError::InFlight);
        }

        self.message = None;
        self.booked = None;
        self.redirect = None;

        let token = self
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            return Err(self.reject(SubmitError::NotLoggedIn));
        };

        if self.fields.mobile_number.chars().count() != MOBILE_NUMBER_LENGTH {
            return Err(self.reject(SubmitError::InvalidMobileNumber));
        }

        let service_id = self
            .fields
            .service_id
            .filter(|_| self.fields.has_required_values());
        let Some(service_id) = service_id else {
            return Err(self.reject(SubmitError::MissingFields));
        };

        let appointment = NewAppointment {
            service_id,
            appointment_date: format!("{} {}", self.fields.date, self.fields.time),
            description: self.fields.description.clone(),
            patient_name: self.fields.patient_name.clone(),
            mobile_number: self.fields.mobile_number.clone(),
            patient_email: self.fields.email.clone(),
        };

        self.state = FormState::Submitting;
        Ok(PendingSubmission { token, appointment })
    }

    /// Applies the outcome of the create call started by `begin_submit`.
    pub fn finish_submit(&mut self, outcome: Result<BookedAppointment, ApiError>) {
        if self.state != FormState::Submitting {
            warn!("Dropping booking outcome with no submission outstanding");
            return;
        }

        match outcome {
            Ok(appointment) => {
                info!("Appointment booked: {:?}", appointment.id);
                self.booked = Some(appointment);
                self.message = Some(MSG_BOOKED.to_string());
                self.state = FormState::Booked;
            }
            Err(e) => {
                error!("Failed to book appointment: {}", e);
                self.message = Some(self.failure_message(&e));
                if e.is_unauthorized() {
                    self.session = None;
                    self.redirect = Some(LOGIN_PATH);
                }
                self.state = FormState::Failed;
            }
        }
    }

    /// Guards, create call and outcome in one step.
    pub async fn submit<A: BookingApi + ?Sized>(&mut self, api: &A) -> Result<(), SubmitError> {
        let pending = self.begin_submit()?;
        let outcome = api.create_appointment(&pending.token, &pending.appointment).await;
        self.finish_submit(outcome);
        Ok(())
    }

    fn reject(&mut self, reason: SubmitError) -> SubmitError {
        if matches!(self.state, FormState::Booked | FormState::Failed) {
            self.state = FormState::Ready;
        }
        self.message = Some(reason.to_string());
        reason
    }

    fn failure_message(&self, error: &ApiError) -> String {
        match error {
            ApiError::Status { status: 401, .. } => MSG_SESSION_EXPIRED.to_string(),
            ApiError::Status { message, .. } => format!(
                "{}{}",
                BOOKING_FAILED_PREFIX,
                message.as_deref().unwrap_or(BOOKING_FAILED_FALLBACK)
            ),
            ApiError::Transport(_) => MSG_UNEXPECTED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBookingApi;
    use assert_matches::assert_matches;

    fn session() -> Session {
        Session {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            token: "token-123".to_string(),
        }
    }

    fn dental() -> Vec<Service> {
        vec![
            Service { id: 1, name: "Dental Cleaning".to_string() },
            Service { id: 2, name: "Eye Exam".to_string() },
        ]
    }

    fn ready_form(session: Option<Session>) -> BookingForm {
        let mut form = BookingForm::new(session);
        form.apply_catalog(Ok(dental()));
        form.fields.mobile_number = "9998887776".to_string();
        form.fields.date = "2024-05-01".to_string();
        form.fields.time = "10:00".to_string();
        form
    }

    fn booked_reply() -> BookedAppointment {
        BookedAppointment {
            id: Some(42),
            service_name: Some("Dental Cleaning".to_string()),
            patient_name: "Jane Doe".to_string(),
            appointment_date: "2024-05-01T10:00:00".to_string(),
            status: "pending".to_string(),
        }
    }

    fn api_never_called() -> MockBookingApi {
        let mut api = MockBookingApi::new();
        api.expect_create_appointment().times(0);
        api
    }

    #[test]
    fn test_new_form_prefills_identity() {
        let form = BookingForm::new(Some(session()));

        assert_eq!(form.state(), FormState::LoadingServices);
        assert_eq!(form.fields.patient_name, "Jane Doe");
        assert_eq!(form.fields.email, "jane@x.com");

        let anonymous = BookingForm::new(None);
        assert!(anonymous.fields.patient_name.is_empty());
    }

    #[tokio::test]
    async fn test_mount_defaults_to_first_service() {
        let mut api = MockBookingApi::new();
        api.expect_fetch_services().times(1).returning(|| Ok(dental()));

        let mut form = BookingForm::new(None);
        form.mount(&api).await;

        assert_eq!(form.state(), FormState::Ready);
        assert_eq!(form.catalog(), &CatalogState::Loaded);
        assert_eq!(form.fields.service_id, Some(1));
        assert_eq!(form.selected_service().unwrap().name, "Dental Cleaning");
    }

    #[tokio::test]
    async fn test_catalog_failure_is_observable() {
        let mut api = MockBookingApi::new();
        api.expect_fetch_services()
            .returning(|| Err(ApiError::Transport("connection refused".to_string())));

        let mut form = BookingForm::new(Some(session()));
        form.mount(&api).await;

        assert_eq!(form.state(), FormState::Ready);
        assert_matches!(form.catalog(), CatalogState::Unavailable(reason) if reason.contains("connection refused"));
        assert!(form.services().is_empty());
        assert_eq!(form.fields.service_id, None);
        assert!(form.message().is_none());
    }

    #[test]
    fn test_select_service_checks_catalog() {
        let mut form = ready_form(None);
        assert!(form.select_service(2));
        assert_eq!(form.fields.service_id, Some(2));
        assert!(!form.select_service(9));
        assert_eq!(form.fields.service_id, Some(2));
    }

    #[tokio::test]
    async fn test_submit_without_session_makes_no_call() {
        let api = api_never_called();
        let mut form = ready_form(None);
        form.fields.patient_name = "Jane Doe".to_string();
        form.fields.email = "jane@x.com".to_string();

        let result = form.submit(&api).await;

        assert_eq!(result, Err(SubmitError::NotLoggedIn));
        assert_eq!(form.message(), Some("You must be logged in to book an appointment."));
        assert_eq!(form.state(), FormState::Ready);
    }

    #[tokio::test]
    async fn test_submit_with_empty_token_makes_no_call() {
        let api = api_never_called();
        let mut form = ready_form(Some(Session { token: String::new(), ..session() }));

        assert_eq!(form.submit(&api).await, Err(SubmitError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_submit_rejects_wrong_length_mobile() {
        for mobile in ["", "999888777", "99988877761"] {
            let api = api_never_called();
            let mut form = ready_form(Some(session()));
            form.fields.mobile_number = mobile.to_string();

            assert_eq!(form.submit(&api).await, Err(SubmitError::InvalidMobileNumber));
            assert_eq!(form.message(), Some("Please enter a valid 10-digit mobile number."));
        }
    }

    #[tokio::test]
    async fn test_submit_requires_all_fields() {
        let api = api_never_called();
        let mut form = ready_form(Some(session()));
        form.fields.time.clear();

        assert_eq!(form.submit(&api).await, Err(SubmitError::MissingFields));

        let mut form = BookingForm::new(Some(session()));
        form.apply_catalog(Ok(Vec::new()));
        form.fields.mobile_number = "9998887776".to_string();
        form.fields.date = "2024-05-01".to_string();
        form.fields.time = "10:00".to_string();

        assert_eq!(form.submit(&api).await, Err(SubmitError::MissingFields));
    }

    #[tokio::test]
    async fn test_successful_submit_shows_booking() {
        let mut api = MockBookingApi::new();
        api.expect_create_appointment()
            .withf(|token, appointment| {
                token == "token-123"
                    && appointment.service_id == 1
                    && appointment.appointment_date == "2024-05-01 10:00"
                    && appointment.description.is_empty()
            })
            .times(1)
            .returning(|_, _| Ok(booked_reply()));

        let mut form = ready_form(Some(session()));
        form.submit(&api).await.unwrap();

        assert_eq!(form.state(), FormState::Booked);
        assert_eq!(form.message(), Some(MSG_BOOKED));
        assert_eq!(form.booked(), Some(&booked_reply()));
        assert_eq!(form.redirect(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_redirects_to_login() {
        let mut api = MockBookingApi::new();
        api.expect_create_appointment().times(1).returning(|_, _| {
            Err(ApiError::Status { status: 401, message: Some("jwt expired".to_string()) })
        });

        let mut form = ready_form(Some(session()));
        form.submit(&api).await.unwrap();

        assert_eq!(form.state(), FormState::Failed);
        assert_eq!(form.message(), Some(MSG_SESSION_EXPIRED));
        assert_eq!(form.redirect(), Some(LOGIN_PATH));
        assert!(form.session().is_none());

        let retry = form.submit(&api_never_called()).await;
        assert_eq!(retry, Err(SubmitError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_server_errors_are_prefixed() {
        let mut api = MockBookingApi::new();
        let mut replies = vec![
            ApiError::Status { status: 400, message: Some("Unknown service".to_string()) },
            ApiError::Status { status: 500, message: None },
            ApiError::Transport("timed out".to_string()),
        ]
        .into_iter();
        api.expect_create_appointment()
            .times(3)
            .returning(move |_, _| Err(replies.next().unwrap()));

        let mut form = ready_form(Some(session()));

        form.submit(&api).await.unwrap();
        assert_eq!(form.message(), Some("Booking failed: Unknown service"));

        form.submit(&api).await.unwrap();
        assert_eq!(form.message(), Some("Booking failed: Please try again."));

        form.submit(&api).await.unwrap();
        assert_eq!(form.message(), Some(MSG_UNEXPECTED));
        assert_eq!(form.state(), FormState::Failed);
        assert_eq!(form.redirect(), None);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_refused() {
        let mut form = ready_form(Some(session()));

        let pending = form.begin_submit().unwrap();
        assert_eq!(pending.appointment.patient_email, "jane@x.com");
        assert_eq!(form.state(), FormState::Submitting);

        assert_eq!(form.begin_submit(), Err(SubmitError::InFlight));
        assert_eq!(form.state(), FormState::Submitting);
        assert!(form.message().is_none());

        form.finish_submit(Ok(booked_reply()));
        assert_eq!(form.state(), FormState::Booked);
    }

    #[test]
    fn test_resubmit_clears_previous_booking() {
        let mut form = ready_form(Some(session()));
        form.begin_submit().unwrap();
        form.finish_submit(Ok(booked_reply()));
        assert!(form.booked().is_some());

        form.fields.mobile_number = "123".to_string();
        assert_eq!(form.begin_submit(), Err(SubmitError::InvalidMobileNumber));
        assert!(form.booked().is_none());
        assert_eq!(form.state(), FormState::Ready);
    }

    #[test]
    fn test_guard_failure_after_failed_booking_returns_to_ready() {
        let mut form = ready_form(Some(session()));
        form.begin_submit().unwrap();
        form.finish_submit(Err(ApiError::Status { status: 500, message: None }));
        assert_eq!(form.state(), FormState::Failed);

        form.fields.time.clear();
        assert_eq!(form.begin_submit(), Err(SubmitError::MissingFields));
        assert_eq!(form.state(), FormState::Ready);
        assert_eq!(form.message(), Some("Please fill in all required fields."));
    }

    #[test]
    fn test_outcome_without_submission_is_ignored() {
        let mut form = ready_form(Some(session()));
        form.finish_submit(Ok(booked_reply()));

        assert_eq!(form.state(), FormState::Ready);
        assert!(form.booked().is_none());
    }
}
