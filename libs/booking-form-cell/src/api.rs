use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::ClientConfig;

use crate::models::{BookedAppointment, NewAppointment, Service};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },

    /// No usable response arrived.
    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(error.to_string())
    }
}

/// The two calls the booking form makes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn fetch_services(&self) -> Result<Vec<Service>, ApiError>;

    async fn create_appointment(
        &self,
        token: &str,
        appointment: &NewAppointment,
    ) -> Result<BookedAppointment, ApiError>;
}

pub struct HttpBookingApi {
    client: Client,
    api_url: String,
    catalog_url: String,
}

impl HttpBookingApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_base_url.trim_end_matches('/').to_string(),
            catalog_url: config.catalog_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Turns a non-success response into `ApiError::Status`, keeping the
/// server's `message` field when the body has one.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("Booking API error ({}): {}", status, body);

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty());

    Err(ApiError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn fetch_services(&self) -> Result<Vec<Service>, ApiError> {
        let url = format!("{}/services", self.catalog_url);
        debug!("Fetching service catalog from {}", url);

        let response = self.client.get(&url).send().await?;
        let services = check_status(response).await?.json::<Vec<Service>>().await?;

        Ok(services)
    }

    async fn create_appointment(
        &self,
        token: &str,
        appointment: &NewAppointment,
    ) -> Result<BookedAppointment, ApiError> {
        let url = format!("{}/appointments", self.api_url);
        debug!("Submitting booking for service {} to {}", appointment.service_id, url);

        let response = self.client
            .post(&url)
            .bearer_auth(token)
            .json(appointment)
            .send()
            .await?;

        let booked = check_status(response).await?.json::<BookedAppointment>().await?;
        Ok(booked)
    }
}
