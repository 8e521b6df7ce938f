// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub user_id: String,
    pub service_id: i64,
    pub service_name: Option<String>,
    pub appointment_date: NaiveDateTime,
    pub description: String,
    pub patient_name: String,
    pub mobile_number: String,
    pub patient_email: String,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Row shape returned by `select=*,services(name)`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    pub id: i64,
    pub user_id: String,
    pub service_id: i64,
    #[serde(default)]
    pub services: Option<ServiceRef>,
    pub appointment_date: NaiveDateTime,
    #[serde(default)]
    pub description: Option<String>,
    pub patient_name: String,
    pub mobile_number: String,
    pub patient_email: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            service_id: row.service_id,
            service_name: row.services.map(|s| s.name),
            appointment_date: row.appointment_date,
            description: row.description.unwrap_or_default(),
            patient_name: row.patient_name,
            mobile_number: row.mobile_number,
            patient_email: row.patient_email,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Every field is optional on the wire so missing values surface as
/// validation messages instead of extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAppointmentRequest {
    pub service_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub description: Option<String>,
    pub patient_name: Option<String>,
    pub mobile_number: Option<String>,
    pub patient_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateAppointmentRequest {
    pub service_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub description: Option<String>,
    pub patient_name: Option<String>,
    pub mobile_number: Option<String>,
    pub patient_email: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl UpdateAppointmentRequest {
    pub fn is_empty(&self) -> bool {
        self.service_id.is_none()
            && self.appointment_date.is_none()
            && self.description.is_none()
            && self.patient_name.is_none()
            && self.mobile_number.is_none()
            && self.patient_email.is_none()
            && self.status.is_none()
    }
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAppointment {
    pub service_id: i64,
    pub appointment_date: NaiveDateTime,
    pub description: String,
    pub patient_name: String,
    pub mobile_number: String,
    pub patient_email: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Unknown service: {0}")]
    UnknownService(i64),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("Not authorized to access this appointment")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
