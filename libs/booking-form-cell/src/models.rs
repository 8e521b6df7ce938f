use serde::{Deserialize, Serialize};

/// A bookable service type from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
}

/// Credentials saved at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Body of the create-appointment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub service_id: i64,
    pub appointment_date: String,
    pub description: String,
    pub patient_name: String,
    pub mobile_number: String,
    pub patient_email: String,
}

/// The parts of a stored appointment the form displays.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookedAppointment {
    pub id: Option<i64>,
    pub service_name: Option<String>,
    pub patient_name: String,
    pub appointment_date: String,
    pub status: String,
}
