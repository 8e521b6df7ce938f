// libs/appointment-cell/src/services/appointment.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentError, AppointmentRow, AppointmentStatus, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle::validate_status_transition;
use crate::services::validation::{
    parse_appointment_date, reject_empty_update, validate_create_request,
    validate_update_request,
};

const APPOINTMENTS_TABLE: &str = "/rest/v1/appointments";
const SERVICES_TABLE: &str = "/rest/v1/services";
const WITH_SERVICE_NAME: &str = "select=*,services(name)";
const STORED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Business logic behind the appointment routes: validation, ownership
/// scoping and persistence.
pub struct AppointmentService {
    supabase: SupabaseClient,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Patients see their own bookings; staff and admins see everything.
    pub async fn list_appointments(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for user {}", user.id);

        let mut path = format!("{}?{}&order=appointment_date.asc", APPOINTMENTS_TABLE, WITH_SERVICE_NAME);
        if !user.is_staff() {
            path.push_str(&format!("&user_id=eq.{}", user.id));
        }

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(parse_row).collect()
    }

    pub async fn get_appointment(
        &self,
        appointment_id: i64,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let appointment = self.fetch_appointment(appointment_id, auth_token).await?;
        ensure_access(&appointment, user)?;

        Ok(appointment)
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let validated = validate_create_request(request)?;
        debug!("Booking service {} for user {}", validated.service_id, user.id);

        self.ensure_service_exists(validated.service_id, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let record = json!({
            "user_id": user.id,
            "service_id": validated.service_id,
            "appointment_date": validated.appointment_date.format(STORED_DATE_FORMAT).to_string(),
            "description": validated.description,
            "patient_name": validated.patient_name,
            "mobile_number": validated.mobile_number,
            "patient_email": validated.patient_email,
            "status": AppointmentStatus::Pending,
            "created_at": now,
            "updated_at": now,
        });

        let path = format!("{}?{}", APPOINTMENTS_TABLE, WITH_SERVICE_NAME);
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            &path,
            Some(auth_token),
            Some(record),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = first_row(rows)
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))??;

        info!("Appointment {} booked for user {}", appointment.id, user.id);
        Ok(appointment)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: i64,
        request: UpdateAppointmentRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        reject_empty_update(&request)?;

        // Ownership decides before field rules do
        let current = self.fetch_appointment(appointment_id, auth_token).await?;
        ensure_access(&current, user)?;

        validate_update_request(&request)?;

        if let Some(next) = request.status {
            validate_status_transition(current.status, next)?;
        }
        if let Some(service_id) = request.service_id {
            self.ensure_service_exists(service_id, auth_token).await?;
        }

        let changes = build_changes(request)?;
        let path = format!("{}?{}&id=eq.{}", APPOINTMENTS_TABLE, WITH_SERVICE_NAME, appointment_id);
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(changes)),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = first_row(rows).ok_or(AppointmentError::NotFound)??;

        info!("Appointment {} updated successfully", appointment_id);
        Ok(updated)
    }

    /// Returns the id of the removed appointment.
    pub async fn delete_appointment(
        &self,
        appointment_id: i64,
        user: &User,
        auth_token: &str,
    ) -> Result<i64, AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let current = self.fetch_appointment(appointment_id, auth_token).await?;
        ensure_access(&current, user)?;

        let path = format!("{}?id=eq.{}", APPOINTMENTS_TABLE, appointment_id);
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} removed by user {}", appointment_id, user.id);
        Ok(appointment_id)
    }

    async fn fetch_appointment(
        &self,
        appointment_id: i64,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("{}?{}&id=eq.{}", APPOINTMENTS_TABLE, WITH_SERVICE_NAME, appointment_id);
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        first_row(rows).ok_or(AppointmentError::NotFound)?
    }

    async fn ensure_service_exists(
        &self,
        service_id: i64,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("{}?select=id&id=eq.{}", SERVICES_TABLE, service_id);
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            warn!("Booking rejected for unknown service {}", service_id);
            return Err(AppointmentError::UnknownService(service_id));
        }

        Ok(())
    }
}

fn ensure_access(appointment: &Appointment, user: &User) -> Result<(), AppointmentError> {
    if appointment.is_owned_by(&user.id) || user.is_staff() {
        Ok(())
    } else {
        warn!("User {} denied access to appointment {}", user.id, appointment.id);
        Err(AppointmentError::Unauthorized)
    }
}

fn parse_row(row: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value::<AppointmentRow>(row)
        .map(Appointment::from)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}

fn first_row(rows: Vec<Value>) -> Option<Result<Appointment, AppointmentError>> {
    rows.into_iter().next().map(parse_row)
}

fn build_changes(request: UpdateAppointmentRequest) -> Result<Map<String, Value>, AppointmentError> {
    let mut changes = Map::new();

    if let Some(service_id) = request.service_id {
        changes.insert("service_id".to_string(), json!(service_id));
    }
    if let Some(date) = request.appointment_date {
        let parsed = parse_appointment_date(&date)?;
        changes.insert(
            "appointment_date".to_string(),
            json!(parsed.format(STORED_DATE_FORMAT).to_string()),
        );
    }
    if let Some(description) = request.description {
        changes.insert("description".to_string(), json!(description.trim()));
    }
    if let Some(name) = request.patient_name {
        changes.insert("patient_name".to_string(), json!(name.trim()));
    }
    if let Some(mobile_number) = request.mobile_number {
        changes.insert("mobile_number".to_string(), json!(mobile_number.trim()));
    }
    if let Some(email) = request.patient_email {
        changes.insert("patient_email".to_string(), json!(email.trim()));
    }
    if let Some(status) = request.status {
        changes.insert("status".to_string(), json!(status));
    }

    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    Ok(changes)
}
