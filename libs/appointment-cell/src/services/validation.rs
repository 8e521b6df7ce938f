// libs/appointment-cell/src/services/validation.rs
//
// Server-side checks for appointment payloads. The booking form runs its own
// guards first, but these are the ones that decide what gets stored.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use tracing::warn;

use crate::models::{
    AppointmentError, CreateAppointmentRequest, UpdateAppointmentRequest, ValidatedAppointment,
};

pub const MOBILE_NUMBER_LENGTH: usize = 10;

static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern compiles"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

fn required_text(field: &'static str, value: Option<String>) -> Result<String, AppointmentError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            warn!("Appointment payload missing {}", field);
            Err(AppointmentError::MissingField(field))
        }
    }
}

pub fn validate_mobile_number(mobile_number: &str) -> Result<(), AppointmentError> {
    if MOBILE_PATTERN.is_match(mobile_number) {
        Ok(())
    } else {
        Err(AppointmentError::ValidationError(format!(
            "mobile_number must be exactly {} digits",
            MOBILE_NUMBER_LENGTH
        )))
    }
}

pub fn validate_email(email: &str) -> Result<(), AppointmentError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(AppointmentError::ValidationError(
            "patient_email is not a valid email address".to_string(),
        ))
    }
}

pub fn validate_service_id(service_id: i64) -> Result<(), AppointmentError> {
    if service_id > 0 {
        Ok(())
    } else {
        Err(AppointmentError::UnknownService(service_id))
    }
}

/// Accepts the form's `"<date> <time>"` shape as well as ISO and RFC 3339 timestamps.
/// Offsets are normalised to UTC.
pub fn parse_appointment_date(raw: &str) -> Result<NaiveDateTime, AppointmentError> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            AppointmentError::ValidationError(format!(
                "appointment_date '{}' is not a valid date and time",
                raw
            ))
        })
}

pub fn validate_create_request(
    request: CreateAppointmentRequest,
) -> Result<ValidatedAppointment, AppointmentError> {
    let service_id = request
        .service_id
        .ok_or(AppointmentError::MissingField("service_id"))?;
    let appointment_date = required_text("appointment_date", request.appointment_date)?;
    let patient_name = required_text("patient_name", request.patient_name)?;
    let mobile_number = required_text("mobile_number", request.mobile_number)?;
    let patient_email = required_text("patient_email", request.patient_email)?;

    validate_service_id(service_id)?;
    validate_mobile_number(&mobile_number)?;
    validate_email(&patient_email)?;

    Ok(ValidatedAppointment {
        service_id,
        appointment_date: parse_appointment_date(&appointment_date)?,
        description: request.description.unwrap_or_default().trim().to_string(),
        patient_name,
        mobile_number,
        patient_email,
    })
}

pub fn reject_empty_update(request: &UpdateAppointmentRequest) -> Result<(), AppointmentError> {
    if request.is_empty() {
        return Err(AppointmentError::ValidationError(
            "Update must contain at least one field".to_string(),
        ));
    }

    Ok(())
}

/// Checks only the fields present in a partial update.
pub fn validate_update_request(request: &UpdateAppointmentRequest) -> Result<(), AppointmentError> {
    reject_empty_update(request)?;

    if let Some(service_id) = request.service_id {
        validate_service_id(service_id)?;
    }
    if let Some(date) = &request.appointment_date {
        parse_appointment_date(date)?;
    }
    if let Some(name) = &request.patient_name {
        required_text("patient_name", Some(name.clone()))?;
    }
    if let Some(mobile_number) = &request.mobile_number {
        validate_mobile_number(mobile_number.trim())?;
    }
    if let Some(email) = &request.patient_email {
        validate_email(email.trim())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, Timelike};

    fn jane() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            service_id: Some(1),
            appointment_date: Some("2024-05-01 10:00".to_string()),
            description: None,
            patient_name: Some("Jane Doe".to_string()),
            mobile_number: Some("9998887776".to_string()),
            patient_email: Some("jane@x.com".to_string()),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let validated = validate_create_request(jane()).unwrap();

        assert_eq!(validated.service_id, 1);
        assert_eq!(validated.description, "");
        assert_eq!(
            validated.appointment_date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_are_named() {
        let mut request = jane();
        request.service_id = None;
        assert_matches!(validate_create_request(request), Err(AppointmentError::MissingField("service_id")));

        let mut request = jane();
        request.patient_name = Some("   ".to_string());
        assert_matches!(validate_create_request(request), Err(AppointmentError::MissingField("patient_name")));

        let mut request = jane();
        request.patient_email = None;
        assert_matches!(validate_create_request(request), Err(AppointmentError::MissingField("patient_email")));
    }

    #[test]
    fn test_mobile_number_rules() {
        assert!(validate_mobile_number("9998887776").is_ok());
        assert!(validate_mobile_number("999888777").is_err());
        assert!(validate_mobile_number("99988877761").is_err());
        assert!(validate_mobile_number("99988a7776").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("jane@x.com").is_ok());
        assert!(validate_email("jane@x").is_err());
        assert!(validate_email("jane x@x.com").is_err());
    }

    #[test]
    fn test_date_formats() {
        for raw in ["2024-05-01 10:00", "2024-05-01 10:00:00", "2024-05-01T10:00", "2024-05-01T10:00:00"] {
            assert_eq!(parse_appointment_date(raw).unwrap().hour(), 10, "{}", raw);
        }

        let utc = parse_appointment_date("2024-05-01T10:00:00+02:00").unwrap();
        assert_eq!(utc.hour(), 8);

        assert!(parse_appointment_date("2024-05-01").is_err());
        assert!(parse_appointment_date("tomorrow 10:00").is_err());
    }

    #[test]
    fn test_update_checks_present_fields_only() {
        assert!(validate_update_request(&UpdateAppointmentRequest::default()).is_err());

        let update = UpdateAppointmentRequest {
            description: Some("Tooth ache".to_string()),
            ..Default::default()
        };
        assert!(validate_update_request(&update).is_ok());

        let update = UpdateAppointmentRequest {
            mobile_number: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(validate_update_request(&update).is_err());
    }
}
