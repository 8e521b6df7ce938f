use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};

use crate::form::{BookingForm, CatalogState};

const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Formats a stored timestamp as e.g. `5/1/2024, 10:00:00 AM`, keeping the
/// wall-clock time it was stored with. Unparseable input is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return with_offset.naive_local().format(DISPLAY_FORMAT).to_string();
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Renders the form as plain text.
pub fn render(form: &BookingForm) -> String {
    let mut out = String::new();
    let fields = &form.fields;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Book Your Appointment");
    let _ = writeln!(out, "Patient Name: {}", fields.patient_name);
    let _ = writeln!(out, "Mobile Number: {}", fields.mobile_number);
    let _ = writeln!(out, "Email: {}", fields.email);

    let service = match (form.catalog(), form.selected_service()) {
        (CatalogState::Loading, _) => "loading...".to_string(),
        (CatalogState::Unavailable(_), _) => "unavailable".to_string(),
        (CatalogState::Loaded, Some(service)) => service.name.clone(),
        (CatalogState::Loaded, None) => String::new(),
    };
    let _ = writeln!(out, "Service: {}", service);
    let _ = writeln!(out, "Date: {}", fields.date);
    let _ = writeln!(out, "Time: {}", fields.time);
    let _ = writeln!(out, "Description of Issue: {}", fields.description);

    if let Some(message) = form.message() {
        let _ = writeln!(out, "\n{}", message);
    }

    if let Some(booked) = form.booked() {
        let _ = writeln!(out, "\nYour Appointment");
        let _ = writeln!(out, "{}", booked.service_name.as_deref().unwrap_or_default());
        let _ = writeln!(out, "Patient: {}", booked.patient_name);
        let _ = writeln!(out, "Date: {}", format_timestamp(&booked.appointment_date));
        let _ = writeln!(out, "Status: {}", booked.status);
    }

    out
}
