// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::AppointmentService;

/// Controller errors pass through with a fixed status per kind.
fn to_app_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::Unauthorized => AppError::Forbidden(error.to_string()),
        AppointmentError::UnknownService(_) => AppError::ValidationError("Unknown service".to_string()),
        AppointmentError::MissingField(_) => AppError::ValidationError(error.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(error.to_string()),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn read_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = AppointmentService::new(&state);

    let appointments = service.list_appointments(&user, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    appointment_id: Result<Path<i64>, PathRejection>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    let appointment_id = read_id(appointment_id)?;
    let service = AppointmentService::new(&state);

    let appointment = service.get_appointment(appointment_id, &user, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let request = read_body(payload)?;
    let service = AppointmentService::new(&state);

    let appointment = service.create_appointment(request, &user, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    appointment_id: Result<Path<i64>, PathRejection>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<Json<Appointment>, AppError> {
    let appointment_id = read_id(appointment_id)?;
    let request = read_body(payload)?;
    let service = AppointmentService::new(&state);

    let appointment = service.update_appointment(appointment_id, request, &user, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    appointment_id: Result<Path<i64>, PathRejection>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = read_id(appointment_id)?;
    let service = AppointmentService::new(&state);

    let removed_id = service.delete_appointment(appointment_id, &user, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Appointment removed",
        "id": removed_id
    })))
}
