// libs/scheduling-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookSlotRequest, PatientAppointmentsQuery, SchedulingError};
use crate::router::SchedulingState;

fn requester_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Requester id is not a valid uuid".to_string()))
}

/// Book the best available slot for the requester with the given doctor.
///
/// The priority tier arrives from the risk classification gateway; identity
/// comes from the validated token. All scheduling decisions happen in the
/// coordinator.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<SchedulingState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = requester_id(&user)?;

    let appointment = state
        .coordinator
        .book(request.doctor_id, patient_id, request.priority, Utc::now())
        .await
        .map_err(|e| match e {
            SchedulingError::NoSlotAvailable => {
                AppError::BadRequest("No appointment slots available in the scheduling window".to_string())
            }
            SchedulingError::Conflict => {
                AppError::Conflict("Slot was claimed by a concurrent booking, please retry".to_string())
            }
            SchedulingError::Storage(msg) => AppError::Unavailable(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "date": appointment.slot_time.format("%Y-%m-%d %H:%M").to_string()
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let requester = requester_id(&user)?;

    state
        .coordinator
        .cancel(appointment_id, requester)
        .await
        .map_err(|e| match e {
            SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            SchedulingError::PolicyViolation(msg) => AppError::Forbidden(msg),
            SchedulingError::Storage(msg) => AppError::Unavailable(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Successfully cancelled appointment"
    })))
}

/// List the requesting doctor's appointments.
#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<SchedulingState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    let doctor_id = requester_id(&user)?;

    let appointments = state
        .coordinator
        .appointments_for_doctor(doctor_id)
        .await
        .map_err(|e| match e {
            SchedulingError::Storage(msg) => AppError::Unavailable(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// List the requesting patient's appointments, upcoming only by default.
#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<SchedulingState>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    if !user.is_patient() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    let patient_id = requester_id(&user)?;

    let only_upcoming = !query.include_past.unwrap_or(false);
    let appointments = state
        .coordinator
        .appointments_for_patient(patient_id, only_upcoming)
        .await
        .map_err(|e| match e {
            SchedulingError::Storage(msg) => AppError::Unavailable(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "appointments": appointments })))
}
