// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE CALENDAR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    /// Null until a booking commits the slot to a patient.
    pub patient_id: Option<Uuid>,
    /// Truncated to the whole hour; one upcoming appointment per
    /// (doctor, slot_time) pair.
    pub slot_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancelled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_upcoming(&self) -> bool {
        self.status == AppointmentStatus::Upcoming
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Upcoming,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Urgency tier attached to a booking request, as produced by the risk
/// classification gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum Priority {
    #[serde(alias = "low")]
    Low,

    #[serde(alias = "medium")]
    Medium,

    #[serde(alias = "high", alias = "urgent")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub doctor_id: Uuid,
    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientAppointmentsQuery {
    /// Include cancelled and past appointments in the listing.
    pub include_past: Option<bool>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Calendar storage unavailable: {0}")]
    Storage(String),

    #[error("No appointment slots available in the scheduling window")]
    NoSlotAvailable,

    #[error("Slot was claimed by a concurrent booking")]
    Conflict,

    #[error("Appointment not found")]
    NotFound,

    #[error("Policy violation: {0}")]
    PolicyViolation(String),
}
