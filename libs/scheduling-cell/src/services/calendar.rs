// libs/scheduling-cell/src/services/calendar.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Appointment, AppointmentStatus};
use crate::services::slots::truncate_to_hour;

/// Narrow persistence seam for the doctor calendars. The booking coordinator
/// receives an implementation by constructor injection so tests can swap in
/// an in-memory fake.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Hour-truncated timestamps of the doctor's upcoming appointments.
    async fn list_upcoming(
        &self,
        doctor_id: Uuid,
    ) -> Result<HashSet<DateTime<Utc>>, SupabaseError>;

    /// Atomic conditional insert. `Ok(None)` means another booking already
    /// holds an upcoming appointment at that (doctor, slot) pair.
    async fn try_commit(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        slot: DateTime<Utc>,
    ) -> Result<Option<Appointment>, SupabaseError>;

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, SupabaseError>;

    /// Conditional transition upcoming -> cancelled; `false` when the row was
    /// no longer upcoming.
    async fn cancel(&self, appointment_id: Uuid, cancelled_by: Uuid)
        -> Result<bool, SupabaseError>;

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, SupabaseError>;

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        only_upcoming: bool,
    ) -> Result<Vec<Appointment>, SupabaseError>;
}

#[derive(Debug, Deserialize)]
struct SlotRow {
    slot_time: DateTime<Utc>,
}

pub struct SupabaseCalendarStore {
    supabase: SupabaseClient,
}

impl SupabaseCalendarStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn representation_headers() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        headers
    }
}

#[async_trait]
impl CalendarStore for SupabaseCalendarStore {
    async fn list_upcoming(
        &self,
        doctor_id: Uuid,
    ) -> Result<HashSet<DateTime<Utc>>, SupabaseError> {
        debug!("Fetching upcoming calendar for doctor {}", doctor_id);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=eq.upcoming&select=slot_time",
            doctor_id
        );
        let rows: Vec<SlotRow> = self.supabase.request(Method::GET, &path, None, None).await?;

        Ok(rows
            .into_iter()
            .map(|row| truncate_to_hour(row.slot_time))
            .collect())
    }

    async fn try_commit(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        slot: DateTime<Utc>,
    ) -> Result<Option<Appointment>, SupabaseError> {
        let now = Utc::now();
        let appointment_data = json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "slot_time": truncate_to_hour(slot).to_rfc3339(),
            "status": AppointmentStatus::Upcoming.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        // The appointments table carries a partial unique index on
        // (doctor_id, slot_time) over upcoming rows; a losing insert comes
        // back as 409 rather than a second row.
        let result: Result<Vec<Appointment>, SupabaseError> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(appointment_data),
                Some(Self::representation_headers()),
            )
            .await;

        match result {
            Ok(mut rows) => {
                if rows.is_empty() {
                    return Err(SupabaseError::Decode(
                        "insert returned no representation".to_string(),
                    ));
                }
                Ok(Some(rows.remove(0)))
            }
            Err(SupabaseError::Conflict(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, SupabaseError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut rows: Vec<Appointment> =
            self.supabase.request(Method::GET, &path, None, None).await?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn cancel(
        &self,
        appointment_id: Uuid,
        cancelled_by: Uuid,
    ) -> Result<bool, SupabaseError> {
        let update = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "cancelled_by": cancelled_by,
            "updated_at": Utc::now().to_rfc3339()
        });

        // Filtering on status makes the transition conditional: a row that a
        // concurrent request already cancelled does not match.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.upcoming",
            appointment_id
        );
        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(update),
                Some(Self::representation_headers()),
            )
            .await?;

        Ok(!rows.is_empty())
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, SupabaseError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=slot_time.asc",
            doctor_id
        );
        self.supabase.request(Method::GET, &path, None, None).await
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        only_upcoming: bool,
    ) -> Result<Vec<Appointment>, SupabaseError> {
        let mut path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=slot_time.asc",
            patient_id
        );
        if only_upcoming {
            path.push_str("&status=eq.upcoming");
        }
        self.supabase.request(Method::GET, &path, None, None).await
    }
}
