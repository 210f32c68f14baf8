// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Priority, SchedulingError};
use crate::services::calendar::CalendarStore;
use crate::services::partition::select_slot;
use crate::services::slots::enumerate_free_slots;

/// Orchestrates one booking attempt against a doctor's calendar: read the
/// booked set, enumerate and partition the free slots, then commit the
/// selected slot under the store's no-double-booking guarantee.
///
/// Stateless between calls; `now` and the calendar are re-read per request,
/// so concurrent invocations only contend inside the store's conditional
/// insert.
pub struct BookingCoordinator {
    calendar: Arc<dyn CalendarStore>,
}

impl BookingCoordinator {
    pub fn new(calendar: Arc<dyn CalendarStore>) -> Self {
        Self { calendar }
    }

    pub async fn book(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Booking attempt for doctor {} at priority {}",
            doctor_id, priority
        );

        let booked = self
            .calendar
            .list_upcoming(doctor_id)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?;

        let free = enumerate_free_slots(&booked, now);
        let slot = select_slot(&free, priority).ok_or(SchedulingError::NoSlotAvailable)?;

        match self.calendar.try_commit(doctor_id, patient_id, slot).await {
            Ok(Some(appointment)) => {
                info!(
                    "Committed appointment {} for doctor {} at {}",
                    appointment.id, doctor_id, slot
                );
                Ok(appointment)
            }
            Ok(None) => {
                // Lost the insert race; the caller retries the whole call and
                // the enumerator then sees the winner's slot as booked.
                warn!("Slot {} for doctor {} claimed concurrently", slot, doctor_id);
                Err(SchedulingError::Conflict)
            }
            Err(e) => Err(SchedulingError::Storage(e.to_string())),
        }
    }

    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        requester: Uuid,
    ) -> Result<(), SchedulingError> {
        let appointment = self
            .calendar
            .find_appointment(appointment_id)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?
            .ok_or(SchedulingError::NotFound)?;

        if appointment.status != AppointmentStatus::Upcoming {
            return Err(SchedulingError::PolicyViolation(
                "Appointment is not upcoming".to_string(),
            ));
        }

        let is_doctor = appointment.doctor_id == requester;
        let is_patient = appointment.patient_id == Some(requester);
        if !is_doctor && !is_patient {
            return Err(SchedulingError::PolicyViolation(
                "Only the doctor or the patient may cancel this appointment".to_string(),
            ));
        }

        let cancelled = self
            .calendar
            .cancel(appointment_id, requester)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?;

        if !cancelled {
            // Raced with another state change; the row is no longer upcoming.
            return Err(SchedulingError::PolicyViolation(
                "Appointment is not upcoming".to_string(),
            ));
        }

        info!("Appointment {} cancelled by {}", appointment_id, requester);
        Ok(())
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.calendar
            .appointments_for_doctor(doctor_id)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))
    }

    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        only_upcoming: bool,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.calendar
            .appointments_for_patient(patient_id, only_upcoming)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))
    }
}
