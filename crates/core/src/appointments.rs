//! Appointment scheduling lifecycle.
//!
//! Appointments move through a small state machine: `Scheduled` is the only
//! non-terminal state, and both `Completed` and `Cancelled` are final. Every
//! transition is checked and applied under the repository's write lock, so
//! two racing transition attempts on one appointment cannot both succeed.
//!
//! The service depends on [`PatientService`] only for read-only existence
//! checks. That check and the subsequent insert are deliberately not atomic
//! with each other: if the referenced patient is deleted in between, the
//! appointment keeps a dangling patient id. Deleting patients that are still
//! referenced is a caller-discipline concern, not something this service
//! guards against.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_types::NonEmptyText;

use crate::config::CoreConfig;
use crate::error::{EntityKind, HospitalError, HospitalResult};
use crate::id::IdAllocator;
use crate::patients::PatientService;
use crate::repository::{Entity, Repository};

/// Where an appointment is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled visit for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub scheduled_for: DateTime<Utc>,
    pub kind: NonEmptyText,
    pub status: AppointmentStatus,
}

impl Entity for Appointment {
    const KIND: EntityKind = EntityKind::Appointment;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for scheduling an appointment; the service assigns the id and the
/// initial `Scheduled` status.
#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub patient_id: String,
    pub scheduled_for: DateTime<Utc>,
    pub kind: NonEmptyText,
}

/// The caller-editable part of an appointment. Id, patient reference and
/// status are preserved across updates by construction.
#[derive(Clone, Debug)]
pub struct AppointmentChange {
    pub scheduled_for: DateTime<Utc>,
    pub kind: NonEmptyText,
}

/// Owns the appointment store and its state machine.
pub struct AppointmentService {
    repo: Repository<Appointment>,
    ids: IdAllocator,
    patients: Arc<PatientService>,
}

impl AppointmentService {
    /// Creates a new `AppointmentService`.
    pub fn new(cfg: &CoreConfig, patients: Arc<PatientService>) -> Self {
        Self {
            repo: Repository::new(),
            ids: IdAllocator::new(cfg.appointments()),
            patients,
        }
    }

    fn require_future(scheduled_for: DateTime<Utc>) -> HospitalResult<()> {
        if scheduled_for < Utc::now() {
            return Err(HospitalError::InvalidInput(format!(
                "appointment time {scheduled_for} is in the past"
            )));
        }
        Ok(())
    }

    fn require_patient(&self, patient_id: &str) -> HospitalResult<()> {
        if !self.patients.exists(patient_id) {
            return Err(HospitalError::MissingReference {
                kind: EntityKind::Patient,
                id: patient_id.to_owned(),
            });
        }
        Ok(())
    }

    /// Schedules a new appointment with status `Scheduled`.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the time is in the past, or
    /// `HospitalError::MissingReference` if the patient does not exist.
    pub fn schedule(&self, new: NewAppointment) -> HospitalResult<Appointment> {
        Self::require_future(new.scheduled_for)?;
        self.require_patient(&new.patient_id)?;

        let appointment = Appointment {
            id: self.ids.allocate(),
            patient_id: new.patient_id,
            scheduled_for: new.scheduled_for,
            kind: new.kind,
            status: AppointmentStatus::Scheduled,
        };
        self.repo.insert(appointment.clone())?;
        tracing::info!(
            "scheduled appointment {} for patient {}",
            appointment.id,
            appointment.patient_id
        );
        Ok(appointment)
    }

    /// Marks a scheduled appointment as completed.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidTransition` unless the appointment is
    /// currently `Scheduled`, or `HospitalError::NotFound` for an unknown id.
    pub fn complete(&self, id: &str) -> HospitalResult<Appointment> {
        self.repo.modify(id, |appointment| {
            if appointment.status.is_terminal() {
                return Err(HospitalError::InvalidTransition(format!(
                    "appointment {} is {}, only scheduled appointments can be completed",
                    appointment.id, appointment.status
                )));
            }
            appointment.status = AppointmentStatus::Completed;
            Ok(appointment.clone())
        })
    }

    /// Cancels a scheduled appointment. An `Ok` return means the
    /// cancellation took effect.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidTransition` unless the appointment is
    /// currently `Scheduled`, or `HospitalError::NotFound` for an unknown id.
    pub fn cancel(&self, id: &str) -> HospitalResult<Appointment> {
        self.repo.modify(id, |appointment| {
            if appointment.status.is_terminal() {
                return Err(HospitalError::InvalidTransition(format!(
                    "appointment {} is {}, only scheduled appointments can be cancelled",
                    appointment.id, appointment.status
                )));
            }
            appointment.status = AppointmentStatus::Cancelled;
            Ok(appointment.clone())
        })
    }

    /// Re-books a scheduled appointment with a new time and kind, validated
    /// the same way as [`schedule`](Self::schedule). The id, patient
    /// reference and status are preserved.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidTransition` if the appointment is no
    /// longer `Scheduled`, `HospitalError::InvalidInput` for a past time,
    /// `HospitalError::MissingReference` if the linked patient has since
    /// been deleted, or `HospitalError::NotFound` for an unknown id.
    pub fn update(&self, id: &str, change: AppointmentChange) -> HospitalResult<Appointment> {
        Self::require_future(change.scheduled_for)?;

        let current = self
            .repo
            .find_by_id(id)
            .ok_or_else(|| HospitalError::NotFound {
                kind: EntityKind::Appointment,
                id: id.to_owned(),
            })?;
        self.require_patient(&current.patient_id)?;

        self.repo.modify(id, |appointment| {
            if appointment.status.is_terminal() {
                return Err(HospitalError::InvalidTransition(format!(
                    "appointment {} is {}, only scheduled appointments can be changed",
                    appointment.id, appointment.status
                )));
            }
            appointment.scheduled_for = change.scheduled_for;
            appointment.kind = change.kind;
            Ok(appointment.clone())
        })
    }

    /// Deletes an appointment regardless of status (administrative
    /// correction); returns whether anything was removed. Medical records
    /// that reference the appointment are left in place, see
    /// [`crate::records`] for how dangling references are handled.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.repo.remove(id);
        if removed {
            tracing::info!("deleted appointment {}", id);
        }
        removed
    }

    pub fn find_by_id(&self, id: &str) -> Option<Appointment> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<Appointment> {
        self.repo.find_all()
    }

    /// Read-only existence check used by dependent services.
    pub fn exists(&self, id: &str) -> bool {
        self.repo.find_by_id(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::NewPatient;
    use chrono::{Duration, NaiveDate};

    fn setup() -> (Arc<PatientService>, AppointmentService, String) {
        let cfg = CoreConfig::default();
        let patients = Arc::new(PatientService::new(&cfg));
        let patient = patients
            .register(NewPatient {
                name: NonEmptyText::new("Alice").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .expect("register should succeed");
        let appointments = AppointmentService::new(&cfg, Arc::clone(&patients));
        (patients, appointments, patient.id)
    }

    fn checkup(patient_id: &str) -> NewAppointment {
        NewAppointment {
            patient_id: patient_id.to_owned(),
            scheduled_for: Utc::now() + Duration::hours(2),
            kind: NonEmptyText::new("Checkup").unwrap(),
        }
    }

    #[test]
    fn schedule_starts_in_the_scheduled_state() {
        let (_patients, appointments, patient_id) = setup();

        let appointment = appointments
            .schedule(checkup(&patient_id))
            .expect("schedule should succeed");

        assert_eq!(appointment.id, "A1001");
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.patient_id, patient_id);
    }

    #[test]
    fn schedule_rejects_past_times_and_unknown_patients() {
        let (_patients, appointments, patient_id) = setup();

        let mut past = checkup(&patient_id);
        past.scheduled_for = Utc::now() - Duration::hours(1);
        let err = appointments
            .schedule(past)
            .expect_err("past time should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));

        let err = appointments
            .schedule(checkup("P999"))
            .expect_err("unknown patient should be rejected");
        assert!(matches!(
            err,
            HospitalError::MissingReference {
                kind: EntityKind::Patient,
                ..
            }
        ));
        assert!(appointments.find_all().is_empty(), "store should be unchanged");
    }

    #[test]
    fn complete_then_cancel_fails_and_vice_versa() {
        let (_patients, appointments, patient_id) = setup();

        let first = appointments.schedule(checkup(&patient_id)).unwrap();
        let completed = appointments.complete(&first.id).expect("complete should succeed");
        assert_eq!(completed.status, AppointmentStatus::Completed);
        let err = appointments
            .cancel(&first.id)
            .expect_err("cancelling a completed appointment should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));

        let second = appointments.schedule(checkup(&patient_id)).unwrap();
        let cancelled = appointments.cancel(&second.id).expect("cancel should succeed");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        let err = appointments
            .complete(&second.id)
            .expect_err("completing a cancelled appointment should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));
    }

    #[test]
    fn update_rebooks_only_while_scheduled_and_preserves_the_link() {
        let (_patients, appointments, patient_id) = setup();
        let appointment = appointments.schedule(checkup(&patient_id)).unwrap();

        let new_time = Utc::now() + Duration::days(3);
        let updated = appointments
            .update(
                &appointment.id,
                AppointmentChange {
                    scheduled_for: new_time,
                    kind: NonEmptyText::new("Follow-up").unwrap(),
                },
            )
            .expect("update should succeed");
        assert_eq!(updated.patient_id, patient_id);
        assert_eq!(updated.kind.as_str(), "Follow-up");
        assert_eq!(updated.status, AppointmentStatus::Scheduled);

        appointments.complete(&appointment.id).unwrap();
        let err = appointments
            .update(
                &appointment.id,
                AppointmentChange {
                    scheduled_for: Utc::now() + Duration::days(4),
                    kind: NonEmptyText::new("Checkup").unwrap(),
                },
            )
            .expect_err("updating a completed appointment should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));
    }

    #[test]
    fn update_rejects_past_times() {
        let (_patients, appointments, patient_id) = setup();
        let appointment = appointments.schedule(checkup(&patient_id)).unwrap();

        let err = appointments
            .update(
                &appointment.id,
                AppointmentChange {
                    scheduled_for: Utc::now() - Duration::minutes(5),
                    kind: NonEmptyText::new("Checkup").unwrap(),
                },
            )
            .expect_err("past time should be rejected on update");
        assert!(matches!(err, HospitalError::InvalidInput(_)));

        let stored = appointments.find_by_id(&appointment.id).unwrap();
        assert_eq!(stored.scheduled_for, appointment.scheduled_for);
    }

    #[test]
    fn delete_works_regardless_of_status() {
        let (_patients, appointments, patient_id) = setup();

        let completed = appointments.schedule(checkup(&patient_id)).unwrap();
        appointments.complete(&completed.id).unwrap();
        assert!(appointments.delete(&completed.id));

        assert!(!appointments.delete("A9999"));
    }

    #[test]
    fn racing_cancellations_admit_exactly_one_winner() {
        let (_patients, appointments, patient_id) = setup();
        let appointment = appointments.schedule(checkup(&patient_id)).unwrap();

        let appointments = Arc::new(appointments);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let appointments = Arc::clone(&appointments);
            let id = appointment.id.clone();
            handles.push(std::thread::spawn(move || appointments.cancel(&id).is_ok()));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("cancel thread should not panic"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1, "exactly one concurrent cancel should succeed");
    }
}
