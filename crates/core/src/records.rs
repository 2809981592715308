//! Medical records linking patients to appointments.
//!
//! A record ties a patient and one of their appointments to a diagnosis.
//! The patient/appointment linkage is fixed at creation; updates may only
//! touch the diagnosis and notes.
//!
//! Appointments can be deleted administratively without cascading here, so
//! a stored record may reference an appointment that no longer exists.
//! Lookups tolerate that: [`MedicalRecordService::appointment_of`] simply
//! returns `None` for a dangling reference.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ward_types::NonEmptyText;

use crate::appointments::{Appointment, AppointmentService};
use crate::config::CoreConfig;
use crate::error::{EntityKind, HospitalError, HospitalResult};
use crate::id::IdAllocator;
use crate::patients::{Patient, PatientService};
use crate::repository::{Entity, Repository};

/// A diagnosis recorded against a patient's appointment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub appointment_id: String,
    pub diagnosis: NonEmptyText,
    pub notes: String,
    pub recorded_on: NaiveDate,
}

impl Entity for MedicalRecord {
    const KIND: EntityKind = EntityKind::MedicalRecord;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for adding a medical record; the service assigns the id.
#[derive(Clone, Debug)]
pub struct NewMedicalRecord {
    pub patient_id: String,
    pub appointment_id: String,
    pub diagnosis: NonEmptyText,
    pub notes: String,
    pub recorded_on: NaiveDate,
}

/// The caller-editable part of a record. The patient/appointment linkage
/// and the recorded date are immutable after creation.
#[derive(Clone, Debug)]
pub struct MedicalRecordChange {
    pub diagnosis: NonEmptyText,
    pub notes: String,
}

/// Owns the medical record store.
pub struct MedicalRecordService {
    repo: Repository<MedicalRecord>,
    ids: IdAllocator,
    patients: Arc<PatientService>,
    appointments: Arc<AppointmentService>,
}

impl MedicalRecordService {
    /// Creates a new `MedicalRecordService`.
    pub fn new(
        cfg: &CoreConfig,
        patients: Arc<PatientService>,
        appointments: Arc<AppointmentService>,
    ) -> Self {
        Self {
            repo: Repository::new(),
            ids: IdAllocator::new(cfg.medical_records()),
            patients,
            appointments,
        }
    }

    /// Adds a new medical record.
    ///
    /// # Errors
    ///
    /// - `HospitalError::InvalidInput` if the record date is in the future.
    /// - `HospitalError::MissingReference` if the patient or appointment
    ///   does not exist.
    /// - `HospitalError::ReferenceMismatch` if the appointment belongs to a
    ///   different patient.
    pub fn add(&self, new: NewMedicalRecord) -> HospitalResult<MedicalRecord> {
        let today = Utc::now().date_naive();
        if new.recorded_on > today {
            return Err(HospitalError::InvalidInput(format!(
                "record date {} is in the future",
                new.recorded_on
            )));
        }

        if !self.patients.exists(&new.patient_id) {
            return Err(HospitalError::MissingReference {
                kind: EntityKind::Patient,
                id: new.patient_id,
            });
        }
        let appointment = self
            .appointments
            .find_by_id(&new.appointment_id)
            .ok_or_else(|| HospitalError::MissingReference {
                kind: EntityKind::Appointment,
                id: new.appointment_id.clone(),
            })?;
        if appointment.patient_id != new.patient_id {
            return Err(HospitalError::ReferenceMismatch(format!(
                "appointment {} belongs to patient {}, not {}",
                appointment.id, appointment.patient_id, new.patient_id
            )));
        }

        let record = MedicalRecord {
            id: self.ids.allocate(),
            patient_id: new.patient_id,
            appointment_id: new.appointment_id,
            diagnosis: new.diagnosis,
            notes: new.notes,
            recorded_on: new.recorded_on,
        };
        self.repo.insert(record.clone())?;
        tracing::info!(
            "added medical record {} for patient {}",
            record.id,
            record.patient_id
        );
        Ok(record)
    }

    /// Edits the diagnosis and notes of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::NotFound` if the id is unknown.
    pub fn update(&self, id: &str, change: MedicalRecordChange) -> HospitalResult<MedicalRecord> {
        self.repo.modify(id, |record| {
            record.diagnosis = change.diagnosis;
            record.notes = change.notes;
            Ok(record.clone())
        })
    }

    /// Deletes a record; returns whether anything was removed.
    pub fn delete(&self, id: &str) -> bool {
        self.repo.remove(id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<MedicalRecord> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<MedicalRecord> {
        self.repo.find_all()
    }

    /// Fresh snapshot of the record's patient, or `None` if the patient has
    /// since been deleted.
    pub fn patient_of(&self, record: &MedicalRecord) -> Option<Patient> {
        self.patients.find_by_id(&record.patient_id)
    }

    /// Fresh snapshot of the record's appointment. `None` for a dangling
    /// reference left behind by an administrative appointment delete.
    pub fn appointment_of(&self, record: &MedicalRecord) -> Option<Appointment> {
        self.appointments.find_by_id(&record.appointment_id)
    }
}
