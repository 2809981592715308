//! Patient lifecycle and admission status.
//!
//! The patient service owns the patient store. Other services hold a handle
//! to it purely for read-only existence checks; they never mutate patients.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ward_types::NonEmptyText;

use crate::config::CoreConfig;
use crate::error::{EntityKind, HospitalError, HospitalResult};
use crate::id::IdAllocator;
use crate::repository::{Entity, Repository};

/// A registered patient.
///
/// Age is always derived from the date of birth, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub admitted: bool,
}

impl Patient {
    /// The patient's age in whole years on the given date. Zero if the date
    /// precedes the date of birth.
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.date_of_birth).unwrap_or(0)
    }

    /// The patient's age in whole years today.
    pub fn age(&self) -> u32 {
        self.age_on(Utc::now().date_naive())
    }
}

impl Entity for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for registering a patient; the service assigns the id.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub date_of_birth: NaiveDate,
}

/// Owns patient lifecycle and admission status.
pub struct PatientService {
    repo: Repository<Patient>,
    ids: IdAllocator,
}

impl PatientService {
    /// Creates a new `PatientService` using the configured id scheme.
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            repo: Repository::new(),
            ids: IdAllocator::new(cfg.patients()),
        }
    }

    /// Registers a new patient. A freshly registered patient is not admitted.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the date of birth is in the
    /// future.
    pub fn register(&self, new: NewPatient) -> HospitalResult<Patient> {
        let today = Utc::now().date_naive();
        if new.date_of_birth > today {
            return Err(HospitalError::InvalidInput(format!(
                "date of birth {} is in the future",
                new.date_of_birth
            )));
        }

        let patient = Patient {
            id: self.ids.allocate(),
            name: new.name,
            date_of_birth: new.date_of_birth,
            admitted: false,
        };
        self.repo.insert(patient.clone())?;
        tracing::info!("registered patient {}", patient.id);
        Ok(patient)
    }

    /// Marks the patient as admitted. Admitting an already-admitted patient
    /// is a no-op, not an error.
    pub fn admit(&self, id: &str) -> HospitalResult<Patient> {
        self.repo.modify(id, |patient| {
            patient.admitted = true;
            Ok(patient.clone())
        })
    }

    /// Marks the patient as discharged. Discharging an already-discharged
    /// patient is a no-op, not an error.
    pub fn discharge(&self, id: &str) -> HospitalResult<Patient> {
        self.repo.modify(id, |patient| {
            patient.admitted = false;
            Ok(patient.clone())
        })
    }

    /// Replaces a patient record wholesale, re-validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the date of birth is in the
    /// future, or `HospitalError::NotFound` if the id is unknown.
    pub fn update(&self, patient: Patient) -> HospitalResult<()> {
        let today = Utc::now().date_naive();
        if patient.date_of_birth > today {
            return Err(HospitalError::InvalidInput(format!(
                "date of birth {} is in the future",
                patient.date_of_birth
            )));
        }
        self.repo.replace(patient)
    }

    /// Deletes a patient; returns whether anything was removed.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.repo.remove(id);
        if removed {
            tracing::info!("deleted patient {}", id);
        }
        removed
    }

    pub fn find_by_id(&self, id: &str) -> Option<Patient> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<Patient> {
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
    use chrono::Duration;

    fn service() -> PatientService {
        PatientService::new(&CoreConfig::default())
    }

    fn alice() -> NewPatient {
        NewPatient {
            name: NonEmptyText::new("Alice").unwrap(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    #[test]
    fn register_assigns_sequential_ids_and_starts_not_admitted() {
        let patients = service();

        let first = patients.register(alice()).expect("register should succeed");
        let second = patients
            .register(NewPatient {
                name: NonEmptyText::new("Bob").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 20).unwrap(),
            })
            .expect("register should succeed");

        assert_eq!(first.id, "P101");
        assert_eq!(second.id, "P102");
        assert!(!first.admitted);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn register_rejects_a_future_date_of_birth() {
        let patients = service();
        let tomorrow = Utc::now().date_naive() + Duration::days(1);

        let err = patients
            .register(NewPatient {
                name: NonEmptyText::new("Unborn").unwrap(),
                date_of_birth: tomorrow,
            })
            .expect_err("future date of birth should be rejected");

        assert!(matches!(err, HospitalError::InvalidInput(_)));
        assert!(patients.find_all().is_empty(), "store should be unchanged");
    }

    #[test]
    fn admit_and_discharge_are_idempotent_toggles() {
        let patients = service();
        let registered = patients.register(alice()).unwrap();

        let admitted = patients.admit(&registered.id).expect("admit should succeed");
        assert!(admitted.admitted);

        // Admitting again is a no-op, not an error.
        let still_admitted = patients.admit(&registered.id).unwrap();
        assert!(still_admitted.admitted);

        let discharged = patients.discharge(&registered.id).unwrap();
        assert!(!discharged.admitted);
        let still_discharged = patients.discharge(&registered.id).unwrap();
        assert!(!still_discharged.admitted);
    }

    #[test]
    fn admit_of_an_unknown_patient_is_not_found() {
        let patients = service();
        let err = patients.admit("P999").expect_err("unknown id should fail");
        assert!(matches!(
            err,
            HospitalError::NotFound {
                kind: EntityKind::Patient,
                ..
            }
        ));
    }

    #[test]
    fn update_replaces_wholesale_and_revalidates() {
        let patients = service();
        let mut registered = patients.register(alice()).unwrap();

        registered.name = NonEmptyText::new("Alice Smith").unwrap();
        patients.update(registered.clone()).expect("update should succeed");
        assert_eq!(
            patients.find_by_id(&registered.id).unwrap().name.as_str(),
            "Alice Smith"
        );

        registered.date_of_birth = Utc::now().date_naive() + Duration::days(30);
        let err = patients
            .update(registered)
            .expect_err("future date of birth should be rejected on update");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn delete_returns_whether_anything_was_removed() {
        let patients = service();
        let registered = patients.register(alice()).unwrap();

        assert!(patients.delete(&registered.id));
        assert!(!patients.delete(&registered.id));
        assert!(!patients.exists(&registered.id));
    }

    #[test]
    fn age_is_derived_from_the_date_of_birth() {
        let patient = Patient {
            id: "P101".into(),
            name: NonEmptyText::new("Alice").unwrap(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            admitted: false,
        };

        let on = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(patient.age_on(on), 36);

        let before_birth = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
        assert_eq!(patient.age_on(before_birth), 0);
    }
}
