//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. Nothing here is read from the environment during request
//! handling, which keeps behaviour consistent across multi-threaded callers
//! and test harnesses.

use crate::error::{HospitalError, HospitalResult};

/// How one entity family's ids are allocated: a short prefix and the first
/// number handed out. `IdScheme::new("P", 101)` yields `P101`, `P102`, …
#[derive(Clone, Debug)]
pub struct IdScheme {
    prefix: String,
    start: u64,
}

impl IdScheme {
    /// Create a new `IdScheme`.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the prefix is empty or
    /// contains anything other than ASCII letters.
    pub fn new(prefix: impl Into<String>, start: u64) -> HospitalResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(HospitalError::InvalidInput(
                "id prefix cannot be empty".into(),
            ));
        }
        if !prefix.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(HospitalError::InvalidInput(format!(
                "id prefix {prefix:?} must contain only ASCII letters"
            )));
        }
        Ok(Self { prefix, start })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn start(&self) -> u64 {
        self.start
    }
}

/// Core configuration resolved at startup.
///
/// Carries the id-allocation scheme for each entity family. The defaults
/// reproduce the numbering the hospital has always used on printed
/// paperwork (`P101`, `A1001`, `MR10001`, `B101`, `INV101`).
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patients: IdScheme,
    appointments: IdScheme,
    medical_records: IdScheme,
    bills: IdScheme,
    inventory: IdScheme,
}

impl CoreConfig {
    /// Create a new `CoreConfig` from explicit id schemes.
    pub fn new(
        patients: IdScheme,
        appointments: IdScheme,
        medical_records: IdScheme,
        bills: IdScheme,
        inventory: IdScheme,
    ) -> Self {
        Self {
            patients,
            appointments,
            medical_records,
            bills,
            inventory,
        }
    }

    pub fn patients(&self) -> &IdScheme {
        &self.patients
    }

    pub fn appointments(&self) -> &IdScheme {
        &self.appointments
    }

    pub fn medical_records(&self) -> &IdScheme {
        &self.medical_records
    }

    pub fn bills(&self) -> &IdScheme {
        &self.bills
    }

    pub fn inventory(&self) -> &IdScheme {
        &self.inventory
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        // The new() calls cannot fail: the prefixes are fixed ASCII letters.
        Self::new(
            IdScheme::new("P", 101).unwrap(),
            IdScheme::new("A", 1001).unwrap(),
            IdScheme::new("MR", 10001).unwrap(),
            IdScheme::new("B", 101).unwrap(),
            IdScheme::new("INV", 101).unwrap(),
        )
    }
}
