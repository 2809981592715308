//! Error taxonomy for the hospital domain core.
//!
//! Every service method fails fast with one of these variants and leaves its
//! store unmodified. The facade passes errors through untranslated; turning
//! them into user-facing text is the presentation layer's job.

use std::fmt;

/// The entity families managed by the domain core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Patient,
    Appointment,
    MedicalRecord,
    Bill,
    InventoryItem,
}

impl EntityKind {
    /// Lower-case label used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Patient => "patient",
            EntityKind::Appointment => "appointment",
            EntityKind::MedicalRecord => "medical record",
            EntityKind::Bill => "bill",
            EntityKind::InventoryItem => "inventory item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    /// A field-level invariant failed before any mutation took place.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation targeted an id absent from the store.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// An insert was attempted with an id that is already in use. Ids are
    /// service-allocated, so this only fires if the allocator is misused.
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: String },

    /// A referenced entity does not exist.
    #[error("referenced {kind} {id} does not exist")]
    MissingReference { kind: EntityKind, id: String },

    /// Two references on the same entity disagree with each other.
    #[error("reference mismatch: {0}")]
    ReferenceMismatch(String),

    /// A state-machine operation was attempted from a state that forbids it.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The entity's current contents rule the operation out.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The facade was asked for a service that was never wired in.
    #[error("{0} service is not configured")]
    ServiceUnavailable(&'static str),
}

impl From<ward_types::TextError> for HospitalError {
    fn from(err: ward_types::TextError) -> Self {
        HospitalError::InvalidInput(err.to_string())
    }
}

impl From<ward_types::MoneyError> for HospitalError {
    fn from(err: ward_types::MoneyError) -> Self {
        HospitalError::InvalidInput(err.to_string())
    }
}

pub type HospitalResult<T> = std::result::Result<T, HospitalError>;
