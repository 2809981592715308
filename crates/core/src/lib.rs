//! # Ward Core
//!
//! Domain service layer for hospital administrative data: patients,
//! appointments, medical records, bills and inventory stock.
//!
//! The layer is a set of entity stores and business-rule enforcers that
//! guarantee referential integrity, valid state transitions and numeric
//! invariants across the five entity families. It behaves identically
//! whether driven by a GUI, a CLI or a test harness; the [`Hospital`]
//! facade is the single contract adapters depend on.
//!
//! Calls flow one direction: adapter → [`Hospital`] → service →
//! [`Repository`]. Services never call each other's mutating operations,
//! only read-only existence checks, so there are no hidden cross-service
//! side effects.
//!
//! **No presentation concerns**: input collection, display formatting and
//! role policy belong to the adapter crates. Storage is memory-resident;
//! the contracts are written so a durable store could be swapped in behind
//! the same operations and error taxonomy.

pub mod appointments;
pub mod billing;
pub mod config;
pub mod error;
pub mod facade;
mod id;
pub mod inventory;
pub mod patients;
pub mod records;
pub mod repository;

pub use appointments::{
    Appointment, AppointmentChange, AppointmentService, AppointmentStatus, NewAppointment,
};
pub use billing::{Bill, BillStatus, BillingService, LineItem};
pub use config::{CoreConfig, IdScheme};
pub use error::{EntityKind, HospitalError, HospitalResult};
pub use facade::Hospital;
pub use inventory::{InventoryItem, InventoryItemChange, InventoryService, NewInventoryItem};
pub use patients::{NewPatient, Patient, PatientService};
pub use records::{MedicalRecord, MedicalRecordChange, MedicalRecordService, NewMedicalRecord};
pub use repository::{Entity, Repository};

// Validated primitives are re-exported so adapters only need this crate.
pub use ward_types::{Money, MoneyError, NonEmptyText, TextError};
