//! Rendering of entities and errors for the console.
//!
//! This is the only place domain errors are turned into user-facing text;
//! the core's error kinds cross the facade untranslated.

use ward_core::{Appointment, Bill, HospitalError, InventoryItem, MedicalRecord, Patient};

/// Maps an error kind to the text the operator sees.
pub fn describe(err: &HospitalError) -> String {
    match err {
        HospitalError::InvalidInput(msg) => format!("That input was not accepted: {msg}."),
        HospitalError::NotFound { kind, id } => format!("No {kind} with id {id} exists."),
        HospitalError::DuplicateId { kind, id } => {
            format!("A {kind} with id {id} already exists.")
        }
        HospitalError::MissingReference { kind, id } => {
            format!("The referenced {kind} {id} does not exist.")
        }
        HospitalError::ReferenceMismatch(msg) => format!("Those references disagree: {msg}."),
        HospitalError::InvalidTransition(msg) => format!("That is no longer possible: {msg}."),
        HospitalError::InvalidState(msg) => format!("Not in a state that allows it: {msg}."),
        HospitalError::ServiceUnavailable(service) => {
            format!("The {service} desk is not available in this console.")
        }
    }
}

pub fn patient_line(patient: &Patient) -> String {
    format!(
        "{}  {}  born {} (age {})  {}",
        patient.id,
        patient.name,
        patient.date_of_birth,
        patient.age(),
        if patient.admitted { "admitted" } else { "not admitted" }
    )
}

pub fn appointment_line(appointment: &Appointment) -> String {
    format!(
        "{}  patient {}  {}  {}  [{}]",
        appointment.id,
        appointment.patient_id,
        appointment.scheduled_for.format("%Y-%m-%d %H:%M"),
        appointment.kind,
        appointment.status
    )
}

pub fn record_line(record: &MedicalRecord) -> String {
    let notes = if record.notes.is_empty() {
        String::new()
    } else {
        format!("  ({})", record.notes)
    };
    format!(
        "{}  patient {}  appointment {}  {}  {}{}",
        record.id, record.patient_id, record.appointment_id, record.recorded_on, record.diagnosis, notes
    )
}

pub fn bill_line(bill: &Bill) -> String {
    let reference = bill
        .payment_reference
        .as_ref()
        .map(|r| format!("  ref {r}"))
        .unwrap_or_default();
    format!(
        "{}  patient {}  {} item(s)  total {}  [{}]{}",
        bill.id,
        bill.patient_id,
        bill.line_items.len(),
        bill.total(),
        bill.status,
        reference
    )
}

pub fn item_line(item: &InventoryItem) -> String {
    format!(
        "{}  {}  {} in stock  @ {}",
        item.id, item.name, item.quantity, item.unit_price
    )
}
