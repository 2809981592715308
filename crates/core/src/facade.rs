//! Single entry point for external callers.
//!
//! The [`Hospital`] facade exposes every service operation through one
//! surface so that adapters (GUI, CLI, test harnesses) depend on one
//! contract rather than five. It performs no business logic: each method
//! resolves its service handle, failing with
//! [`HospitalError::ServiceUnavailable`] if that service was never wired
//! in, and otherwise passes the call through with the error untranslated.

use std::sync::Arc;

use crate::appointments::{Appointment, AppointmentChange, AppointmentService, NewAppointment};
use crate::billing::{Bill, BillingService, LineItem};
use crate::config::CoreConfig;
use crate::error::{HospitalError, HospitalResult};
use crate::inventory::{InventoryItem, InventoryItemChange, InventoryService, NewInventoryItem};
use crate::patients::{NewPatient, Patient, PatientService};
use crate::records::{MedicalRecord, MedicalRecordChange, MedicalRecordService, NewMedicalRecord};

/// Aggregated entry point over the five domain services.
#[derive(Default)]
pub struct Hospital {
    patients: Option<Arc<PatientService>>,
    appointments: Option<Arc<AppointmentService>>,
    records: Option<Arc<MedicalRecordService>>,
    billing: Option<Arc<BillingService>>,
    inventory: Option<Arc<InventoryService>>,
}

impl Hospital {
    /// A facade with no services wired in. Every operation fails with
    /// `ServiceUnavailable` until the matching `with_*` setter is called.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Wires up all five services with the standard dependency graph:
    /// appointments, records and billing existence-check patients, and
    /// records additionally existence-check appointments.
    pub fn with_defaults(cfg: &CoreConfig) -> Self {
        let patients = Arc::new(PatientService::new(cfg));
        let appointments = Arc::new(AppointmentService::new(cfg, Arc::clone(&patients)));
        let records = Arc::new(MedicalRecordService::new(
            cfg,
            Arc::clone(&patients),
            Arc::clone(&appointments),
        ));
        let billing = Arc::new(BillingService::new(cfg, Arc::clone(&patients)));
        let inventory = Arc::new(InventoryService::new(cfg));

        Self {
            patients: Some(patients),
            appointments: Some(appointments),
            records: Some(records),
            billing: Some(billing),
            inventory: Some(inventory),
        }
    }

    pub fn with_patients(mut self, service: Arc<PatientService>) -> Self {
        self.patients = Some(service);
        self
    }

    pub fn with_appointments(mut self, service: Arc<AppointmentService>) -> Self {
        self.appointments = Some(service);
        self
    }

    pub fn with_records(mut self, service: Arc<MedicalRecordService>) -> Self {
        self.records = Some(service);
        self
    }

    pub fn with_billing(mut self, service: Arc<BillingService>) -> Self {
        self.billing = Some(service);
        self
    }

    pub fn with_inventory(mut self, service: Arc<InventoryService>) -> Self {
        self.inventory = Some(service);
        self
    }

    fn patients(&self) -> HospitalResult<&PatientService> {
        self.patients
            .as_deref()
            .ok_or(HospitalError::ServiceUnavailable("patient"))
    }

    fn appointments(&self) -> HospitalResult<&AppointmentService> {
        self.appointments
            .as_deref()
            .ok_or(HospitalError::ServiceUnavailable("appointment"))
    }

    fn records(&self) -> HospitalResult<&MedicalRecordService> {
        self.records
            .as_deref()
            .ok_or(HospitalError::ServiceUnavailable("medical record"))
    }

    fn billing(&self) -> HospitalResult<&BillingService> {
        self.billing
            .as_deref()
            .ok_or(HospitalError::ServiceUnavailable("billing"))
    }

    fn inventory(&self) -> HospitalResult<&InventoryService> {
        self.inventory
            .as_deref()
            .ok_or(HospitalError::ServiceUnavailable("inventory"))
    }

    // ------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------

    pub fn register_patient(&self, new: NewPatient) -> HospitalResult<Patient> {
        self.patients()?.register(new)
    }

    pub fn find_patient(&self, id: &str) -> HospitalResult<Option<Patient>> {
        Ok(self.patients()?.find_by_id(id))
    }

    pub fn list_patients(&self) -> HospitalResult<Vec<Patient>> {
        Ok(self.patients()?.find_all())
    }

    pub fn update_patient(&self, patient: Patient) -> HospitalResult<()> {
        self.patients()?.update(patient)
    }

    pub fn delete_patient(&self, id: &str) -> HospitalResult<bool> {
        Ok(self.patients()?.delete(id))
    }

    pub fn admit_patient(&self, id: &str) -> HospitalResult<Patient> {
        self.patients()?.admit(id)
    }

    pub fn discharge_patient(&self, id: &str) -> HospitalResult<Patient> {
        self.patients()?.discharge(id)
    }

    // ------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------

    pub fn schedule_appointment(&self, new: NewAppointment) -> HospitalResult<Appointment> {
        self.appointments()?.schedule(new)
    }

    pub fn find_appointment(&self, id: &str) -> HospitalResult<Option<Appointment>> {
        Ok(self.appointments()?.find_by_id(id))
    }

    pub fn list_appointments(&self) -> HospitalResult<Vec<Appointment>> {
        Ok(self.appointments()?.find_all())
    }

    pub fn update_appointment(
        &self,
        id: &str,
        change: AppointmentChange,
    ) -> HospitalResult<Appointment> {
        self.appointments()?.update(id, change)
    }

    pub fn complete_appointment(&self, id: &str) -> HospitalResult<Appointment> {
        self.appointments()?.complete(id)
    }

    pub fn cancel_appointment(&self, id: &str) -> HospitalResult<Appointment> {
        self.appointments()?.cancel(id)
    }

    pub fn delete_appointment(&self, id: &str) -> HospitalResult<bool> {
        Ok(self.appointments()?.delete(id))
    }

    // ------------------------------------------------------------------
    // Medical records
    // ------------------------------------------------------------------

    pub fn add_medical_record(&self, new: NewMedicalRecord) -> HospitalResult<MedicalRecord> {
        self.records()?.add(new)
    }

    pub fn find_medical_record(&self, id: &str) -> HospitalResult<Option<MedicalRecord>> {
        Ok(self.records()?.find_by_id(id))
    }

    pub fn list_medical_records(&self) -> HospitalResult<Vec<MedicalRecord>> {
        Ok(self.records()?.find_all())
    }

    pub fn update_medical_record(
        &self,
        id: &str,
        change: MedicalRecordChange,
    ) -> HospitalResult<MedicalRecord> {
        self.records()?.update(id, change)
    }

    pub fn delete_medical_record(&self, id: &str) -> HospitalResult<bool> {
        Ok(self.records()?.delete(id))
    }

    // ------------------------------------------------------------------
    // Billing
    // ------------------------------------------------------------------

    pub fn create_bill(&self, patient_id: &str) -> HospitalResult<Bill> {
        self.billing()?.create(patient_id)
    }

    pub fn find_bill(&self, id: &str) -> HospitalResult<Option<Bill>> {
        Ok(self.billing()?.find_by_id(id))
    }

    pub fn list_bills(&self) -> HospitalResult<Vec<Bill>> {
        Ok(self.billing()?.find_all())
    }

    pub fn update_bill(&self, bill: Bill) -> HospitalResult<()> {
        self.billing()?.update(bill)
    }

    pub fn add_line_item(&self, bill_id: &str, item: LineItem) -> HospitalResult<Bill> {
        self.billing()?.add_line_item(bill_id, item)
    }

    pub fn mark_bill_paid(&self, bill_id: &str, payment_reference: &str) -> HospitalResult<Bill> {
        self.billing()?.mark_paid(bill_id, payment_reference)
    }

    pub fn delete_bill(&self, id: &str) -> HospitalResult<bool> {
        Ok(self.billing()?.delete(id))
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    pub fn add_inventory_item(&self, new: NewInventoryItem) -> HospitalResult<InventoryItem> {
        self.inventory()?.add(new)
    }

    pub fn find_inventory_item(&self, id: &str) -> HospitalResult<Option<InventoryItem>> {
        Ok(self.inventory()?.find_by_id(id))
    }

    pub fn list_inventory_items(&self) -> HospitalResult<Vec<InventoryItem>> {
        Ok(self.inventory()?.find_all())
    }

    pub fn update_inventory_item(
        &self,
        id: &str,
        change: InventoryItemChange,
    ) -> HospitalResult<InventoryItem> {
        self.inventory()?.update(id, change)
    }

    pub fn add_stock(&self, id: &str, amount: u32) -> HospitalResult<InventoryItem> {
        self.inventory()?.add_stock(id, amount)
    }

    pub fn remove_stock(&self, id: &str, amount: u32) -> HospitalResult<InventoryItem> {
        self.inventory()?.remove_stock(id, amount)
    }

    pub fn delete_inventory_item(&self, id: &str) -> HospitalResult<bool> {
        Ok(self.inventory()?.delete(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ward_types::NonEmptyText;

    #[test]
    fn unconfigured_facade_reports_the_missing_service() {
        let hospital = Hospital::unconfigured();

        let err = hospital
            .list_patients()
            .expect_err("unwired patient service should be reported");
        assert!(matches!(err, HospitalError::ServiceUnavailable("patient")));

        let err = hospital
            .list_bills()
            .expect_err("unwired billing service should be reported");
        assert!(matches!(err, HospitalError::ServiceUnavailable("billing")));
    }

    #[test]
    fn partially_wired_facade_serves_only_what_it_has() {
        let cfg = CoreConfig::default();
        let patients = Arc::new(PatientService::new(&cfg));
        let hospital = Hospital::unconfigured().with_patients(patients);

        hospital
            .register_patient(NewPatient {
                name: NonEmptyText::new("Alice").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .expect("wired service should work");

        let err = hospital
            .list_appointments()
            .expect_err("unwired appointment service should be reported");
        assert!(matches!(
            err,
            HospitalError::ServiceUnavailable("appointment")
        ));
    }

    #[test]
    fn default_wiring_passes_calls_through_unchanged() {
        let hospital = Hospital::with_defaults(&CoreConfig::default());

        let patient = hospital
            .register_patient(NewPatient {
                name: NonEmptyText::new("Alice").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .expect("register should succeed");

        let found = hospital
            .find_patient(&patient.id)
            .expect("patient service is wired")
            .expect("patient should be found");
        assert_eq!(found, patient);

        // Errors cross the facade untranslated.
        let err = hospital
            .create_bill("P999")
            .expect_err("unknown patient should be rejected");
        assert!(matches!(err, HospitalError::MissingReference { .. }));
    }
}
