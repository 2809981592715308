//! Patient billing: bills, line items and payment.
//!
//! A bill starts `Unpaid` with no line items. Items are appended one at a
//! time and are immutable once added; the bill's total is always recomputed
//! from the item list and never cached. `Paid` is terminal: once a bill is
//! paid its line items are frozen and the status never moves back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ward_types::{Money, NonEmptyText};

use crate::config::CoreConfig;
use crate::error::{EntityKind, HospitalError, HospitalResult};
use crate::id::IdAllocator;
use crate::patients::PatientService;
use crate::repository::{Entity, Repository};

/// Where a bill is in its lifecycle. `Paid` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillStatus {
    Unpaid,
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable charge on a bill.
///
/// The fields are private so a line item can only come out of
/// [`LineItem::new`], which guarantees a positive amount. Deserialisation
/// runs the same validation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineItem {
    description: NonEmptyText,
    amount: Money,
}

impl LineItem {
    /// Creates a line item.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the amount is not strictly
    /// positive. An empty description is ruled out by `NonEmptyText`.
    pub fn new(description: NonEmptyText, amount: Money) -> HospitalResult<Self> {
        if !amount.is_positive() {
            return Err(HospitalError::InvalidInput(format!(
                "line item amount {amount} must be greater than zero"
            )));
        }
        Ok(Self {
            description,
            amount,
        })
    }

    pub fn description(&self) -> &NonEmptyText {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

impl<'de> Deserialize<'de> for LineItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            description: NonEmptyText,
            amount: Money,
        }

        let raw = Raw::deserialize(deserializer)?;
        LineItem::new(raw.description, raw.amount).map_err(serde::de::Error::custom)
    }
}

/// A patient's bill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub patient_id: String,
    pub line_items: Vec<LineItem>,
    pub status: BillStatus,
    pub payment_reference: Option<NonEmptyText>,
}

impl Bill {
    /// The sum of all line-item amounts, recomputed on every call.
    pub fn total(&self) -> Money {
        self.line_items
            .iter()
            .fold(Money::ZERO, |acc, item| acc.saturating_add(item.amount()))
    }
}

impl Entity for Bill {
    const KIND: EntityKind = EntityKind::Bill;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Owns the bill store and its payment state machine.
pub struct BillingService {
    repo: Repository<Bill>,
    ids: IdAllocator,
    patients: Arc<PatientService>,
}

impl BillingService {
    /// Creates a new `BillingService`.
    pub fn new(cfg: &CoreConfig, patients: Arc<PatientService>) -> Self {
        Self {
            repo: Repository::new(),
            ids: IdAllocator::new(cfg.bills()),
            patients,
        }
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

    /// Opens an empty, unpaid bill for a patient.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::MissingReference` if the patient does not
    /// exist.
    pub fn create(&self, patient_id: &str) -> HospitalResult<Bill> {
        self.require_patient(patient_id)?;

        let bill = Bill {
            id: self.ids.allocate(),
            patient_id: patient_id.to_owned(),
            line_items: Vec::new(),
            status: BillStatus::Unpaid,
            payment_reference: None,
        };
        self.repo.insert(bill.clone())?;
        tracing::info!("created bill {} for patient {}", bill.id, bill.patient_id);
        Ok(bill)
    }

    /// Appends a line item to an unpaid bill.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidTransition` if the bill is already
    /// paid, or `HospitalError::NotFound` for an unknown id. The item
    /// itself was validated by [`LineItem::new`].
    pub fn add_line_item(&self, bill_id: &str, item: LineItem) -> HospitalResult<Bill> {
        self.repo.modify(bill_id, |bill| {
            if bill.status == BillStatus::Paid {
                return Err(HospitalError::InvalidTransition(format!(
                    "bill {} is already paid, its line items are frozen",
                    bill.id
                )));
            }
            bill.line_items.push(item);
            Ok(bill.clone())
        })
    }

    /// Settles an unpaid bill. The transition is terminal and irreversible.
    ///
    /// # Errors
    ///
    /// - `HospitalError::InvalidInput` if the payment reference is empty.
    /// - `HospitalError::InvalidTransition` if the bill is already paid.
    /// - `HospitalError::InvalidState` if the bill total is not positive;
    ///   an empty bill cannot be settled.
    /// - `HospitalError::NotFound` for an unknown id.
    pub fn mark_paid(&self, bill_id: &str, payment_reference: &str) -> HospitalResult<Bill> {
        let reference = NonEmptyText::new(payment_reference).map_err(|_| {
            HospitalError::InvalidInput("payment reference cannot be empty".into())
        })?;

        let paid = self.repo.modify(bill_id, |bill| {
            if bill.status == BillStatus::Paid {
                return Err(HospitalError::InvalidTransition(format!(
                    "bill {} is already paid",
                    bill.id
                )));
            }
            if !bill.total().is_positive() {
                return Err(HospitalError::InvalidState(format!(
                    "bill {} has no charges and cannot be marked paid",
                    bill.id
                )));
            }
            bill.status = BillStatus::Paid;
            bill.payment_reference = Some(reference.clone());
            Ok(bill.clone())
        })?;
        tracing::info!("bill {} marked paid", paid.id);
        Ok(paid)
    }

    /// Replaces a bill wholesale.
    ///
    /// Status changes are not accepted through this path: settling a bill
    /// goes through [`mark_paid`](Self::mark_paid), and a paid bill is
    /// frozen entirely. In practice this limits `update` to re-describing
    /// the line items of an unpaid bill or moving it to another patient.
    ///
    /// # Errors
    ///
    /// - `HospitalError::InvalidTransition` if the stored bill is paid, or
    ///   if the replacement tries to flip the status either way.
    /// - `HospitalError::MissingReference` if the replacement references an
    ///   unknown patient.
    /// - `HospitalError::NotFound` for an unknown id.
    pub fn update(&self, bill: Bill) -> HospitalResult<()> {
        self.require_patient(&bill.patient_id)?;

        let id = bill.id.clone();
        self.repo.modify(&id, move |stored| {
            if stored.status == BillStatus::Paid {
                return Err(HospitalError::InvalidTransition(format!(
                    "bill {} is paid and can no longer be edited",
                    stored.id
                )));
            }
            if bill.status == BillStatus::Paid {
                return Err(HospitalError::InvalidTransition(
                    "a bill cannot be settled through update, use mark_paid".into(),
                ));
            }
            *stored = bill;
            Ok(())
        })
    }

    /// Deletes a bill; returns whether anything was removed.
    pub fn delete(&self, id: &str) -> bool {
        self.repo.remove(id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Bill> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<Bill> {
        self.repo.find_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::NewPatient;
    use chrono::NaiveDate;

    fn setup() -> (Arc<PatientService>, BillingService, String) {
        let cfg = CoreConfig::default();
        let patients = Arc::new(PatientService::new(&cfg));
        let patient = patients
            .register(NewPatient {
                name: NonEmptyText::new("Alice").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .unwrap();
        let billing = BillingService::new(&cfg, Arc::clone(&patients));
        (patients, billing, patient.id)
    }

    fn item(description: &str, cents: i64) -> LineItem {
        LineItem::new(
            NonEmptyText::new(description).unwrap(),
            Money::from_cents(cents),
        )
        .expect("test line item should be valid")
    }

    #[test]
    fn create_requires_an_existing_patient() {
        let (_patients, billing, patient_id) = setup();

        let bill = billing.create(&patient_id).expect("create should succeed");
        assert_eq!(bill.id, "B101");
        assert_eq!(bill.status, BillStatus::Unpaid);
        assert!(bill.line_items.is_empty());
        assert_eq!(bill.total(), Money::ZERO);

        let err = billing
            .create("P999")
            .expect_err("unknown patient should be rejected");
        assert!(matches!(
            err,
            HospitalError::MissingReference {
                kind: EntityKind::Patient,
                ..
            }
        ));
    }

    #[test]
    fn line_items_require_a_positive_amount() {
        let err = LineItem::new(NonEmptyText::new("X-ray").unwrap(), Money::ZERO)
            .expect_err("zero amount should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));

        let err = LineItem::new(NonEmptyText::new("X-ray").unwrap(), Money::from_cents(-100))
            .expect_err("negative amount should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn total_tracks_the_line_item_list() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();

        let after_one = billing
            .add_line_item(&bill.id, item("X-ray", 15_000))
            .expect("add_line_item should succeed");
        assert_eq!(after_one.total(), Money::from_cents(15_000));

        let after_two = billing
            .add_line_item(&bill.id, item("Bandages", 2_050))
            .unwrap();
        assert_eq!(after_two.total(), Money::from_cents(17_050));
        assert_eq!(after_two.line_items.len(), 2);
    }

    #[test]
    fn mark_paid_settles_exactly_once() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();

        let paid = billing
            .mark_paid(&bill.id, "REF1")
            .expect("mark_paid should succeed");
        assert_eq!(paid.status, BillStatus::Paid);
        assert_eq!(paid.payment_reference.as_ref().unwrap().as_str(), "REF1");

        let err = billing
            .mark_paid(&bill.id, "REF2")
            .expect_err("second settlement should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));
    }

    #[test]
    fn an_empty_bill_cannot_be_marked_paid() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();

        let err = billing
            .mark_paid(&bill.id, "REF1")
            .expect_err("empty bill should not be payable");
        assert!(matches!(err, HospitalError::InvalidState(_)));

        // Still unpaid, so charges can be added and payment retried.
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();
        billing.mark_paid(&bill.id, "REF1").expect("retry should succeed");
    }

    #[test]
    fn mark_paid_requires_a_payment_reference() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();

        let err = billing
            .mark_paid(&bill.id, "  ")
            .expect_err("blank reference should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
        assert_eq!(
            billing.find_by_id(&bill.id).unwrap().status,
            BillStatus::Unpaid
        );
    }

    #[test]
    fn paid_bills_are_frozen() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();
        billing.mark_paid(&bill.id, "REF1").unwrap();

        let err = billing
            .add_line_item(&bill.id, item("Extra", 1_000))
            .expect_err("adding to a paid bill should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));

        // A wholesale replace cannot touch a paid bill either.
        let mut replacement = billing.find_by_id(&bill.id).unwrap();
        replacement.status = BillStatus::Unpaid;
        let err = billing
            .update(replacement)
            .expect_err("reverting a paid bill should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));

        let stored = billing.find_by_id(&bill.id).unwrap();
        assert_eq!(stored.status, BillStatus::Paid);
        assert_eq!(stored.line_items.len(), 1);
    }

    #[test]
    fn update_cannot_settle_a_bill() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();

        let mut replacement = billing.find_by_id(&bill.id).unwrap();
        replacement.status = BillStatus::Paid;
        let err = billing
            .update(replacement)
            .expect_err("settling through update should fail");
        assert!(matches!(err, HospitalError::InvalidTransition(_)));
    }

    #[test]
    fn update_replaces_an_unpaid_bill_wholesale() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();

        let mut replacement = billing.find_by_id(&bill.id).unwrap();
        replacement.line_items = vec![item("Chest X-ray", 15_000)];
        billing.update(replacement).expect("update should succeed");

        let stored = billing.find_by_id(&bill.id).unwrap();
        assert_eq!(stored.line_items[0].description().as_str(), "Chest X-ray");
    }

    #[test]
    fn racing_settlements_admit_exactly_one_winner() {
        let (_patients, billing, patient_id) = setup();
        let bill = billing.create(&patient_id).unwrap();
        billing.add_line_item(&bill.id, item("X-ray", 15_000)).unwrap();

        let billing = Arc::new(billing);
        let mut handles = Vec::new();
        for n in 0..4 {
            let billing = Arc::clone(&billing);
            let id = bill.id.clone();
            handles.push(std::thread::spawn(move || {
                billing.mark_paid(&id, &format!("REF{n}")).is_ok()
            }));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("payment thread should not panic"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1, "exactly one concurrent settlement should succeed");
    }
}
