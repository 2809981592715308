//! Stock-item lifecycle and quantity adjustments.
//!
//! Quantities are `u32`, so a negative stock level is unrepresentable.
//! Removing more than is on hand is rejected outright, never clamped, and
//! both adjustments run under the repository write lock so racing
//! withdrawals cannot oversell an item.

use serde::{Deserialize, Serialize};
use ward_types::{Money, NonEmptyText};

use crate::config::CoreConfig;
use crate::error::{EntityKind, HospitalError, HospitalResult};
use crate::id::IdAllocator;
use crate::repository::{Entity, Repository};

/// A stocked supply item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: NonEmptyText,
    pub quantity: u32,
    pub unit_price: Money,
}

impl Entity for InventoryItem {
    const KIND: EntityKind = EntityKind::InventoryItem;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for adding an item; the service assigns the id.
#[derive(Clone, Debug)]
pub struct NewInventoryItem {
    pub name: NonEmptyText,
    pub quantity: u32,
    pub unit_price: Money,
}

/// The caller-editable part of an item. Stock levels move only through
/// [`InventoryService::add_stock`] and [`InventoryService::remove_stock`].
#[derive(Clone, Debug)]
pub struct InventoryItemChange {
    pub name: NonEmptyText,
    pub unit_price: Money,
}

/// Owns the inventory store.
pub struct InventoryService {
    repo: Repository<InventoryItem>,
    ids: IdAllocator,
}

impl InventoryService {
    /// Creates a new `InventoryService`.
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            repo: Repository::new(),
            ids: IdAllocator::new(cfg.inventory()),
        }
    }

    fn require_positive_price(unit_price: Money) -> HospitalResult<()> {
        if !unit_price.is_positive() {
            return Err(HospitalError::InvalidInput(format!(
                "unit price {unit_price} must be greater than zero"
            )));
        }
        Ok(())
    }

    /// Adds a new item to the inventory.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the unit price is not
    /// strictly positive.
    pub fn add(&self, new: NewInventoryItem) -> HospitalResult<InventoryItem> {
        Self::require_positive_price(new.unit_price)?;

        let item = InventoryItem {
            id: self.ids.allocate(),
            name: new.name,
            quantity: new.quantity,
            unit_price: new.unit_price,
        };
        self.repo.insert(item.clone())?;
        tracing::info!("added inventory item {} ({})", item.id, item.name);
        Ok(item)
    }

    /// Increases an item's stock level.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the amount is zero or the
    /// resulting quantity would overflow, or `HospitalError::NotFound` for
    /// an unknown id.
    pub fn add_stock(&self, id: &str, amount: u32) -> HospitalResult<InventoryItem> {
        if amount == 0 {
            return Err(HospitalError::InvalidInput(
                "stock adjustment must be greater than zero".into(),
            ));
        }
        self.repo.modify(id, |item| {
            item.quantity = item.quantity.checked_add(amount).ok_or_else(|| {
                HospitalError::InvalidInput(format!(
                    "adding {amount} units to {} would overflow the stock counter",
                    item.id
                ))
            })?;
            Ok(item.clone())
        })
    }

    /// Decreases an item's stock level. Withdrawing more than is on hand is
    /// rejected and leaves the quantity unchanged.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the amount is zero or
    /// exceeds the current quantity, or `HospitalError::NotFound` for an
    /// unknown id.
    pub fn remove_stock(&self, id: &str, amount: u32) -> HospitalResult<InventoryItem> {
        if amount == 0 {
            return Err(HospitalError::InvalidInput(
                "stock adjustment must be greater than zero".into(),
            ));
        }
        self.repo.modify(id, |item| {
            if amount > item.quantity {
                return Err(HospitalError::InvalidInput(format!(
                    "cannot remove {amount} units of {}: only {} on hand",
                    item.id, item.quantity
                )));
            }
            item.quantity -= amount;
            Ok(item.clone())
        })
    }

    /// Edits an item's name and unit price. The stock level is preserved.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::InvalidInput` if the unit price is not
    /// strictly positive, or `HospitalError::NotFound` for an unknown id.
    pub fn update(&self, id: &str, change: InventoryItemChange) -> HospitalResult<InventoryItem> {
        Self::require_positive_price(change.unit_price)?;
        self.repo.modify(id, |item| {
            item.name = change.name;
            item.unit_price = change.unit_price;
            Ok(item.clone())
        })
    }

    /// Deletes an item; returns whether anything was removed.
    pub fn delete(&self, id: &str) -> bool {
        self.repo.remove(id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<InventoryItem> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<InventoryItem> {
        self.repo.find_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InventoryService {
        InventoryService::new(&CoreConfig::default())
    }

    fn gauze() -> NewInventoryItem {
        NewInventoryItem {
            name: NonEmptyText::new("Gauze").unwrap(),
            quantity: 10,
            unit_price: Money::from_cents(250),
        }
    }

    #[test]
    fn add_assigns_ids_and_requires_a_positive_price() {
        let inventory = service();

        let item = inventory.add(gauze()).expect("add should succeed");
        assert_eq!(item.id, "INV101");
        assert_eq!(item.quantity, 10);

        let err = inventory
            .add(NewInventoryItem {
                name: NonEmptyText::new("Free samples").unwrap(),
                quantity: 5,
                unit_price: Money::ZERO,
            })
            .expect_err("zero price should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn stock_adjustments_must_be_positive() {
        let inventory = service();
        let item = inventory.add(gauze()).unwrap();

        let err = inventory
            .add_stock(&item.id, 0)
            .expect_err("zero adjustment should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));

        let err = inventory
            .remove_stock(&item.id, 0)
            .expect_err("zero adjustment should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn overdrawing_stock_is_rejected_not_clamped() {
        let inventory = service();
        let item = inventory.add(gauze()).unwrap();

        let err = inventory
            .remove_stock(&item.id, 15)
            .expect_err("overdraw should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
        assert_eq!(inventory.find_by_id(&item.id).unwrap().quantity, 10);

        let drained = inventory.remove_stock(&item.id, 10).expect("exact drain is fine");
        assert_eq!(drained.quantity, 0);

        let err = inventory
            .remove_stock(&item.id, 1)
            .expect_err("removing from an empty item should fail");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[test]
    fn remove_then_add_restores_the_original_quantity() {
        let inventory = service();
        let item = inventory.add(gauze()).unwrap();

        inventory.remove_stock(&item.id, 4).unwrap();
        let restored = inventory.add_stock(&item.id, 4).unwrap();
        assert_eq!(restored.quantity, item.quantity);
    }

    #[test]
    fn add_stock_guards_against_counter_overflow() {
        let inventory = service();
        let item = inventory
            .add(NewInventoryItem {
                name: NonEmptyText::new("Saline").unwrap(),
                quantity: u32::MAX - 1,
                unit_price: Money::from_cents(100),
            })
            .unwrap();

        let err = inventory
            .add_stock(&item.id, 2)
            .expect_err("overflowing adjustment should be rejected");
        assert!(matches!(err, HospitalError::InvalidInput(_)));
        assert_eq!(
            inventory.find_by_id(&item.id).unwrap().quantity,
            u32::MAX - 1
        );
    }

    #[test]
    fn update_edits_name_and_price_but_never_stock() {
        let inventory = service();
        let item = inventory.add(gauze()).unwrap();
        inventory.remove_stock(&item.id, 3).unwrap();

        let updated = inventory
            .update(
                &item.id,
                InventoryItemChange {
                    name: NonEmptyText::new("Sterile gauze").unwrap(),
                    unit_price: Money::from_cents(300),
                },
            )
            .expect("update should succeed");

        assert_eq!(updated.name.as_str(), "Sterile gauze");
        assert_eq!(updated.unit_price, Money::from_cents(300));
        assert_eq!(updated.quantity, 7, "stock level must be preserved");
    }

    #[test]
    fn racing_withdrawals_never_oversell() {
        use std::sync::Arc;

        let inventory = Arc::new(service());
        let item = inventory.add(gauze()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let inventory = Arc::clone(&inventory);
            let id = item.id.clone();
            handles.push(std::thread::spawn(move || {
                inventory.remove_stock(&id, 4).is_ok()
            }));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("withdrawal thread should not panic"))
            .filter(|ok| *ok)
            .count();

        // 10 units serve at most two withdrawals of 4.
        assert_eq!(wins, 2);
        assert_eq!(inventory.find_by_id(&item.id).unwrap().quantity, 2);
    }
}
