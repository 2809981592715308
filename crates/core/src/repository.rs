//! Generic keyed storage for one entity family.
//!
//! Each service owns exactly one `Repository` for its entity type. The
//! repository is the only place entities live; everything callers receive is
//! a clone, so mutating a returned value never touches the stored copy.
//! Mutation goes through [`Repository::replace`] or [`Repository::modify`],
//! which keeps the stored value authoritative.
//!
//! All operations serialise on one `RwLock`, so a uniqueness check-and-insert
//! is atomic and `find_all` never observes a partially written entity.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{EntityKind, HospitalError, HospitalResult};

/// Minimal interface an entity must offer to be stored.
pub trait Entity: Clone {
    /// The family this entity belongs to, used in error reporting.
    const KIND: EntityKind;

    /// Returns the entity's id.
    fn id(&self) -> &str;
}

/// In-memory store keyed by entity id, preserving insertion order.
#[derive(Debug)]
pub struct Repository<T> {
    entries: RwLock<Vec<T>>,
}

impl<T: Entity> Repository<T> {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    // A poisoned lock means another thread panicked while holding the guard.
    // Mutations are prepared on a draft and applied in one assignment, so the
    // stored data is still consistent; recover the guard and carry on.
    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a new entity.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::DuplicateId` if an entity with the same id is
    /// already stored. The check and the insert happen under one write lock,
    /// so two concurrent inserts of the same id cannot both succeed.
    pub fn insert(&self, entity: T) -> HospitalResult<()> {
        let mut entries = self.write();
        if entries.iter().any(|e| e.id() == entity.id()) {
            return Err(HospitalError::DuplicateId {
                kind: T::KIND,
                id: entity.id().to_owned(),
            });
        }
        entries.push(entity);
        Ok(())
    }

    /// Returns a clone of the stored entity, or `None` if the id is unknown.
    pub fn find_by_id(&self, id: &str) -> Option<T> {
        self.read().iter().find(|e| e.id() == id).cloned()
    }

    /// Returns a snapshot of all entities in insertion order.
    ///
    /// The returned vector is a copy; mutating it does not affect the store.
    pub fn find_all(&self) -> Vec<T> {
        self.read().clone()
    }

    /// Replaces the stored entity wholesale. No partial field merge.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::NotFound` if no entity with that id exists.
    pub fn replace(&self, entity: T) -> HospitalResult<()> {
        let mut entries = self.write();
        match entries.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(HospitalError::NotFound {
                kind: T::KIND,
                id: entity.id().to_owned(),
            }),
        }
    }

    /// Removes the entity with the given id.
    ///
    /// Returns whether an entity was removed; `false` is not an error, it
    /// signals there was nothing to delete.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.write();
        match entries.iter().position(|e| e.id() == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Runs a fallible mutation on the stored entity under the write lock.
    ///
    /// This is the primitive behind every state transition: the closure sees
    /// the current state and decides whether the change is legal, and no
    /// other writer can slip in between the check and the write. The closure
    /// operates on a draft; the store is only updated when it returns `Ok`,
    /// so a rejected transition leaves the entity untouched.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::NotFound` if the id is unknown, otherwise
    /// whatever the closure returns.
    pub fn modify<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T) -> HospitalResult<R>,
    ) -> HospitalResult<R> {
        let mut entries = self.write();
        let slot = entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| HospitalError::NotFound {
                kind: T::KIND,
                id: id.to_owned(),
            })?;

        let mut draft = slot.clone();
        let outcome = f(&mut draft)?;
        *slot = draft;
        Ok(outcome)
    }
}

impl<T: Entity> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}
