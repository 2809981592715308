//! Service-side id allocation.
//!
//! Every entity id is assigned by its owning service, never by the caller.
//! An allocator is a prefix plus an atomic counter, so ids within one entity
//! family are unique and monotonically distinguishing for the lifetime of
//! the process. Numbers are never reused, even after deletes.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::IdScheme;

/// Allocates ids of the form `<prefix><counter>`, e.g. `P101`, `P102`, …
#[derive(Debug)]
pub struct IdAllocator {
    prefix: String,
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator that hands out ids according to `scheme`.
    pub fn new(scheme: &IdScheme) -> Self {
        Self {
            prefix: scheme.prefix().to_owned(),
            next: AtomicU64::new(scheme.start()),
        }
    }

    /// Returns the next id. Safe to call from any number of threads; two
    /// concurrent calls never observe the same number.
    pub fn allocate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
