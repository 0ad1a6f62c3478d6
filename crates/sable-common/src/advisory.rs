//! Advisory cache slot.
//!
//! A holder for a lazily computed, always-recomputable value. The host may
//! evict the value at any time (memory pressure, explicit flush); eviction
//! only costs recomputation, never correctness, because every advisory value
//! is derived from authoritative scope/store data.

use std::sync::{Arc, RwLock};

pub struct Advisory<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Advisory<T> {
    pub fn new() -> Self {
        Advisory { slot: RwLock::new(None) }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the cached value, computing and publishing it on a miss.
    /// Double-checked: concurrent callers may both compute, but one value
    /// wins and both callers observe the winner.
    pub fn get_or_init<F: FnOnce() -> T>(&self, compute: F) -> Arc<T> {
        if let Some(value) = self.get() {
            return value;
        }
        let fresh = Arc::new(compute());
        let mut guard = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            Some(existing) => Arc::clone(existing),
            None => {
                *guard = Some(Arc::clone(&fresh));
                fresh
            }
        }
    }

    /// Drops the cached value. The next `get_or_init` recomputes.
    pub fn evict(&self) {
        let mut guard = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

impl<T> Default for Advisory<T> {
    fn default() -> Self {
        Self::new()
    }
}
