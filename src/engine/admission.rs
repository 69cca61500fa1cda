// src/engine/admission.rs

//! Bounded-concurrency gate.
//!
//! An [`AdmissionController`] hands out at most `capacity` permits at a time.
//! A slot is released by dropping (or explicitly releasing) the
//! [`AdmissionPermit`], so a slot can only be returned by whoever acquired it
//! and is returned exactly once, including when the holder panics.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("concurrency capacity must be >= 1 (got 0)")]
    ZeroCapacity,

    #[error("admission controller is closed")]
    Closed,
}

/// Counting semaphore owned by a scheduler.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionController {
    pub fn new(capacity: usize) -> Result<Self, AdmissionError> {
        if capacity == 0 {
            return Err(AdmissionError::ZeroCapacity);
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until fewer than `capacity` permits are outstanding and take one.
    ///
    /// Waiters are served in arrival order.
    pub async fn acquire(&self) -> Result<AdmissionPermit, AdmissionError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AdmissionError::Closed)?;
        trace!(available = self.available(), "admission slot acquired");
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }
}

/// One admitted slot. Returned to the controller on drop.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    /// Return the slot now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}
