//! List screen model.
//!
//! # Responsibility
//! - Expose the store's all-crimes stream unmodified.
//! - Forward add and swipe-to-delete actions to store writes.

use crate::model::crime::{Crime, CrimeId};
use crate::store::crime_store::{CrimeStore, StoreResult};
use crate::store::subscription::Subscription;
use std::sync::Arc;

/// Model backing the crime list screen.
pub struct CrimeListModel {
    store: Arc<CrimeStore>,
}

impl CrimeListModel {
    /// Creates a model over an explicitly provided store.
    pub fn new(store: Arc<CrimeStore>) -> Self {
        Self { store }
    }

    /// Subscribes to the all-crimes stream for the screen's visible
    /// lifetime; dropping the handle detaches the observer.
    pub fn crimes(&self) -> StoreResult<Subscription<Vec<Crime>>> {
        self.store.crimes()
    }

    /// Persists a freshly created record.
    pub fn add_crime(&self, crime: Crime) -> StoreResult<()> {
        self.store.add_crime(crime)
    }

    /// Removes a record by identity.
    pub fn delete_crime(&self, id: CrimeId) -> StoreResult<()> {
        self.store.delete_crime(id)
    }
}
