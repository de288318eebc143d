//! Detail screen model.
//!
//! # Responsibility
//! - Hold the currently displayed record identity as a single mutable slot.
//! - Re-point one downstream stream at the active identity's store stream.
//! - Flush edited records back to the store at screen-exit checkpoints.
//!
//! # Invariants
//! - At most one per-record subscription is live at a time.
//! - After `load_crime(b)` no snapshot of the previous identity is
//!   delivered; the next observed value belongs to `b`.

use crate::model::crime::{Crime, CrimeId};
use crate::store::crime_store::{CrimeStore, StoreResult};
use crossbeam_channel::{unbounded, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

struct ActiveWatch {
    id: CrimeId,
    subscriber: u64,
}

struct Slot {
    watch: Option<ActiveWatch>,
    updates: Receiver<Option<Crime>>,
}

/// Model backing the crime detail screen.
///
/// The observer subscribes to the model once; `load_crime` switches which
/// record's stream feeds it. An absent record is observed as `None` inside
/// the snapshot, so the consumer can default to a freshly constructed one.
pub struct CrimeDetailModel {
    store: Arc<CrimeStore>,
    slot: Mutex<Slot>,
}

impl CrimeDetailModel {
    /// Creates a model with no active identity; nothing is delivered until
    /// `load_crime` is called.
    pub fn new(store: Arc<CrimeStore>) -> Self {
        // A receiver with no live sender: observing an unloaded model ends
        // immediately instead of blocking.
        let (_, updates) = unbounded();
        Self {
            store,
            slot: Mutex::new(Slot {
                watch: None,
                updates,
            }),
        }
    }

    /// Switches the model to the given record identity.
    ///
    /// The previous identity's subscription is released and its undelivered
    /// snapshots are discarded; the new identity's current snapshot is
    /// published first, with fresh ones following each committed write.
    pub fn load_crime(&self, id: CrimeId) -> StoreResult<()> {
        let mut slot = self.lock_slot();

        if let Some(previous) = slot.watch.take() {
            self.store.unwatch_crime(previous.id, previous.subscriber);
        }

        // A fresh channel per identity: snapshots still in flight for the
        // previous one can never surface as the new record's state.
        let (snapshots, updates) = unbounded();
        let subscriber = self.store.watch_crime_with(id, snapshots)?;
        slot.watch = Some(ActiveWatch { id, subscriber });
        slot.updates = updates;

        Ok(())
    }

    /// Returns the identity currently feeding the stream.
    pub fn active_crime_id(&self) -> Option<CrimeId> {
        self.lock_slot().watch.as_ref().map(|watch| watch.id)
    }

    /// Blocks until the next snapshot of the active record arrives.
    ///
    /// Returns `None` when no identity is loaded, when the active stream is
    /// switched away mid-wait, or when the store shuts down.
    pub fn recv(&self) -> Option<Option<Crime>> {
        self.current_updates().recv().ok()
    }

    /// Blocks up to `timeout` for the next snapshot of the active record.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Option<Crime>> {
        self.current_updates().recv_timeout(timeout).ok()
    }

    /// Returns a pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<Option<Crime>> {
        self.current_updates().try_recv().ok()
    }

    /// Flushes an edited record to storage.
    ///
    /// Called at screen-exit checkpoints, never per keystroke.
    pub fn save_crime(&self, crime: Crime) -> StoreResult<()> {
        self.store.update_crime(crime)
    }

    fn current_updates(&self) -> Receiver<Option<Crime>> {
        self.lock_slot().updates.clone()
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for CrimeDetailModel {
    fn drop(&mut self) {
        let slot = match self.slot.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(watch) = slot.watch.take() {
            self.store.unwatch_crime(watch.id, watch.subscriber);
        }
    }
}
