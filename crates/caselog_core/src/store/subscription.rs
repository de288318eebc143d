//! Observer handle for store streams.
//!
//! # Responsibility
//! - Deliver published snapshots to one observer on the observer's thread.
//! - Unregister from the store when the handle is dropped.

use crate::model::crime::CrimeId;
use crate::store::crime_store::Command;
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Identifies which query a subscriber is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TopicKey {
    AllCrimes,
    Crime(CrimeId),
}

/// Live handle onto a store stream.
///
/// The first snapshot is published at subscription time; afterwards a fresh
/// snapshot arrives whenever a write affecting the underlying query commits.
/// Receiving happens on the calling thread. The stream ends (`None`) once
/// the store shuts down.
pub struct Subscription<T> {
    key: TopicKey,
    subscriber: u64,
    updates: Receiver<T>,
    commands: Sender<Command>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        key: TopicKey,
        subscriber: u64,
        updates: Receiver<T>,
        commands: Sender<Command>,
    ) -> Self {
        Self {
            key,
            subscriber,
            updates,
            commands,
        }
    }

    /// Blocks until the next snapshot arrives.
    ///
    /// Returns `None` when the store has shut down.
    pub fn recv(&self) -> Option<T> {
        self.updates.recv().ok()
    }

    /// Blocks up to `timeout` for the next snapshot.
    ///
    /// Returns `None` on timeout or when the store has shut down.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.updates.recv_timeout(timeout).ok()
    }

    /// Returns a pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.updates.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        // Best effort: a stopped worker already dropped its registrations.
        let _ = self.commands.send(Command::Unsubscribe {
            key: self.key,
            subscriber: self.subscriber,
        });
    }
}
