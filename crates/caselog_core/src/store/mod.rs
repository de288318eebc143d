//! Reactive crime store.
//!
//! # Responsibility
//! - Own the database connection and the single serial write worker.
//! - Expose snapshot reads and reactive streams over persisted records.
//!
//! # Invariants
//! - All storage access happens on the worker, strictly in submission order.
//! - Every committed write republishes fresh snapshots to live observers.
//! - Observer registrations are released on drop.

pub mod crime_store;
pub mod subscription;
