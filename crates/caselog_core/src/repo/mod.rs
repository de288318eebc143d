//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data-access contract for crime records.
//! - Isolate SQLite query details from the store and screen models.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - A missing record on lookup is `Ok(None)`, never an error.

pub mod crime_repo;
