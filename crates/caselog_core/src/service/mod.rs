//! Screen-facing models.
//!
//! # Responsibility
//! - Adapt store streams and writes to the lifetime of a displayed screen.
//! - Keep UI layers decoupled from storage and worker details.

pub mod crime_detail_model;
pub mod crime_list_model;
