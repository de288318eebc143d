//! FFI crate exposing Caselog core to the host UI runtime.
//!
//! # Responsibility
//! - Keep the bridged surface in one module consumed by the generator.

pub mod api;
