//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `caselog_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use caselog_core::{Crime, CrimeStore};

fn main() {
    println!("caselog_core version={}", caselog_core::core_version());

    // An in-memory round trip exercises the worker and repository without
    // touching the filesystem.
    match smoke_round_trip() {
        Ok(count) => println!("caselog_core smoke crimes={count}"),
        Err(message) => println!("caselog_core smoke failed: {message}"),
    }
}

fn smoke_round_trip() -> Result<usize, String> {
    let store = CrimeStore::open_in_memory().map_err(|err| err.to_string())?;

    let mut crime = Crime::new();
    crime.title = "smoke check".to_string();
    store.add_crime(crime).map_err(|err| err.to_string())?;

    let crimes = store.list_crimes().map_err(|err| err.to_string())?;
    Ok(crimes.len())
}
