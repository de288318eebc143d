//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the host UI via FRB.
//! - Own the process-wide store slot and its initialization ordering.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every data function fails with a stable message until `store_init`
//!   has succeeded.

use caselog_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, Crime, CrimeId,
    CrimeStore,
};
use log::info;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "caselog.sqlite3";
const STORE_NOT_INITIALIZED: &str = "crime store is not initialized; call store_init first";

static STORE: OnceLock<CrimeStore> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Opens the process-wide crime store exactly once.
///
/// Input semantics:
/// - `db_path`: database file path; empty or absent falls back to the
///   `CASELOG_DB_PATH` environment variable, then to a file in the system
///   temp directory.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Idempotent: repeat calls after a successful init return success.
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn store_init(db_path: Option<String>) -> String {
    if STORE.get().is_some() {
        return String::new();
    }

    let path = resolve_db_path(db_path);
    match CrimeStore::open(&path) {
        Ok(store) => {
            // A racing second init wins the slot; the loser shuts down.
            let _ = STORE.set(store);
            info!(
                "event=store_init module=ffi status=ok path={}",
                path.display()
            );
            String::new()
        }
        Err(err) => format!("store_init failed: {err}"),
    }
}

/// View model for one crime record crossing the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeView {
    /// Stable record ID in string form.
    pub id: String,
    /// Short description shown in the list view.
    pub title: String,
    /// Occurrence time in Unix epoch milliseconds.
    pub timestamp_ms: i64,
    /// Whether the case has been closed.
    pub solved: bool,
}

/// Generic action response envelope for crime command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeActionResponse {
    /// Whether the operation was accepted.
    pub ok: bool,
    /// Affected record ID in string form.
    pub crime_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl CrimeActionResponse {
    fn success(message: impl Into<String>, crime_id: String) -> Self {
        Self {
            ok: true,
            crime_id: Some(crime_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            crime_id: None,
            message: message.into(),
        }
    }
}

/// Lookup response envelope for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeGetResponse {
    /// Whether the lookup executed.
    pub ok: bool,
    /// Whether a record with the requested ID exists.
    pub found: bool,
    /// The record when found.
    pub crime: Option<CrimeView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// List response envelope for the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeListResponse {
    /// Whether the listing executed.
    pub ok: bool,
    /// Records in insertion order.
    pub crimes: Vec<CrimeView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Creates a new crime record with the given title.
///
/// # FFI contract
/// - Sync call; the write itself commits on the store worker.
/// - Never panics.
/// - Returns the generated record ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn crime_add(title: String) -> CrimeActionResponse {
    let mut crime = Crime::new();
    crime.title = title.trim().to_string();
    let id = crime.id;

    match with_store(|store| store.add_crime(crime)) {
        Ok(Ok(())) => CrimeActionResponse::success("Crime recorded.", id.to_string()),
        Ok(Err(err)) => CrimeActionResponse::failure(format!("crime_add failed: {err}")),
        Err(message) => CrimeActionResponse::failure(message),
    }
}

/// Updates an existing crime record by ID.
///
/// # FFI contract
/// - Sync call; the write itself commits on the store worker.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn crime_update(
    id: String,
    title: String,
    timestamp_ms: i64,
    solved: bool,
) -> CrimeActionResponse {
    let id = match parse_crime_id(&id) {
        Ok(id) => id,
        Err(message) => return CrimeActionResponse::failure(message),
    };

    let mut crime = Crime::with_id(id);
    crime.title = title.trim().to_string();
    crime.timestamp_ms = timestamp_ms;
    crime.solved = solved;

    match with_store(|store| store.update_crime(crime)) {
        Ok(Ok(())) => CrimeActionResponse::success("Crime updated.", id.to_string()),
        Ok(Err(err)) => CrimeActionResponse::failure(format!("crime_update failed: {err}")),
        Err(message) => CrimeActionResponse::failure(message),
    }
}

/// Deletes a crime record by ID.
///
/// # FFI contract
/// - Sync call; the write itself commits on the store worker.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn crime_delete(id: String) -> CrimeActionResponse {
    let id = match parse_crime_id(&id) {
        Ok(id) => id,
        Err(message) => return CrimeActionResponse::failure(message),
    };

    match with_store(|store| store.delete_crime(id)) {
        Ok(Ok(())) => CrimeActionResponse::success("Crime deleted.", id.to_string()),
        Ok(Err(err)) => CrimeActionResponse::failure(format!("crime_delete failed: {err}")),
        Err(message) => CrimeActionResponse::failure(message),
    }
}

/// Looks up one crime record by ID.
///
/// A missing record is reported as `found=false`, not as an error; the UI
/// defaults to a freshly constructed record in that case.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn crime_get(id: String) -> CrimeGetResponse {
    let id = match parse_crime_id(&id) {
        Ok(id) => id,
        Err(message) => {
            return CrimeGetResponse {
                ok: false,
                found: false,
                crime: None,
                message,
            }
        }
    };

    match with_store(|store| store.get_crime(id)) {
        Ok(Ok(Some(crime))) => CrimeGetResponse {
            ok: true,
            found: true,
            crime: Some(to_crime_view(&crime)),
            message: "Crime found.".to_string(),
        },
        Ok(Ok(None)) => CrimeGetResponse {
            ok: true,
            found: false,
            crime: None,
            message: "No crime with this ID.".to_string(),
        },
        Ok(Err(err)) => CrimeGetResponse {
            ok: false,
            found: false,
            crime: None,
            message: format!("crime_get failed: {err}"),
        },
        Err(message) => CrimeGetResponse {
            ok: false,
            found: false,
            crime: None,
            message,
        },
    }
}

/// Lists all crime records in insertion order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn crime_list() -> CrimeListResponse {
    match with_store(|store| store.list_crimes()) {
        Ok(Ok(crimes)) => {
            let crimes: Vec<CrimeView> = crimes.iter().map(to_crime_view).collect();
            let message = if crimes.is_empty() {
                "No crimes recorded.".to_string()
            } else {
                format!("Found {} record(s).", crimes.len())
            };
            CrimeListResponse {
                ok: true,
                crimes,
                message,
            }
        }
        Ok(Err(err)) => CrimeListResponse {
            ok: false,
            crimes: Vec::new(),
            message: format!("crime_list failed: {err}"),
        },
        Err(message) => CrimeListResponse {
            ok: false,
            crimes: Vec::new(),
            message,
        },
    }
}

fn with_store<T>(operation: impl FnOnce(&CrimeStore) -> T) -> Result<T, String> {
    match STORE.get() {
        Some(store) => Ok(operation(store)),
        None => Err(STORE_NOT_INITIALIZED.to_string()),
    }
}

fn parse_crime_id(raw: &str) -> Result<CrimeId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid crime id: `{raw}`"))
}

fn to_crime_view(crime: &Crime) -> CrimeView {
    CrimeView {
        id: crime.id.to_string(),
        title: crime.title.clone(),
        timestamp_ms: crime.timestamp_ms,
        solved: crime.solved,
    }
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    if let Some(raw) = explicit {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    if let Ok(raw) = std::env::var("CASELOG_DB_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(STORE_DB_FILE_NAME)
}
