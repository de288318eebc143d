//! Crime repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `crimes` table.
//! - Keep SQL details inside the core persistence boundary.
//! - Validate that a connection is migrated before accepting it.
//!
//! # Invariants
//! - Listing returns records in insertion order.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{migrations, DbError};
use crate::model::crime::{Crime, CrimeId};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CRIME_TABLE: &str = "crimes";
const REQUIRED_CRIME_COLUMNS: &[&str] = &["uuid", "title", "timestamp_ms", "solved"];

const CRIME_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    timestamp_ms,
    solved
FROM crimes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for crime persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(CrimeId),
    InvalidData(String),
    /// The connection has not been migrated to the expected schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "crime not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted crime data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not initialized: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for crime CRUD operations.
pub trait CrimeRepository {
    fn insert_crime(&self, crime: &Crime) -> RepoResult<CrimeId>;
    fn update_crime(&self, crime: &Crime) -> RepoResult<()>;
    fn get_crime(&self, id: CrimeId) -> RepoResult<Option<Crime>>;
    fn list_crimes(&self) -> RepoResult<Vec<Crime>>;
    fn delete_crime(&self, id: CrimeId) -> RepoResult<()>;
}

/// SQLite-backed crime repository.
pub struct SqliteCrimeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCrimeRepository<'conn> {
    /// Wraps a connection after checking it carries the expected schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` does not match
    ///   the latest migration known by this binary.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the physical
    ///   schema diverges from the migrated shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        validate_connection(conn)?;
        Ok(Self { conn })
    }
}

impl CrimeRepository for SqliteCrimeRepository<'_> {
    fn insert_crime(&self, crime: &Crime) -> RepoResult<CrimeId> {
        self.conn.execute(
            "INSERT INTO crimes (uuid, title, timestamp_ms, solved)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                crime.id.to_string(),
                crime.title.as_str(),
                crime.timestamp_ms,
                bool_to_int(crime.solved),
            ],
        )?;

        Ok(crime.id)
    }

    fn update_crime(&self, crime: &Crime) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE crimes
             SET
                title = ?1,
                timestamp_ms = ?2,
                solved = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                crime.title.as_str(),
                crime.timestamp_ms,
                bool_to_int(crime.solved),
                crime.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(crime.id));
        }

        Ok(())
    }

    fn get_crime(&self, id: CrimeId) -> RepoResult<Option<Crime>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CRIME_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_crime_row(row)?));
        }

        Ok(None)
    }

    fn list_crimes(&self) -> RepoResult<Vec<Crime>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CRIME_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut crimes = Vec::new();
        while let Some(row) = rows.next()? {
            crimes.push(parse_crime_row(row)?);
        }

        Ok(crimes)
    }

    fn delete_crime(&self, id: CrimeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM crimes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn validate_connection(conn: &Connection) -> RepoResult<()> {
    let expected_version = migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, CRIME_TABLE)? {
        return Err(RepoError::MissingRequiredTable(CRIME_TABLE));
    }

    let columns = column_names(conn, CRIME_TABLE)?;
    for column in REQUIRED_CRIME_COLUMNS.iter().copied() {
        if !columns.iter().any(|name| name.as_str() == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: CRIME_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table_name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn column_names(conn: &Connection, table_name: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table_name});"))?;
    let mut rows = stmt.query([])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get::<_, String>("name")?);
    }
    Ok(names)
}

fn parse_crime_row(row: &Row<'_>) -> RepoResult<Crime> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in crimes.uuid"))
    })?;

    let solved = match row.get::<_, i64>("solved")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid solved value `{other}` in crimes.solved"
            )));
        }
    };

    Ok(Crime {
        id,
        title: row.get("title")?,
        timestamp_ms: row.get("timestamp_ms")?,
        solved,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
