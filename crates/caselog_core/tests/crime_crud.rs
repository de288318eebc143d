use caselog_core::db::migrations::latest_version;
use caselog_core::db::open_db_in_memory;
use caselog_core::{Crime, CrimeRepository, RepoError, SqliteCrimeRepository};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    let mut crime = Crime::new();
    crime.title = "Mugging".to_string();
    let id = repo.insert_crime(&crime).unwrap();

    let loaded = repo.get_crime(id).unwrap().unwrap();
    assert_eq!(loaded, crime);
}

#[test]
fn update_existing_crime() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    let mut crime = Crime::new();
    crime.title = "Vandalism".to_string();
    repo.insert_crime(&crime).unwrap();

    crime.title = "Vandalism (repeat offender)".to_string();
    crime.solved = true;
    repo.update_crime(&crime).unwrap();

    let loaded = repo.get_crime(crime.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Vandalism (repeat offender)");
    assert!(loaded.solved);
    assert_eq!(loaded.timestamp_ms, crime.timestamp_ms);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    let crime = Crime::new();
    let err = repo.update_crime(&crime).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == crime.id));
}

#[test]
fn get_missing_crime_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    assert!(repo.get_crime(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn delete_removes_the_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    let crime = Crime::new();
    repo.insert_crime(&crime).unwrap();

    repo.delete_crime(crime.id).unwrap();
    assert!(repo.get_crime(crime.id).unwrap().is_none());

    let err = repo.delete_crime(crime.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == crime.id));
}

#[test]
fn list_returns_records_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCrimeRepository::try_new(&conn).unwrap();

    let crime_c = crime_with_fixed_id("00000000-0000-4000-8000-000000000003", "c");
    let crime_a = crime_with_fixed_id("00000000-0000-4000-8000-000000000001", "a");
    let crime_b = crime_with_fixed_id("00000000-0000-4000-8000-000000000002", "b");
    repo.insert_crime(&crime_c).unwrap();
    repo.insert_crime(&crime_a).unwrap();
    repo.insert_crime(&crime_b).unwrap();

    let listed = repo.list_crimes().unwrap();
    let ids: Vec<_> = listed.into_iter().map(|crime| crime.id).collect();
    assert_eq!(ids, vec![crime_c.id, crime_a.id, crime_b.id]);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteCrimeRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_crimes_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteCrimeRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("crimes"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_crimes_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE crimes (
            uuid TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            timestamp_ms INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteCrimeRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "crimes",
            column: "solved"
        })
    ));
}

fn crime_with_fixed_id(id: &str, title: &str) -> Crime {
    let mut crime = Crime::with_id(Uuid::parse_str(id).unwrap());
    crime.title = title.to_string();
    crime
}
