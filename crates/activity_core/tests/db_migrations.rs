use activity_core::db::migrations::{latest_version, schema_version};
use activity_core::db::{close_db, open_db, open_db_in_memory, DbError};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "activities");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO activities (
                activity_date, start_time, end_time, city, important_place, activity_info, activity_type
            ) VALUES (?1, '09:00', '10:00', 'Columbus', 'Park', 'Walk', 'outdoor');",
            [day_number(2024, 5, 1)],
        )
        .unwrap();
    close_db(conn_first).unwrap();

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM activities;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_enforces_identity_pair_and_activity_type() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO activities (
        activity_date, start_time, end_time, city, important_place, activity_info, activity_type
    ) VALUES (?1, '09:00', '10:00', 'c', 'p', 'i', ?2);";
    let day = day_number(2024, 5, 1);

    conn.execute(insert, rusqlite::params![day, "indoor"]).unwrap();
    assert!(conn.execute(insert, rusqlite::params![day, "outdoor"]).is_err());

    let bad_type = conn.execute(
        "INSERT INTO activities (
            activity_date, start_time, end_time, city, important_place, activity_info, activity_type
        ) VALUES (?1, '09:00', '10:00', 'c', 'p', 'i', 'garden');",
        [day_number(2024, 5, 2)],
    );
    assert!(bad_type.is_err());
}

fn day_number(y: i32, m: u32, d: u32) -> i32 {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().num_days_from_ce()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
