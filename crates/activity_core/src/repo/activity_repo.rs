//! Activity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and day-range queries over the `activities` table.
//! - Keep SQL and the column encoding of dates/times inside the persistence boundary.
//!   Dates are stored as day numbers, times as `HH:MM` text.
//!
//! # Invariants
//! - Write paths call `ActivityRecord::validate()` before SQL mutations.
//! - Read paths reject malformed persisted rows instead of masking them.
//! - Lists are ordered by `activity_date ASC, start_time ASC`.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::activity::{
    format_time, ActivityKey, ActivityRecord, ActivityType, ActivityValidationError,
};
use chrono::{Datelike, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    activity_date,
    start_time,
    end_time,
    city,
    important_place,
    activity_info,
    activity_type
FROM activities";

const ACTIVITY_ORDER_SQL: &str = "ORDER BY activity_date ASC, start_time ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for activity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ActivityValidationError),
    Db(DbError),
    NotFound(ActivityKey),
    Duplicate(ActivityKey),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "activity not found: {key}"),
            Self::Duplicate(key) => write!(f, "activity already exists: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted activity data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ActivityValidationError> for RepoError {
    fn from(value: ActivityValidationError) -> Self {
        Self::Validation(value)
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

/// Storage seam for activity records.
pub trait ActivityRepository {
    /// Point lookup by normalized identity.
    fn find(&self, key: ActivityKey) -> RepoResult<Option<ActivityRecord>>;
    /// Inserts a new record; fails with `Duplicate` when the identity is taken.
    fn insert(&self, record: &ActivityRecord) -> RepoResult<()>;
    /// Rewrites the non-identity columns of an existing record.
    fn update(&self, record: &ActivityRecord) -> RepoResult<()>;
    /// Removes one record by identity.
    fn delete(&self, key: ActivityKey) -> RepoResult<()>;
    /// Removes every record and returns how many rows were deleted.
    fn delete_all(&self) -> RepoResult<usize>;
    fn list_all(&self) -> RepoResult<Vec<ActivityRecord>>;
    /// Lists records with `start <= activity_date < end`; `end = None` is unbounded.
    fn list_between(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> RepoResult<Vec<ActivityRecord>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    /// Wraps a connection returned by `db::open_db` / `db::open_db_in_memory`.
    ///
    /// Rejects raw connections whose schema has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'activities'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(RepoError::MissingRequiredTable("activities"));
        }

        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_activity_row(row)?);
        }
        Ok(records)
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn find(&self, key: ActivityKey) -> RepoResult<Option<ActivityRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL}
             WHERE activity_date = ?1 AND start_time = ?2;"
        ))?;

        let row = stmt
            .query_row(
                params![date_to_db(key.activity_date()), format_time(key.start_time())],
                |row| Ok(parse_activity_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn insert(&self, record: &ActivityRecord) -> RepoResult<()> {
        record.validate()?;

        let result = self.conn.execute(
            "INSERT INTO activities (
                activity_date,
                start_time,
                end_time,
                city,
                important_place,
                activity_info,
                activity_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                date_to_db(record.activity_date),
                format_time(record.start_time),
                format_time(record.end_time),
                record.city.as_str(),
                record.important_place.as_str(),
                record.activity_info.as_str(),
                activity_type_to_db(record.activity_type),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Duplicate(record.key())),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, record: &ActivityRecord) -> RepoResult<()> {
        record.validate()?;

        let key = record.key();
        let changed = self.conn.execute(
            "UPDATE activities
             SET
                end_time = ?3,
                city = ?4,
                important_place = ?5,
                activity_info = ?6,
                activity_type = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE activity_date = ?1 AND start_time = ?2;",
            params![
                date_to_db(key.activity_date()),
                format_time(key.start_time()),
                format_time(record.end_time),
                record.city.as_str(),
                record.important_place.as_str(),
                record.activity_info.as_str(),
                activity_type_to_db(record.activity_type),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(key));
        }
        Ok(())
    }

    fn delete(&self, key: ActivityKey) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM activities WHERE activity_date = ?1 AND start_time = ?2;",
            params![date_to_db(key.activity_date()), format_time(key.start_time())],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(key));
        }
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM activities;", [])?)
    }

    fn list_all(&self) -> RepoResult<Vec<ActivityRecord>> {
        self.query_records(&format!("{ACTIVITY_SELECT_SQL} {ACTIVITY_ORDER_SQL};"), [])
    }

    fn list_between(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> RepoResult<Vec<ActivityRecord>> {
        self.query_records(
            &format!(
                "{ACTIVITY_SELECT_SQL}
                 WHERE activity_date >= ?1
                   AND (?2 IS NULL OR activity_date < ?2)
                 {ACTIVITY_ORDER_SQL};"
            ),
            params![date_to_db(start), end.map(date_to_db)],
        )
    }
}

fn date_to_db(value: NaiveDate) -> i32 {
    value.num_days_from_ce()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation
                && (inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityRecord> {
    let day_number: i64 = row.get("activity_date")?;
    let activity_date = i32::try_from(day_number)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid day number `{day_number}` in activities.activity_date"
            ))
        })?;

    let start_time = parse_db_time(row, "start_time")?;
    let end_time = parse_db_time(row, "end_time")?;

    let type_text: String = row.get("activity_type")?;
    let activity_type = parse_activity_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid activity type `{type_text}` in activities.activity_type"
        ))
    })?;

    let record = ActivityRecord {
        activity_date,
        start_time,
        end_time,
        city: row.get("city")?,
        important_place: row.get("important_place")?,
        activity_info: row.get("activity_info")?,
        activity_type,
    };
    record.validate()?;
    Ok(record)
}

fn parse_db_time(row: &Row<'_>, column: &'static str) -> RepoResult<NaiveTime> {
    let text: String = row.get(column)?;
    NaiveTime::parse_from_str(&text, "%H:%M").map_err(|_| {
        RepoError::InvalidData(format!("invalid time `{text}` in activities.{column}"))
    })
}

fn activity_type_to_db(kind: ActivityType) -> &'static str {
    match kind {
        ActivityType::Indoor => "indoor",
        ActivityType::Outdoor => "outdoor",
    }
}

fn parse_activity_type(value: &str) -> Option<ActivityType> {
    match value {
        "indoor" => Some(ActivityType::Indoor),
        "outdoor" => Some(ActivityType::Outdoor),
        _ => None,
    }
}
