//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level activity functions to Dart via FRB.
//! - Convert device-local epoch milliseconds into calendar dates and times.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Store failures come back as `ok=false` envelopes, never as aborts.
//! - Lookups return sentinels, never errors.

use activity_core::db::open_db;
use activity_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ActivityKey, ActivityPatch, ActivityRecord, ActivityStore, ActivityType, Coordinates,
    HotelClient, HotelInfo, HotelLookup, LookupConfig, NewActivity, SqliteActivityRepository,
    StoreOutcome, WeatherClient, WeatherLookup,
};
use chrono::{Local, NaiveDateTime, TimeZone};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

const ACTIVITY_DB_FILE_NAME: &str = "activity_tracker.sqlite3";
const ACTIVITY_DB_PATH_ENV: &str = "ACTIVITY_DB_PATH";
static ACTIVITY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Activity row as rendered by list and detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    /// `YYYY-MM-DD`.
    pub activity_date: String,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`.
    pub end_time: String,
    pub city: String,
    pub important_place: String,
    pub activity_info: String,
    /// `Indoor` or `Outdoor`.
    pub activity_type: String,
}

/// Envelope for create/update/delete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityActionResponse {
    /// Whether the change was applied.
    pub ok: bool,
    /// Machine-readable outcome (`applied|duplicate|not_found|storage_failed|invalid_input`).
    pub outcome: String,
    /// Human-readable message for the info sheet.
    pub message: String,
    /// Full record list after the call (empty on failure).
    pub items: Vec<ActivityItem>,
}

impl ActivityActionResponse {
    fn from_outcome(outcome: StoreOutcome, items: Vec<ActivityItem>) -> Self {
        let code = match outcome {
            StoreOutcome::Applied => "applied",
            StoreOutcome::Duplicate => "duplicate",
            StoreOutcome::NotFound => "not_found",
            StoreOutcome::StorageFailed => "storage_failed",
        };
        Self {
            ok: outcome.is_applied(),
            outcome: code.to_string(),
            message: outcome.message().to_string(),
            items,
        }
    }

    fn failure(outcome: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            outcome: outcome.to_string(),
            message: message.into(),
            items: Vec::new(),
        }
    }
}

/// Envelope for day-list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityListResponse {
    pub items: Vec<ActivityItem>,
    pub message: String,
}

/// Weather card payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherItem {
    pub description: String,
    pub temperature_celsius: f64,
    pub icon: String,
    pub icon_url: String,
}

/// Hotel details sheet payload. Sentinel values when unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelItem {
    pub rating: f64,
    pub review_count: u32,
    pub phone: String,
    pub url: String,
}

/// Creates an activity unless `(date, start time)` is already taken.
///
/// All `*_epoch_ms` values are interpreted in the device timezone; only the
/// date of `activity_date_epoch_ms` and the hour/minute of the time values
/// are kept.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_create(
    activity_date_epoch_ms: i64,
    start_time_epoch_ms: i64,
    end_time_epoch_ms: i64,
    city: String,
    important_place: String,
    activity_info: String,
    activity_type: String,
) -> ActivityActionResponse {
    let request = match (
        local_datetime(activity_date_epoch_ms),
        local_datetime(start_time_epoch_ms),
        local_datetime(end_time_epoch_ms),
        activity_type.parse::<ActivityType>(),
    ) {
        (Some(day), Some(start), Some(end), Ok(kind)) => NewActivity {
            activity_date: day.date(),
            start_time: start.time(),
            end_time: end.time(),
            city,
            important_place,
            activity_info,
            activity_type: kind,
        },
        (.., Err(err)) => return ActivityActionResponse::failure("invalid_input", err.to_string()),
        _ => return invalid_timestamp(),
    };

    with_store(|store| store.create(request))
}

/// Updates the fields that are present on the activity at `(date, start time)`.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_update(
    activity_date_epoch_ms: i64,
    start_time_epoch_ms: i64,
    end_time_epoch_ms: Option<i64>,
    city: Option<String>,
    important_place: Option<String>,
    activity_info: Option<String>,
    activity_type: Option<String>,
) -> ActivityActionResponse {
    let Some(key) = local_key(activity_date_epoch_ms, start_time_epoch_ms) else {
        return invalid_timestamp();
    };
    let end_time = match end_time_epoch_ms.map(local_datetime) {
        Some(Some(end)) => Some(end.time()),
        Some(None) => return invalid_timestamp(),
        None => None,
    };
    let activity_type = match activity_type.map(|raw| raw.parse::<ActivityType>()) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(err)) => return ActivityActionResponse::failure("invalid_input", err.to_string()),
        None => None,
    };
    let patch = ActivityPatch {
        end_time,
        city,
        important_place,
        activity_info,
        activity_type,
    };

    with_store(|store| store.update(key, &patch))
}

/// Deletes the activity at `(date, start time)`.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_delete(
    activity_date_epoch_ms: i64,
    start_time_epoch_ms: i64,
) -> ActivityActionResponse {
    match local_key(activity_date_epoch_ms, start_time_epoch_ms) {
        Some(key) => with_store(|store| store.delete(key)),
        None => invalid_timestamp(),
    }
}

/// Deletes every activity. Irreversible; the UI owns any confirmation.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_delete_all() -> ActivityActionResponse {
    with_store(|store| store.delete_all())
}

/// Lists the activities of the calendar day containing `day_epoch_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_list_for_day(day_epoch_ms: i64) -> ActivityListResponse {
    let Some(day) = local_datetime(day_epoch_ms) else {
        return ActivityListResponse {
            items: Vec::new(),
            message: "Invalid date.".to_string(),
        };
    };

    let loaded = open_store_and(|store| match store.load_day(day.date()) {
        StoreOutcome::Applied => Ok(to_items(store.snapshot())),
        outcome => Err(outcome.message().to_string()),
    });
    match loaded.and_then(|items| items) {
        Ok(items) => {
            let message = if items.is_empty() {
                "No activities for this day.".to_string()
            } else {
                format!("Found {} activity record(s).", items.len())
            };
            ActivityListResponse { items, message }
        }
        Err(message) => ActivityListResponse {
            items: Vec::new(),
            message,
        },
    }
}

/// Reads one activity for the detail view.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_get(activity_date_epoch_ms: i64, start_time_epoch_ms: i64) -> Option<ActivityItem> {
    let key = local_key(activity_date_epoch_ms, start_time_epoch_ms)?;
    open_store_and(|store| store.get(key).map(|record| to_item(&record)))
        .ok()
        .flatten()
}

/// Existence predicate used to pre-validate add (must be false) and
/// update/delete (must be true).
#[flutter_rust_bridge::frb(sync)]
pub fn activity_exists(activity_date_epoch_ms: i64, start_time_epoch_ms: i64) -> bool {
    local_key(activity_date_epoch_ms, start_time_epoch_ms)
        .and_then(|key| open_store_and(|store| store.is_duplicate(key)).ok())
        .unwrap_or(false)
}

/// Current weather for `city`; `None` on any failure.
pub async fn weather_lookup(city: String) -> Option<WeatherItem> {
    let client = match WeatherClient::new(&LookupConfig::from_env()) {
        Ok(client) => client,
        Err(err) => {
            warn!("event=weather_lookup module=ffi status=error error_code=client_init_failed error={err}");
            return None;
        }
    };

    client
        .current_weather(city.trim())
        .await
        .map(|weather| WeatherItem {
            icon_url: weather.icon_url(),
            description: weather.description,
            temperature_celsius: weather.temperature,
            icon: weather.icon,
        })
}

/// Rating details for hotel `name` near the given coordinate.
pub async fn hotel_lookup(name: String, latitude: f64, longitude: f64) -> HotelItem {
    let info = match HotelClient::new(&LookupConfig::from_env()) {
        Ok(client) => {
            client
                .hotel_info(
                    name.trim(),
                    Coordinates {
                        latitude,
                        longitude,
                    },
                )
                .await
        }
        Err(err) => {
            warn!("event=hotel_lookup module=ffi status=error error_code=client_init_failed error={err}");
            HotelInfo::unavailable()
        }
    };

    HotelItem {
        rating: info.rating,
        review_count: info.review_count,
        phone: info.phone,
        url: info.url,
    }
}

fn local_datetime(epoch_ms: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|value| value.naive_local())
}

fn local_key(activity_date_epoch_ms: i64, start_time_epoch_ms: i64) -> Option<ActivityKey> {
    Some(ActivityKey::from_datetimes(
        local_datetime(activity_date_epoch_ms)?,
        local_datetime(start_time_epoch_ms)?,
    ))
}

fn invalid_timestamp() -> ActivityActionResponse {
    ActivityActionResponse::failure("invalid_input", "Invalid date or time.")
}

fn resolve_db_path() -> PathBuf {
    ACTIVITY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ACTIVITY_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ACTIVITY_DB_FILE_NAME)
        })
        .clone()
}

fn open_store_and<T>(
    f: impl FnOnce(&mut ActivityStore<SqliteActivityRepository<'_>>) -> T,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("activity DB open failed: {err}"))?;
    let repo = SqliteActivityRepository::try_new(&conn)
        .map_err(|err| format!("activity repo init failed: {err}"))?;
    let mut store =
        ActivityStore::open(repo).map_err(|err| format!("activity store load failed: {err}"))?;
    Ok(f(&mut store))
}

fn with_store(
    f: impl FnOnce(&mut ActivityStore<SqliteActivityRepository<'_>>) -> StoreOutcome,
) -> ActivityActionResponse {
    let result = open_store_and(|store| {
        let outcome = f(store);
        (outcome, to_items(store.snapshot()))
    });
    match result {
        Ok((outcome, items)) => ActivityActionResponse::from_outcome(outcome, items),
        Err(message) => ActivityActionResponse::failure("storage_failed", message),
    }
}

fn to_items(records: &[ActivityRecord]) -> Vec<ActivityItem> {
    records.iter().map(to_item).collect()
}

fn to_item(record: &ActivityRecord) -> ActivityItem {
    ActivityItem {
        activity_date: record.activity_date.format("%Y-%m-%d").to_string(),
        start_time: record.start_time.format("%H:%M").to_string(),
        end_time: record.end_time.format("%H:%M").to_string(),
        city: record.city.clone(),
        important_place: record.important_place.clone(),
        activity_info: record.activity_info.clone(),
        activity_type: record.activity_type.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        activity_create, activity_delete, activity_exists, activity_get, activity_list_for_day,
        activity_update, core_version, init_logging, ping,
    };
    use chrono::{Local, NaiveDate, TimeZone};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn create_update_delete_roundtrip_through_envelopes() {
        let (day_ms, start_ms) = unique_slot();
        let end_ms = start_ms + 60 * 60 * 1000;

        let created = activity_create(
            day_ms,
            start_ms,
            end_ms,
            " Columbus ".to_string(),
            "Park".to_string(),
            "Walk".to_string(),
            "outdoor".to_string(),
        );
        assert!(created.ok, "{}", created.message);
        assert!(activity_exists(day_ms, start_ms));
        let stored = activity_get(day_ms, start_ms).expect("record should exist");
        assert_eq!(stored.city, " Columbus ");

        let duplicate = activity_create(
            day_ms,
            start_ms,
            end_ms,
            "Columbus".to_string(),
            "Park".to_string(),
            "Walk".to_string(),
            "Outdoor".to_string(),
        );
        assert!(!duplicate.ok);
        assert_eq!(duplicate.outcome, "duplicate");

        let updated = activity_update(
            day_ms,
            start_ms,
            None,
            Some("Dayton".to_string()),
            None,
            None,
            None,
        );
        assert!(updated.ok, "{}", updated.message);
        let item = activity_get(day_ms, start_ms).expect("record should exist");
        assert_eq!(item.city, "Dayton");
        assert_eq!(item.important_place, "Park");
        assert_eq!(item.activity_type, "Outdoor");

        let listed = activity_list_for_day(day_ms);
        assert!(listed.items.iter().any(|row| row.start_time == item.start_time
            && row.activity_date == item.activity_date));

        let deleted = activity_delete(day_ms, start_ms);
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!activity_exists(day_ms, start_ms));

        let missing = activity_delete(day_ms, start_ms);
        assert_eq!(missing.outcome, "not_found");
    }

    #[test]
    fn create_rejects_unknown_activity_type() {
        let (day_ms, start_ms) = unique_slot();
        let response = activity_create(
            day_ms,
            start_ms,
            start_ms,
            "Columbus".to_string(),
            "Park".to_string(),
            "Walk".to_string(),
            "underwater".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.outcome, "invalid_input");
        assert!(response.message.contains("underwater"));
    }

    /// Picks a far-future local day and minute unlikely to collide across runs.
    fn unique_slot() -> (i64, i64) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        let day_offset = (nanos / 1_000 % 300_000) as u64;
        let minute = 240 + (nanos % 1_140) as u32;
        let day = NaiveDate::from_ymd_opt(2300, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(day_offset))
            .unwrap();
        let start = day
            .and_hms_opt(minute / 60, minute % 60, 0)
            .unwrap();
        let day_ms = Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp_millis();
        let start_ms = Local
            .from_local_datetime(&start)
            .earliest()
            .unwrap()
            .timestamp_millis();
        (day_ms, start_ms)
    }
}
