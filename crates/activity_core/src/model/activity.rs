//! Activity domain model.
//!
//! # Responsibility
//! - Define the canonical activity record and its identity pair.
//! - Own calendar normalization (date-only, minute-precision times).
//!
//! # Invariants
//! - `ActivityKey` values are always normalized on construction.
//! - `start_time` and `end_time` carry hour and minute only.
//! - Identity fields never change after a record is created.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Where an activity takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Indoor,
    Outdoor,
}

impl ActivityType {
    /// Display label, matching the picker values shown by the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
        }
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivityType {
    type Err = ActivityParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(Self::Indoor),
            "outdoor" => Ok(Self::Outdoor),
            _ => Err(ActivityParseError::ActivityType(value.to_string())),
        }
    }
}

/// Text parsing failure for activity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityParseError {
    ActivityType(String),
    Date(String),
    Time(String),
}

impl Display for ActivityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActivityType(value) => {
                write!(f, "unknown activity type `{value}`; expected indoor|outdoor")
            }
            Self::Date(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::Time(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
        }
    }
}

impl Error for ActivityParseError {}

/// Record-level invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityValidationError {
    /// `start_time` carries seconds or sub-second precision.
    UnnormalizedStartTime(NaiveTime),
    /// `end_time` carries seconds or sub-second precision.
    UnnormalizedEndTime(NaiveTime),
}

impl Display for ActivityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnnormalizedStartTime(value) => {
                write!(f, "start_time `{value}` must have minute precision")
            }
            Self::UnnormalizedEndTime(value) => {
                write!(f, "end_time `{value}` must have minute precision")
            }
        }
    }
}

impl Error for ActivityValidationError {}

/// Truncates a timestamp to its calendar date.
pub fn date_only(value: NaiveDateTime) -> NaiveDate {
    value.date()
}

/// Truncates a time-of-day to hour and minute.
pub fn time_only(value: NaiveTime) -> NaiveTime {
    value
        .with_nanosecond(0)
        .and_then(|time| time.with_second(0))
        .unwrap_or(value)
}

/// Half-open bounds `[day, next_day)` for a calendar day.
///
/// The upper bound is `None` only for `NaiveDate::MAX`, which has no successor.
pub fn day_bounds(day: NaiveDate) -> (NaiveDate, Option<NaiveDate>) {
    (day, day.succ_opt())
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Result<NaiveDate, ActivityParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ActivityParseError::Date(value.to_string()))
}

/// Parses `HH:MM` (or `HH:MM:SS`) and drops anything finer than a minute.
pub fn parse_time(value: &str) -> Result<NaiveTime, ActivityParseError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(time_only)
        .map_err(|_| ActivityParseError::Time(value.to_string()))
}

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_time(value: NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

/// Identity pair `(activity_date, start_time)` of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActivityKey {
    activity_date: NaiveDate,
    start_time: NaiveTime,
}

impl ActivityKey {
    /// Builds a normalized key; sub-minute components of `start_time` are dropped.
    pub fn new(activity_date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            activity_date,
            start_time: time_only(start_time),
        }
    }

    /// Builds a key from full timestamps, keeping the date of the first and
    /// the time-of-day of the second.
    pub fn from_datetimes(activity_date: NaiveDateTime, start_time: NaiveDateTime) -> Self {
        Self::new(date_only(activity_date), start_time.time())
    }

    pub fn activity_date(&self) -> NaiveDate {
        self.activity_date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }
}

impl Display for ActivityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            format_date(self.activity_date),
            format_time(self.start_time)
        )
    }
}

/// Canonical persisted activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub city: String,
    pub important_place: String,
    pub activity_info: String,
    pub activity_type: ActivityType,
}

impl ActivityRecord {
    pub fn key(&self) -> ActivityKey {
        ActivityKey::new(self.activity_date, self.start_time)
    }

    /// Checks minute precision on both time fields.
    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        if time_only(self.start_time) != self.start_time {
            return Err(ActivityValidationError::UnnormalizedStartTime(
                self.start_time,
            ));
        }
        if time_only(self.end_time) != self.end_time {
            return Err(ActivityValidationError::UnnormalizedEndTime(self.end_time));
        }
        Ok(())
    }
}

/// Create request for a new activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub activity_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub city: String,
    pub important_place: String,
    pub activity_info: String,
    pub activity_type: ActivityType,
}

impl NewActivity {
    /// Normalized identity this request would occupy.
    pub fn key(&self) -> ActivityKey {
        ActivityKey::new(self.activity_date, self.start_time)
    }

    /// Form completeness check: city, place and info must be non-blank.
    ///
    /// Callers use this before submitting; the store does not enforce it.
    pub fn has_required_fields(&self) -> bool {
        [&self.city, &self.important_place, &self.activity_info]
            .iter()
            .all(|value| !value.trim().is_empty())
    }

    /// Converts into a record with both times truncated to minute precision.
    pub fn into_record(self) -> ActivityRecord {
        ActivityRecord {
            activity_date: self.activity_date,
            start_time: time_only(self.start_time),
            end_time: time_only(self.end_time),
            city: self.city,
            important_place: self.important_place,
            activity_info: self.activity_info,
            activity_type: self.activity_type,
        }
    }
}

/// Partial update for the non-identity fields of an activity.
///
/// `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
    pub end_time: Option<NaiveTime>,
    pub city: Option<String>,
    pub important_place: Option<String>,
    pub activity_info: Option<String>,
    pub activity_type: Option<ActivityType>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.end_time.is_none()
            && self.city.is_none()
            && self.important_place.is_none()
            && self.activity_info.is_none()
            && self.activity_type.is_none()
    }

    /// Overwrites present fields on `record`; identity fields are untouched.
    pub fn apply_to(&self, record: &mut ActivityRecord) {
        if let Some(end_time) = self.end_time {
            record.end_time = time_only(end_time);
        }
        if let Some(city) = &self.city {
            record.city = city.clone();
        }
        if let Some(place) = &self.important_place {
            record.important_place = place.clone();
        }
        if let Some(info) = &self.activity_info {
            record.activity_info = info.clone();
        }
        if let Some(kind) = self.activity_type {
            record.activity_type = kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        date_only, day_bounds, parse_date, parse_time, time_only, ActivityKey, ActivityParseError,
        ActivityPatch, ActivityType, NewActivity,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn time_only_drops_seconds_and_is_idempotent() {
        let raw = NaiveTime::from_hms_milli_opt(9, 15, 42, 250).unwrap();
        let normalized = time_only(raw);
        assert_eq!(normalized, hms(9, 15, 0));
        assert_eq!(time_only(normalized), normalized);
    }

    #[test]
    fn date_only_is_idempotent_for_midnight_values() {
        let day = date(2024, 5, 1);
        let late = day.and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(date_only(late), day);
        assert_eq!(date_only(day.and_hms_opt(0, 0, 0).unwrap()), day);
    }

    #[test]
    fn key_from_datetimes_discards_cross_components() {
        let activity_day = date(2024, 5, 1).and_hms_opt(17, 3, 0).unwrap();
        let start = date(1999, 12, 31).and_hms_opt(9, 0, 30).unwrap();

        let key = ActivityKey::from_datetimes(activity_day, start);
        assert_eq!(key.activity_date(), date(2024, 5, 1));
        assert_eq!(key.start_time(), hms(9, 0, 0));
        assert_eq!(key, ActivityKey::new(date(2024, 5, 1), hms(9, 0, 59)));
        assert_eq!(key.to_string(), "2024-05-01 09:00");
    }

    #[test]
    fn day_bounds_are_half_open() {
        let (start, end) = day_bounds(date(2024, 2, 28));
        assert_eq!(start, date(2024, 2, 28));
        assert_eq!(end, Some(date(2024, 2, 29)));
        assert_eq!(day_bounds(NaiveDate::MAX).1, None);
    }

    #[test]
    fn activity_type_parses_case_insensitively() {
        assert_eq!(" OUTDOOR ".parse::<ActivityType>(), Ok(ActivityType::Outdoor));
        assert_eq!("indoor".parse::<ActivityType>(), Ok(ActivityType::Indoor));
        assert_eq!(
            "garden".parse::<ActivityType>(),
            Err(ActivityParseError::ActivityType("garden".to_string()))
        );
    }

    #[test]
    fn parse_time_accepts_seconds_and_truncates() {
        assert_eq!(parse_time("09:05").unwrap(), hms(9, 5, 0));
        assert_eq!(parse_time("09:05:59").unwrap(), hms(9, 5, 0));
        assert!(parse_time("9h05").is_err());
        assert!(parse_date("2024/05/01").is_err());
    }

    #[test]
    fn required_fields_reject_blank_text() {
        let mut request = NewActivity {
            activity_date: date(2024, 5, 1),
            start_time: hms(9, 0, 0),
            end_time: hms(10, 0, 0),
            city: "Columbus".to_string(),
            important_place: "Park".to_string(),
            activity_info: "Walk".to_string(),
            activity_type: ActivityType::Outdoor,
        };
        assert!(request.has_required_fields());

        request.important_place = "   ".to_string();
        assert!(!request.has_required_fields());
    }

    #[test]
    fn patch_keeps_absent_fields_and_normalizes_end_time() {
        let mut record = NewActivity {
            activity_date: date(2024, 5, 1),
            start_time: hms(9, 0, 0),
            end_time: hms(10, 0, 0),
            city: "Columbus".to_string(),
            important_place: "Park".to_string(),
            activity_info: "Walk".to_string(),
            activity_type: ActivityType::Outdoor,
        }
        .into_record();

        let patch = ActivityPatch {
            end_time: Some(hms(11, 30, 45)),
            activity_type: Some(ActivityType::Indoor),
            ..ActivityPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut record);

        assert_eq!(record.end_time, hms(11, 30, 0));
        assert_eq!(record.activity_type, ActivityType::Indoor);
        assert_eq!(record.city, "Columbus");
        assert_eq!(record.start_time, hms(9, 0, 0));
        assert!(record.validate().is_ok());
    }
}
