//! Core domain logic for the activity tracker.
//! This crate is the single source of truth for activity invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod repo;
pub mod service;

pub use config::LookupConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use lookup::{
    Coordinates, HotelClient, HotelInfo, HotelLookup, LookupError, Weather, WeatherClient,
    WeatherLookup,
};
pub use model::activity::{
    date_only, day_bounds, parse_date, parse_time, time_only, ActivityKey, ActivityParseError,
    ActivityPatch, ActivityRecord, ActivityType, ActivityValidationError, NewActivity,
};
pub use repo::activity_repo::{
    ActivityRepository, RepoError, RepoResult, SqliteActivityRepository,
};
pub use service::activity_store::{ActivityStore, StoreOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
