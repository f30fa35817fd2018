//! Pass-through clients for the hotel and weather lookups.
//!
//! # Responsibility
//! - Fetch current weather for a city and rating details for a hotel.
//! - Collapse every failure into a sentinel value for the caller.
//!
//! # Invariants
//! - Lookups never touch activity store state.
//! - No retry, backoff or custom timeout; one request per call.
//! - Free-text inputs (city, hotel name) are never written to logs.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod hotel;
pub mod weather;

pub use hotel::{Coordinates, HotelClient, HotelInfo};
pub use weather::{Weather, WeatherClient};

/// Failure of a single lookup request, logged before it becomes a sentinel.
#[derive(Debug)]
pub enum LookupError {
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
    EmptyResult,
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "request failed: {err}"),
            Self::Status(code) => write!(f, "unexpected http status {code}"),
            Self::Decode(err) => write!(f, "response decode failed: {err}"),
            Self::EmptyResult => write!(f, "response contained no result"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Status(_) | Self::EmptyResult => None,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl LookupError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_failed",
            Self::Status(_) => "bad_status",
            Self::Decode(_) => "decode_failed",
            Self::EmptyResult => "empty_result",
        }
    }
}

/// Current-weather lookup by city name.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Returns `None` on any network, status or decode failure.
    async fn current_weather(&self, city: &str) -> Option<Weather>;
}

/// Hotel rating lookup by name near a coordinate.
#[async_trait]
pub trait HotelLookup: Send + Sync {
    /// Returns `HotelInfo::unavailable()` on any failure.
    async fn hotel_info(&self, name: &str, at: Coordinates) -> HotelInfo;
}
