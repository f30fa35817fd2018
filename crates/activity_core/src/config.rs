//! Runtime configuration for external lookups.
//!
//! There are no config files; hosts either build `LookupConfig` explicitly
//! or read it from the process environment.

/// Environment variable holding the OpenWeather API key.
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// Environment variable holding the Yelp bearer token.
pub const HOTEL_API_TOKEN_ENV: &str = "YELP_API_TOKEN";
/// Optional override of the weather endpoint origin.
pub const WEATHER_BASE_URL_ENV: &str = "ACTIVITY_WEATHER_BASE_URL";
/// Optional override of the hotel endpoint origin.
pub const HOTEL_BASE_URL_ENV: &str = "ACTIVITY_HOTEL_BASE_URL";

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_HOTEL_BASE_URL: &str = "https://api.yelp.com";

/// Endpoints and credentials for the weather and hotel clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub weather_base_url: String,
    pub weather_api_key: String,
    pub hotel_base_url: String,
    pub hotel_api_token: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            weather_api_key: String::new(),
            hotel_base_url: DEFAULT_HOTEL_BASE_URL.to_string(),
            hotel_api_token: String::new(),
        }
    }
}

impl LookupConfig {
    /// Reads credentials and optional endpoint overrides from the environment.
    ///
    /// Unset or blank variables fall back to `LookupConfig::default()` values.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str, fallback: String| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(fallback)
        };
        let defaults = Self::default();

        Self {
            weather_base_url: read(WEATHER_BASE_URL_ENV, defaults.weather_base_url),
            weather_api_key: read(WEATHER_API_KEY_ENV, defaults.weather_api_key),
            hotel_base_url: read(HOTEL_BASE_URL_ENV, defaults.hotel_base_url),
            hotel_api_token: read(HOTEL_API_TOKEN_ENV, defaults.hotel_api_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupConfig, DEFAULT_HOTEL_BASE_URL, HOTEL_API_TOKEN_ENV, WEATHER_BASE_URL_ENV};

    #[test]
    fn blank_and_missing_values_fall_back_to_defaults() {
        let config = LookupConfig::from_lookup(|name| match name {
            WEATHER_BASE_URL_ENV => Some("http://127.0.0.1:9000 ".to_string()),
            HOTEL_API_TOKEN_ENV => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.weather_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.hotel_base_url, DEFAULT_HOTEL_BASE_URL);
        assert!(config.hotel_api_token.is_empty());
        assert!(config.weather_api_key.is_empty());
    }
}
