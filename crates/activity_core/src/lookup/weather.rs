//! OpenWeather current-conditions client.

use super::{LookupError, WeatherLookup};
use crate::config::LookupConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub description: String,
    /// Degrees Celsius (`units=metric`).
    pub temperature: f64,
    /// Provider icon code, e.g. `10d`.
    pub icon: String,
}

impl Weather {
    /// Large (2x) icon image for `icon`.
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon)
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

/// HTTP client for `GET /data/2.5/weather`.
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.weather_api_key.clone(),
        })
    }

    /// Fetches current conditions, surfacing the failure cause.
    pub async fn fetch(&self, city: &str) -> Result<Weather, LookupError> {
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_weather(&body)
    }
}

#[async_trait]
impl WeatherLookup for WeatherClient {
    async fn current_weather(&self, city: &str) -> Option<Weather> {
        let started_at = Instant::now();
        match self.fetch(city).await {
            Ok(weather) => {
                info!(
                    "event=weather_lookup module=lookup status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Some(weather)
            }
            Err(err) => {
                warn!(
                    "event=weather_lookup module=lookup status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                None
            }
        }
    }
}

/// Decodes a current-weather payload; only the first condition is used.
pub fn decode_weather(body: &[u8]) -> Result<Weather, LookupError> {
    let response: WeatherResponse = serde_json::from_slice(body)?;
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or(LookupError::EmptyResult)?;

    Ok(Weather {
        description: condition.description,
        temperature: response.main.temp,
        icon: condition.icon,
    })
}
