//! Yelp business-search client used for hotel ratings.

use super::{HotelLookup, LookupError};
use crate::config::LookupConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Placeholder text for missing hotel fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// WGS84 position of a map annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Rating details shown when a hotel annotation is tapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelInfo {
    pub rating: f64,
    pub review_count: u32,
    pub phone: String,
    pub url: String,
}

impl HotelInfo {
    /// Sentinel returned when the lookup fails.
    pub fn unavailable() -> Self {
        Self {
            rating: 0.0,
            review_count: 0,
            phone: NOT_AVAILABLE.to_string(),
            url: NOT_AVAILABLE.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::unavailable()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    businesses: Vec<Business>,
}

#[derive(Debug, Deserialize)]
struct Business {
    rating: Option<f64>,
    review_count: Option<u32>,
    phone: Option<String>,
    url: Option<String>,
}

/// HTTP client for `GET /v3/businesses/search` with bearer auth.
pub struct HotelClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HotelClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.hotel_base_url.trim_end_matches('/').to_string(),
            api_token: config.hotel_api_token.clone(),
        })
    }

    /// Fetches the best match for `name` near `at`, surfacing the failure cause.
    pub async fn fetch(&self, name: &str, at: Coordinates) -> Result<HotelInfo, LookupError> {
        let response = self
            .client
            .get(format!("{}/v3/businesses/search", self.base_url))
            .bearer_auth(&self.api_token)
            .query(&[("term", name)])
            .query(&[("latitude", at.latitude), ("longitude", at.longitude)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_hotel(&body)
    }
}

#[async_trait]
impl HotelLookup for HotelClient {
    async fn hotel_info(&self, name: &str, at: Coordinates) -> HotelInfo {
        let started_at = Instant::now();
        match self.fetch(name, at).await {
            Ok(info) => {
                info!(
                    "event=hotel_lookup module=lookup status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                info
            }
            Err(err) => {
                warn!(
                    "event=hotel_lookup module=lookup status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                HotelInfo::unavailable()
            }
        }
    }
}

/// Decodes a business-search payload; missing fields default one by one.
pub fn decode_hotel(body: &[u8]) -> Result<HotelInfo, LookupError> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    let business = response
        .businesses
        .into_iter()
        .next()
        .ok_or(LookupError::EmptyResult)?;

    Ok(HotelInfo {
        rating: business.rating.unwrap_or(0.0),
        review_count: business.review_count.unwrap_or(0),
        phone: business
            .phone
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        url: business.url.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    })
}
