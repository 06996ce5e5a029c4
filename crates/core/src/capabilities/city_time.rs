//! get_time_in_city - local time for a known city
//!
//! Cities resolve through a fixed table; anything else falls back to UTC.
//! The wall-clock time comes from a WorldTimeAPI-compatible provider.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::warn;

use crate::tools::Capability;

/// Recognized cities (display name, IANA zone)
pub const CITY_TIMEZONES: [(&str, &str); 8] = [
    ("Nairobi", "Africa/Nairobi"),
    ("London", "Europe/London"),
    ("New York", "America/New_York"),
    ("Tokyo", "Asia/Tokyo"),
    ("Paris", "Europe/Paris"),
    ("Sydney", "Australia/Sydney"),
    ("Dubai", "Asia/Dubai"),
    ("Los Angeles", "America/Los_Angeles"),
];

const FALLBACK_TIMEZONE: &str = "UTC";

/// Map a city name to its time zone, case-insensitively. Unknown → UTC.
pub fn resolve_timezone(city: &str) -> &'static str {
    let wanted = city.trim().to_lowercase();
    CITY_TIMEZONES
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .map(|(_, zone)| *zone)
        .unwrap_or(FALLBACK_TIMEZONE)
}

/// Long-form local time, e.g. `Current time in Tokyo: Monday, March 3, 2025 at 09:05:07 PM JST`
pub fn format_city_time(city: &str, datetime: DateTime<FixedOffset>, abbreviation: &str) -> String {
    format!(
        "Current time in {city}: {} {abbreviation}",
        datetime.format("%A, %B %-d, %Y at %I:%M:%S %p")
    )
}

#[derive(Debug, Deserialize)]
struct WorldTime {
    datetime: String,
    #[serde(default)]
    abbreviation: Option<String>,
}

pub struct CityTimeCapability {
    client: reqwest::Client,
    api_url: String,
    description: String,
}

impl CityTimeCapability {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let cities: Vec<&str> = CITY_TIMEZONES.iter().map(|(name, _)| *name).collect();
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            description: format!(
                "Get current time in a specific city (supports: {})",
                cities.join(", ")
            ),
        }
    }

    fn try_cities(city: &str) -> String {
        let known: Vec<String> = CITY_TIMEZONES
            .iter()
            .map(|(name, _)| name.to_lowercase())
            .collect();
        format!("Could not fetch time for {city}. Try: {}", known.join(", "))
    }

    async fn lookup(&self, city: &str) -> Result<String, String> {
        let zone = resolve_timezone(city);
        let response = self
            .client
            .get(format!("{}/api/timezone/{zone}", self.api_url))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            warn!(city = %city, zone = %zone, status = %response.status(), "time provider rejected lookup");
            return Ok(Self::try_cities(city));
        }

        let body: WorldTime = response.json().await.map_err(|e| e.to_string())?;
        let datetime = DateTime::parse_from_rfc3339(&body.datetime).map_err(|e| e.to_string())?;
        let abbreviation = body
            .abbreviation
            .filter(|abbr| !abbr.is_empty())
            .unwrap_or_else(|| datetime.format("UTC%:z").to_string());

        Ok(format_city_time(city, datetime, &abbreviation))
    }
}

#[async_trait]
impl Capability for CityTimeCapability {
    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, argument: &str) -> String {
        let city = argument.trim();
        match self.lookup(city).await {
            Ok(text) => text,
            Err(reason) => {
                warn!(city = %city, error = %reason, "time lookup failed");
                format!("Failed to get time: {reason}")
            }
        }
    }
}
