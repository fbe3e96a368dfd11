// Default reqwest-backed source clients.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use super::{MetricsSource, PriceSource, WeatherSource};
use crate::models::{MetricRow, PowerCostPayload, WeatherPayload};

/// Shared client for all sources and the store.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

async fn expect_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{what} error ({status}): {body}");
}

/// Rows endpoint queried with ?slice=&hours=, returning a JSON array of
/// MetricRow objects.
pub struct HttpMetricsSource {
    client: Client,
    url: String,
}

impl HttpMetricsSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch_rows(&self, slice: &str, window_hours: u32) -> Result<Vec<MetricRow>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("slice", slice), ("hours", &window_hours.to_string())])
            .send()
            .await
            .context("metrics request failed")?;
        let response = expect_success(response, "metrics endpoint").await?;
        response.json().await.context("failed to parse metric rows")
    }
}

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Current site conditions from Open-Meteo (no API key).
pub struct OpenMeteoSource {
    client: Client,
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoSource {
    pub fn new(client: Client, latitude: f64, longitude: f64) -> Self {
        Self {
            client,
            latitude,
            longitude,
        }
    }
}

#[derive(Deserialize)]
struct MeteoResponse {
    current: Option<MeteoCurrent>,
}

#[derive(Deserialize)]
struct MeteoCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    weather_code: Option<u32>,
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn fetch(&self) -> Result<WeatherPayload> {
        let response = self
            .client
            .get(OPEN_METEO_URL)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code".into(),
                ),
                ("temperature_unit", "fahrenheit".into()),
            ])
            .send()
            .await
            .context("weather request failed")?;
        let response = expect_success(response, "weather endpoint").await?;
        let body: MeteoResponse = response
            .json()
            .await
            .context("failed to parse weather response")?;
        let current = body.current.unwrap_or(MeteoCurrent {
            temperature_2m: None,
            relative_humidity_2m: None,
            weather_code: None,
        });
        Ok(WeatherPayload {
            temp_f: current.temperature_2m,
            humidity_pct: current.relative_humidity_2m,
            conditions: current.weather_code.and_then(wmo_label).map(String::from),
            fetched_at: Utc::now(),
        })
    }
}

/// WMO weather code to human label.
fn wmo_label(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 | 57 => "Freezing drizzle",
        61 => "Light rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 => "Light snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Light rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Light snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => return None,
    })
}

/// Power price extremes from a JSON endpoint:
/// { "min_cents_kwh": .., "max_cents_kwh": .., "source": ".." }.
pub struct HttpPriceSource {
    client: Client,
    url: String,
}

impl HttpPriceSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct PriceResponse {
    min_cents_kwh: f64,
    max_cents_kwh: f64,
    #[serde(default)]
    source: Option<String>,
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch(&self) -> Result<PowerCostPayload> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("price request failed")?;
        let response = expect_success(response, "price endpoint").await?;
        let body: PriceResponse = response
            .json()
            .await
            .context("failed to parse price response")?;
        Ok(PowerCostPayload {
            min_cents_kwh: body.min_cents_kwh,
            max_cents_kwh: body.max_cents_kwh,
            fetched_at: Utc::now(),
            source: body.source.unwrap_or_else(|| self.url.clone()),
        })
    }
}
