// Source fetcher contracts consumed by the pipeline. Metrics are mandatory
// (a fetch failure aborts the run); weather and power price are optional and
// degrade to absent. Implementations here are thin HTTP clients; the
// warehouse engine behind the metrics endpoint stays replaceable.

mod http;

pub use http::{HttpMetricsSource, HttpPriceSource, OpenMeteoSource, http_client};

use async_trait::async_trait;

use crate::models::{MetricRow, PowerCostPayload, WeatherPayload};

#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Raw per-device rows for one slice over a trailing window.
    async fn fetch_rows(&self, slice: &str, window_hours: u32)
    -> anyhow::Result<Vec<MetricRow>>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<WeatherPayload>;
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<PowerCostPayload>;
}
