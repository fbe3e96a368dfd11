// One pipeline run: gate, concurrent source fan-out, per-slice aggregation,
// assembly, publish. At most one run is in flight per invocation; run
// cadence is the external scheduler's concern, not enforced here.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::aggregator;
use crate::assembler;
use crate::config::AppConfig;
use crate::models::MetricRow;
use crate::publisher::Publisher;
use crate::sources::{MetricsSource, PriceSource, WeatherSource};
use crate::store::RemoteStore;
use crate::time_gate;

pub struct PipelineDeps {
    pub metrics: Arc<dyn MetricsSource>,
    pub weather: Option<Arc<dyn WeatherSource>>,
    pub price: Option<Arc<dyn PriceSource>>,
    pub store: Arc<dyn RemoteStore>,
}

/// Terminal outcome of a run. Failures propagate as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The gate said no and no override was set.
    Skipped,
    Published {
        snapshot_path: String,
        manifest_len: usize,
    },
}

pub async fn run_once(deps: &PipelineDeps, config: &AppConfig, force: bool) -> Result<RunOutcome> {
    let now = Utc::now();
    if !force && !time_gate::should_run(now, &config.schedule) {
        info!("outside local schedule; run skipped");
        return Ok(RunOutcome::Skipped);
    }

    let window_hours = config.report.window_hours;

    // The only fan-out point: all three sources run concurrently. The
    // optional two resolve to None on failure instead of propagating.
    let metrics_fut = fetch_all_slices(deps.metrics.as_ref(), config, window_hours);
    let weather_fut = async {
        match &deps.weather {
            Some(source) => match source.fetch().await {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(source = "weather", error = %e, "optional source failed; continuing without it");
                    None
                }
            },
            None => None,
        }
    };
    let price_fut = async {
        match &deps.price {
            Some(source) => match source.fetch().await {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(source = "price", error = %e, "optional source failed; continuing without it");
                    None
                }
            },
            None => None,
        }
    };
    let (rows_by_slice, weather, power_cost) = tokio::join!(metrics_fut, weather_fut, price_fut);
    let rows_by_slice = rows_by_slice?;

    let mut aggregates = Vec::with_capacity(rows_by_slice.len());
    for (slice_config, (name, rows)) in config.slices.iter().zip(rows_by_slice) {
        let agg = aggregator::aggregate_slice(&rows, slice_config);
        info!(
            slice = %name,
            rows = rows.len(),
            snapshot_ts = ?agg.snapshot_ts,
            "slice aggregated"
        );
        aggregates.push((name, agg));
    }

    let report = assembler::assemble(now, window_hours, aggregates, weather, power_cost);

    let publisher = Publisher::new(
        deps.store.clone(),
        config.schedule.tz()?,
        config.report.manifest_cap,
    );
    let outcome = publisher.publish(&report).await?;
    Ok(RunOutcome::Published {
        snapshot_path: outcome.snapshot_path,
        manifest_len: outcome.manifest_len,
    })
}

/// Fetches every slice's rows concurrently; any slice failure is fatal for
/// the whole run.
async fn fetch_all_slices(
    metrics: &dyn MetricsSource,
    config: &AppConfig,
    window_hours: u32,
) -> Result<Vec<(String, Vec<MetricRow>)>> {
    let fetches = config.slices.iter().map(|slice| async move {
        let rows = metrics
            .fetch_rows(&slice.name, window_hours)
            .await
            .with_context(|| format!("metrics fetch failed for slice {:?}", slice.name))?;
        Ok::<_, anyhow::Error>((slice.name.clone(), rows))
    });
    join_all(fetches).await.into_iter().collect()
}
