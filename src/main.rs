use anyhow::Result;
use hashreport::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(version = version::VERSION, "starting");

    // Manual override bypasses the schedule gate.
    let force = std::env::args().any(|a| a == "--force")
        || std::env::var("FORCE_RUN").as_deref() == Ok("1");

    let app_config = config::AppConfig::load()?;
    let token = std::env::var(&app_config.store.token_env)
        .map_err(|_| anyhow::anyhow!("{} env var not set", app_config.store.token_env))?;

    let client = sources::http_client()?;
    let store: Arc<dyn store::RemoteStore> = Arc::new(store::GithubStore::new(
        client.clone(),
        &app_config.store,
        token,
    ));
    let metrics: Arc<dyn sources::MetricsSource> = Arc::new(sources::HttpMetricsSource::new(
        client.clone(),
        app_config.sources.metrics_url.clone(),
    ));
    let weather = app_config.sources.weather.as_ref().map(|w| {
        Arc::new(sources::OpenMeteoSource::new(
            client.clone(),
            w.latitude,
            w.longitude,
        )) as Arc<dyn sources::WeatherSource>
    });
    let price = app_config.sources.price_url.as_ref().map(|url| {
        Arc::new(sources::HttpPriceSource::new(client, url.clone()))
            as Arc<dyn sources::PriceSource>
    });

    let deps = pipeline::PipelineDeps {
        metrics,
        weather,
        price,
        store,
    };

    match pipeline::run_once(&deps, &app_config, force).await {
        Ok(pipeline::RunOutcome::Skipped) => {
            tracing::info!(forced = force, "skipped (outside local schedule)");
        }
        Ok(pipeline::RunOutcome::Published {
            snapshot_path,
            manifest_len,
        }) => {
            tracing::info!(
                snapshot_path = %snapshot_path,
                manifest_len,
                forced = force,
                "run complete"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            return Err(e);
        }
    }
    Ok(())
}
