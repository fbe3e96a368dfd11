// Shared test helpers: row/config builders, an in-memory RemoteStore, and
// canned sources.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use hashreport::config::{
    CategoryRule, ScheduleBucket, ScheduleConfig, SliceConfig, TableConfig, TableMode, TriggerTime,
};
use hashreport::models::{MetricRow, PowerCostPayload, WeatherPayload};
use hashreport::sources::{MetricsSource, PriceSource, WeatherSource};
use hashreport::store::{RemoteStore, StoreError, StoredFile};

pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 28, hour, minute, 0).unwrap()
}

pub fn row(miner_id: &str, timestamp: DateTime<Utc>, hash_rate: Option<f64>) -> MetricRow {
    MetricRow {
        miner_id: miner_id.into(),
        timestamp,
        hash_rate,
        group: None,
        workers: vec![],
        pools: vec![],
        rack: None,
        shelf: None,
        slot: None,
        ip: None,
        mac: None,
    }
}

pub fn grouped_row(
    miner_id: &str,
    timestamp: DateTime<Utc>,
    hash_rate: Option<f64>,
    group: &str,
) -> MetricRow {
    MetricRow {
        group: Some(group.into()),
        ..row(miner_id, timestamp, hash_rate)
    }
}

pub fn pool_row(
    miner_id: &str,
    timestamp: DateTime<Utc>,
    hash_rate: Option<f64>,
    pool: &str,
) -> MetricRow {
    MetricRow {
        pools: vec![pool.into()],
        ..row(miner_id, timestamp, hash_rate)
    }
}

pub fn trigger(hour: u8, minute: u8) -> TriggerTime {
    TriggerTime { hour, minute }
}

/// Mon–Thu: 06:00, 16:00, 23:59 | Fri–Sun: 06:00, 18:00 (America/New_York).
pub fn default_schedule() -> ScheduleConfig {
    ScheduleConfig {
        timezone: "America/New_York".into(),
        buckets: vec![
            ScheduleBucket {
                days: ["Mon", "Tue", "Wed", "Thu"].map(String::from).to_vec(),
                triggers: vec![trigger(6, 0), trigger(16, 0), trigger(23, 59)],
            },
            ScheduleBucket {
                days: ["Fri", "Sat", "Sun"].map(String::from).to_vec(),
                triggers: vec![trigger(6, 0), trigger(18, 0)],
            },
        ],
    }
}

/// Two pool-URL categories plus the fallback; deployed-based table over
/// MB/AB groups.
pub fn slice_config(name: &str) -> SliceConfig {
    SliceConfig {
        name: name.into(),
        categories: vec![
            CategoryRule {
                label: "antpool".into(),
                pool_contains: vec!["antpool".into()],
                worker_prefixes: vec![],
            },
            CategoryRule {
                label: "blockware".into(),
                pool_contains: vec!["blockware".into()],
                worker_prefixes: vec![],
            },
        ],
        fallback_category: "other".into(),
        table: TableConfig {
            mode: TableMode::Deployed,
            include_prefixes: vec!["MB".into(), "AB".into()],
            allow_groups: vec![],
            efficiency_category: None,
        },
    }
}

/// In-memory RemoteStore with a monotonic revision counter per path.
/// `fail_after` injects a write failure once that many writes have happened
/// (-1 = never fail).
#[derive(Default)]
pub struct MemStore {
    files: Mutex<HashMap<String, (Vec<u8>, u64)>>,
    writes: AtomicI64,
    pub fail_after: AtomicI64,
}

impl MemStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.fail_after.store(-1, Ordering::Relaxed);
        store
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn get_json(&self, path: &str) -> Option<serde_json::Value> {
        let files = self.files.lock().unwrap();
        let (content, _) = files.get(path)?;
        serde_json::from_slice(content).ok()
    }

    pub fn write_count(&self) -> i64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RemoteStore for MemStore {
    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .map(|(content, version)| StoredFile {
                content: content.clone(),
                version: version.to_string(),
            }))
    }

    async fn cas_write(
        &self,
        path: &str,
        expected: Option<&str>,
        content: &[u8],
        _message: &str,
    ) -> Result<(), StoreError> {
        let fail_after = self.fail_after.load(Ordering::Relaxed);
        if fail_after >= 0 && self.writes.load(Ordering::Relaxed) >= fail_after {
            return Err(StoreError::Api {
                status: 500,
                message: "injected write failure".into(),
            });
        }
        let mut files = self.files.lock().unwrap();
        let current = files.get(path).map(|(_, version)| version.to_string());
        if expected.map(str::to_string) != current {
            return Err(StoreError::VersionConflict(path.into()));
        }
        let next = current.map_or(0, |v| v.parse::<u64>().unwrap() + 1);
        files.insert(path.into(), (content.to_vec(), next));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

pub struct FakeMetrics {
    pub rows: HashMap<String, Vec<MetricRow>>,
    pub fail: bool,
}

impl FakeMetrics {
    pub fn with_rows(slice: &str, rows: Vec<MetricRow>) -> Self {
        Self {
            rows: HashMap::from([(slice.to_string(), rows)]),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            rows: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl MetricsSource for FakeMetrics {
    async fn fetch_rows(&self, slice: &str, _window_hours: u32) -> anyhow::Result<Vec<MetricRow>> {
        if self.fail {
            anyhow::bail!("warehouse unavailable");
        }
        Ok(self.rows.get(slice).cloned().unwrap_or_default())
    }
}

pub struct FakeWeather {
    pub payload: Option<WeatherPayload>,
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn fetch(&self) -> anyhow::Result<WeatherPayload> {
        self.payload
            .clone()
            .ok_or_else(|| anyhow::anyhow!("weather endpoint timed out"))
    }
}

pub struct FakePrice {
    pub payload: Option<PowerCostPayload>,
}

#[async_trait]
impl PriceSource for FakePrice {
    async fn fetch(&self) -> anyhow::Result<PowerCostPayload> {
        self.payload
            .clone()
            .ok_or_else(|| anyhow::anyhow!("price endpoint timed out"))
    }
}

pub fn weather_payload() -> WeatherPayload {
    WeatherPayload {
        temp_f: Some(91.4),
        humidity_pct: Some(63.0),
        conditions: Some("Partly cloudy".into()),
        fetched_at: ts(12, 0),
    }
}

pub fn price_payload() -> PowerCostPayload {
    PowerCostPayload {
        min_cents_kwh: 3.2,
        max_cents_kwh: 9.8,
        fetched_at: ts(12, 0),
        source: "test-endpoint".into(),
    }
}
