// Raw per-device observations from the metrics source.
// Strict schema at the aggregator boundary: rows are typed here instead of
// flowing through as untyped objects. A missing or unparseable rate
// coalesces to None, never to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub miner_id: String,
    pub timestamp: DateTime<Utc>,
    /// Observed rate in H/s. Sources emit numbers, numeric strings, or null.
    #[serde(default, deserialize_with = "lenient_rate")]
    pub hash_rate: Option<f64>,
    /// Physical group (rack/box) id.
    #[serde(default)]
    pub group: Option<String>,
    /// Worker identifiers: active worker plus per-pool workers, any number.
    #[serde(default)]
    pub workers: Vec<String>,
    /// Pool URLs the device is configured against, any number.
    #[serde(default)]
    pub pools: Vec<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub shelf: Option<String>,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

fn lenient_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(v)) => Some(v),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}
