// The published report document. Historical snapshots are never rewritten,
// so changes here must stay backward-compatible: new optional fields only.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category split for one slice. `by_category` carries an entry for every
/// configured label so the published JSON shape is stable across runs;
/// `total` is null when the window held no rows at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSplit {
    pub total: Option<f64>,
    pub by_category: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceTotals {
    /// Split at the single latest observed timestamp.
    pub current: RateSplit,
    /// Per-device average over the trailing window, summed by category.
    pub avg_window: RateSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub group: String,
    pub deployed: u64,
    pub reachable: u64,
    pub hashing: u64,
    pub not_hashing: u64,
    /// Null (not zero) when the denominator is zero.
    pub efficiency_pct: Option<f64>,
    pub not_hashing_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub deployed: u64,
    pub reachable: u64,
    pub hashing: u64,
    pub not_hashing: u64,
    pub efficiency_pct: Option<f64>,
    pub not_hashing_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTable {
    pub rows: Vec<GroupRow>,
    pub totals: GroupTotals,
    /// Fleet-wide efficiency of one configured category, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_efficiency_pct: Option<f64>,
}

/// A device that was reachable at the latest snapshot but not hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Rack/shelf/slot label, e.g. "R1.S2.P3" ("?" for unknown parts).
    pub position: String,
    pub ip: Option<String>,
    pub mac: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub temp_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub conditions: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCostPayload {
    pub min_cents_kwh: f64,
    pub max_cents_kwh: f64,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallTotals {
    pub current_phs: f64,
    pub avg_phs: f64,
}

/// Top-level immutable report, created once per run and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub window_hours: u32,
    /// Latest observed snapshot timestamp across slices; null when no slice
    /// had any rows.
    pub current_snapshot_ts: Option<DateTime<Utc>>,
    pub overall: OverallTotals,
    pub slices: BTreeMap<String, SliceTotals>,
    pub tables: BTreeMap<String, GroupTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_cost: Option<PowerCostPayload>,
    /// Per-slice, per-group list of non-hashing devices.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub issues_by_group: BTreeMap<String, BTreeMap<String, Vec<Issue>>>,
}
