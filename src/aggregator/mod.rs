// Exclusive-category aggregation for one slice: instantaneous split at the
// latest observed timestamp, per-device average-then-sum over the trailing
// window, group efficiency tables, and the non-hashing issue list.
//
// Category predicates are evaluated in configured order, first match wins.
// That order is the precedence rule: a device matching both a worker-name
// rule and a pool-URL rule resolves to whichever rule is listed first.

mod table;

pub use table::{build_group_table, collect_issues};

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::{CategoryRule, SliceConfig};
use crate::models::{GroupTable, Issue, MetricRow, RateSplit};

/// Observed rates are H/s; published totals are PH/s.
const PETAHASH: f64 = 1e15;

/// Everything derived from one slice's raw rows.
#[derive(Debug, Clone)]
pub struct SliceAggregate {
    /// The single most-recent observed timestamp in the window.
    pub snapshot_ts: Option<DateTime<Utc>>,
    pub current: RateSplit,
    pub avg_window: RateSplit,
    pub table: GroupTable,
    pub issues: BTreeMap<String, Vec<Issue>>,
}

pub fn aggregate_slice(rows: &[MetricRow], config: &SliceConfig) -> SliceAggregate {
    let mut table = build_group_table(rows, &config.table);
    if let Some(label) = &config.table.efficiency_category {
        table.category_efficiency_pct = category_efficiency(rows, config, label);
    }
    SliceAggregate {
        snapshot_ts: latest_timestamp(rows),
        current: current_split(rows, config),
        avg_window: window_average_split(rows, config),
        issues: collect_issues(rows, &config.table.include_prefixes),
        table,
    }
}

/// Fleet-wide efficiency for one category: distinct devices classified into
/// it anywhere in the window, against the ones hashing at the latest
/// timestamp. None when no device ever classified into the category.
pub fn category_efficiency(rows: &[MetricRow], config: &SliceConfig, label: &str) -> Option<f64> {
    let latest = latest_timestamp(rows)?;
    let mut deployed: HashSet<&str> = HashSet::new();
    let mut hashing: HashSet<&str> = HashSet::new();
    for row in rows {
        if classify(row, config) != label {
            continue;
        }
        deployed.insert(row.miner_id.as_str());
        if row.timestamp == latest && row.hash_rate.is_some_and(|r| r > 0.0) {
            hashing.insert(row.miner_id.as_str());
        }
    }
    pct(hashing.len() as u64, deployed.len() as u64)
}

pub fn latest_timestamp(rows: &[MetricRow]) -> Option<DateTime<Utc>> {
    rows.iter().map(|r| r.timestamp).max()
}

/// Category of one row: first matching rule wins, otherwise the fallback.
pub fn classify<'a>(row: &MetricRow, config: &'a SliceConfig) -> &'a str {
    for rule in &config.categories {
        if rule_matches(rule, row) {
            return &rule.label;
        }
    }
    &config.fallback_category
}

/// Missing identifiers never match a pattern: a row with no pool URLs and no
/// workers always falls through to the next rule.
fn rule_matches(rule: &CategoryRule, row: &MetricRow) -> bool {
    let pool_hit = rule.pool_contains.iter().any(|pattern| {
        let pattern = pattern.to_lowercase();
        row.pools
            .iter()
            .any(|url| url.to_lowercase().contains(&pattern))
    });
    if pool_hit {
        return true;
    }
    rule.worker_prefixes.iter().any(|pattern| {
        let pattern = pattern.to_lowercase();
        row.workers
            .iter()
            .any(|worker| worker_name_matches(worker, &pattern))
    })
}

/// Worker-name match: the pattern must start a dot-separated segment of the
/// identifier, so "kjdga01.unit7" and "acct.kjdga01" both match "kjdga" but
/// "notkjdga" does not match mid-word.
fn worker_name_matches(worker: &str, pattern: &str) -> bool {
    worker
        .to_lowercase()
        .split('.')
        .any(|segment| segment.starts_with(pattern))
}

/// Instantaneous split: only rows at the single most-recent timestamp, one
/// exclusive category per device, sums scaled to PH/s. Rows without a rate
/// contribute nothing to any sum.
pub fn current_split(rows: &[MetricRow], config: &SliceConfig) -> RateSplit {
    let Some(latest) = latest_timestamp(rows) else {
        return empty_split(config);
    };
    let mut by_category = zeroed_categories(config);
    let mut total = 0.0;
    for row in rows.iter().filter(|r| r.timestamp == latest) {
        let rate = row.hash_rate.unwrap_or(0.0) / PETAHASH;
        total += rate;
        *by_category
            .entry(classify(row, config).to_string())
            .or_insert(0.0) += rate;
    }
    RateSplit {
        total: Some(total),
        by_category,
    }
}

/// Windowed split: average each device's rate within each category it
/// appears in (a device can shift category across samples), then sum the
/// per-device averages by category. The overall total averages each device
/// over all of its samples first, so devices with more samples are not
/// overweighted. Null-rate samples are excluded from the averages entirely.
pub fn window_average_split(rows: &[MetricRow], config: &SliceConfig) -> RateSplit {
    if rows.is_empty() {
        return empty_split(config);
    }
    let mut per_device_category: HashMap<(&str, &str), (f64, u64)> = HashMap::new();
    let mut per_device: HashMap<&str, (f64, u64)> = HashMap::new();
    for row in rows {
        let Some(rate) = row.hash_rate else {
            continue;
        };
        let category = classify(row, config);
        let cell = per_device_category
            .entry((row.miner_id.as_str(), category))
            .or_insert((0.0, 0));
        cell.0 += rate;
        cell.1 += 1;
        let cell = per_device.entry(row.miner_id.as_str()).or_insert((0.0, 0));
        cell.0 += rate;
        cell.1 += 1;
    }

    let mut by_category = zeroed_categories(config);
    for ((_device, category), (sum, count)) in &per_device_category {
        *by_category.entry((*category).to_string()).or_insert(0.0) +=
            sum / (*count as f64) / PETAHASH;
    }
    let total = per_device
        .values()
        .map(|(sum, count)| sum / (*count as f64))
        .sum::<f64>()
        / PETAHASH;
    RateSplit {
        total: Some(total),
        by_category,
    }
}

fn empty_split(config: &SliceConfig) -> RateSplit {
    RateSplit {
        total: None,
        by_category: zeroed_categories(config),
    }
}

fn zeroed_categories(config: &SliceConfig) -> BTreeMap<String, f64> {
    let mut categories: BTreeMap<String, f64> = config
        .categories
        .iter()
        .map(|rule| (rule.label.clone(), 0.0))
        .collect();
    categories.insert(config.fallback_category.clone(), 0.0);
    categories
}

/// Percentage with a null-propagating denominator: None when `den` is zero,
/// never 0 or NaN.
pub fn pct(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64 * 100.0)
}
