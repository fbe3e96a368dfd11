// Pure merge of per-slice aggregates and the optional auxiliary payloads
// into the immutable report document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::aggregator::SliceAggregate;
use crate::models::{OverallTotals, PowerCostPayload, Report, SliceTotals, WeatherPayload};

/// `generated_at` is the pipeline's capture time, not any source's
/// timestamp. `currentSnapshotTs` takes the latest per-slice snapshot
/// timestamp (later wins; a single value is used as-is; none means null).
pub fn assemble(
    generated_at: DateTime<Utc>,
    window_hours: u32,
    slices: Vec<(String, SliceAggregate)>,
    weather: Option<WeatherPayload>,
    power_cost: Option<PowerCostPayload>,
) -> Report {
    let current_snapshot_ts = slices.iter().filter_map(|(_, agg)| agg.snapshot_ts).max();
    let overall = OverallTotals {
        current_phs: slices.iter().filter_map(|(_, agg)| agg.current.total).sum(),
        avg_phs: slices
            .iter()
            .filter_map(|(_, agg)| agg.avg_window.total)
            .sum(),
    };

    let mut slice_totals = BTreeMap::new();
    let mut tables = BTreeMap::new();
    let mut issues_by_group = BTreeMap::new();
    for (name, agg) in slices {
        tables.insert(name.clone(), agg.table);
        if !agg.issues.is_empty() {
            issues_by_group.insert(name.clone(), agg.issues);
        }
        slice_totals.insert(
            name,
            SliceTotals {
                current: agg.current,
                avg_window: agg.avg_window,
            },
        );
    }

    Report {
        generated_at,
        window_hours,
        current_snapshot_ts,
        overall,
        slices: slice_totals,
        tables,
        weather,
        power_cost,
        issues_by_group,
    }
}
