// Per-group deployed/reachable/hashing tables and the issue list.
// Counting is by distinct device: deployed = ever seen in the window,
// reachable = seen at the latest timestamp, hashing = reachable with a
// positive rate.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::{TableConfig, TableMode};
use crate::models::{GroupRow, GroupTable, GroupTotals, Issue, MetricRow};

use super::{latest_timestamp, pct};

pub fn build_group_table(rows: &[MetricRow], config: &TableConfig) -> GroupTable {
    let latest = latest_timestamp(rows);
    let mut deployed_by_group: HashMap<String, HashSet<&str>> = HashMap::new();
    let mut reachable_by_group: HashMap<String, HashSet<&str>> = HashMap::new();
    let mut hashing_by_group: HashMap<String, HashSet<&str>> = HashMap::new();

    for row in rows {
        let Some(group) = included_group(row.group.as_deref(), config) else {
            continue;
        };
        deployed_by_group
            .entry(group.clone())
            .or_default()
            .insert(&row.miner_id);
        if Some(row.timestamp) == latest {
            reachable_by_group
                .entry(group.clone())
                .or_default()
                .insert(&row.miner_id);
            if row.hash_rate.is_some_and(|r| r > 0.0) {
                hashing_by_group
                    .entry(group)
                    .or_default()
                    .insert(&row.miner_id);
            }
        }
    }

    let mut table_rows: Vec<GroupRow> = deployed_by_group
        .iter()
        .map(|(group, devices)| {
            let deployed = devices.len() as u64;
            let reachable = reachable_by_group.get(group).map_or(0, |s| s.len()) as u64;
            let hashing = hashing_by_group.get(group).map_or(0, |s| s.len()) as u64;
            let not_hashing = reachable.saturating_sub(hashing);
            GroupRow {
                group: group.clone(),
                deployed,
                reachable,
                hashing,
                not_hashing,
                efficiency_pct: efficiency(config.mode, deployed, reachable, hashing),
                not_hashing_rate_pct: pct(not_hashing, reachable),
            }
        })
        .collect();
    table_rows.sort_by(|a, b| group_sort_key(&a.group).cmp(&group_sort_key(&b.group)));

    // Totals sum the counts; efficiency is recomputed from the sums, never
    // averaged from the per-row percentages.
    let deployed: u64 = table_rows.iter().map(|r| r.deployed).sum();
    let reachable: u64 = table_rows.iter().map(|r| r.reachable).sum();
    let hashing: u64 = table_rows.iter().map(|r| r.hashing).sum();
    let not_hashing: u64 = table_rows.iter().map(|r| r.not_hashing).sum();
    let totals = GroupTotals {
        deployed,
        reachable,
        hashing,
        not_hashing,
        efficiency_pct: efficiency(config.mode, deployed, reachable, hashing),
        not_hashing_rate_pct: pct(not_hashing, reachable),
    };

    GroupTable {
        rows: table_rows,
        totals,
        category_efficiency_pct: None,
    }
}

fn efficiency(mode: TableMode, deployed: u64, reachable: u64, hashing: u64) -> Option<f64> {
    match mode {
        TableMode::Deployed => pct(hashing, deployed),
        TableMode::Reachable => pct(hashing, reachable),
    }
}

fn included_group(group: Option<&str>, config: &TableConfig) -> Option<String> {
    let group = group?;
    if !prefix_matches(group, &config.include_prefixes) {
        return None;
    }
    if !config.allow_groups.is_empty()
        && !config
            .allow_groups
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(group))
    {
        return None;
    }
    Some(group.to_string())
}

fn prefix_matches(group: &str, prefixes: &[String]) -> bool {
    prefixes.is_empty()
        || prefixes
            .iter()
            .any(|p| group.to_uppercase().starts_with(&p.to_uppercase()))
}

/// Natural sort key: numeric suffix after the leading letters, tie-broken by
/// the full id ("AB1" < "MB2" < "MB10").
fn group_sort_key(group: &str) -> (u64, String) {
    let digits: String = group
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (digits.parse().unwrap_or(0), group.to_string())
}

/// Devices present at the latest timestamp with no positive rate, keyed by
/// group, as rack/shelf/slot labels for the operators.
pub fn collect_issues(
    rows: &[MetricRow],
    include_prefixes: &[String],
) -> BTreeMap<String, Vec<Issue>> {
    let Some(latest) = latest_timestamp(rows) else {
        return BTreeMap::new();
    };
    let mut issues_by_group: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
    for row in rows {
        if row.timestamp != latest || row.hash_rate.is_some_and(|r| r > 0.0) {
            continue;
        }
        let Some(group) = row.group.as_deref() else {
            continue;
        };
        if !prefix_matches(group, include_prefixes) {
            continue;
        }
        issues_by_group
            .entry(group.to_string())
            .or_default()
            .push(Issue {
                position: position_label(row),
                ip: row.ip.clone(),
                mac: row
                    .mac
                    .as_deref()
                    .map(|m| m.replace('-', ":").to_lowercase()),
            });
    }
    for issues in issues_by_group.values_mut() {
        issues.sort_by(|a, b| a.position.cmp(&b.position));
    }
    issues_by_group
}

fn position_label(row: &MetricRow) -> String {
    format!(
        "R{}.S{}.P{}",
        first_digits(row.rack.as_deref()),
        first_digits(row.shelf.as_deref()),
        first_digits(row.slot.as_deref())
    )
}

/// First contiguous digit run in the field, or "?" when there is none.
fn first_digits(field: Option<&str>) -> String {
    let digits: String = field
        .unwrap_or("")
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() { "?".into() } else { digits }
}
