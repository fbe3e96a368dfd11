// Capped, deduplicated, newest-first index of published snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Site-relative snapshot path, e.g. "/reports/2025-08-28_06-00-AM/".
    pub path: String,
    /// Human label, e.g. "Thursday, August 28, 2025, 6:00 AM".
    pub label: String,
    pub generated_at: DateTime<Utc>,
    pub snapshot_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub reports: Vec<ManifestEntry>,
}

impl Manifest {
    /// Removes any existing entry with the same path, prepends the new
    /// entry, and truncates to `cap` (oldest silently dropped).
    pub fn insert(&mut self, entry: ManifestEntry, cap: usize) {
        self.reports.retain(|e| e.path != entry.path);
        self.reports.insert(0, entry);
        self.reports.truncate(cap);
    }
}
