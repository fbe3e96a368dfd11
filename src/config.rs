use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
    pub report: ReportConfig,
    pub sources: SourcesConfig,
    pub slices: Vec<SliceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory inside the repo all published paths are keyed under.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Name of the environment variable holding the store token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_branch() -> String {
    "main".into()
}

fn default_base_dir() -> String {
    "public/".into()
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// Run schedule: day-of-week buckets with distinct trigger times, all in one
/// fixed civil time zone (not UTC, not wherever the process happens to run).
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone name, e.g. "America/New_York".
    pub timezone: String,
    pub buckets: Vec<ScheduleBucket>,
}

impl ScheduleConfig {
    pub fn tz(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid schedule.timezone {:?}: {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleBucket {
    /// Weekday abbreviations, "Sun".."Sat".
    pub days: Vec<String>,
    pub triggers: Vec<TriggerTime>,
}

/// A trigger time of day, parsed from "HH:MM" (24-hour clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTime {
    pub hour: u8,
    pub minute: u8,
}

impl std::str::FromStr for TriggerTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected HH:MM, got {s:?}"))?;
        let hour: u8 = h.parse().map_err(|_| anyhow::anyhow!("bad hour in {s:?}"))?;
        let minute: u8 = m.parse().map_err(|_| anyhow::anyhow!("bad minute in {s:?}"))?;
        anyhow::ensure!(hour < 24 && minute < 60, "out-of-range time {s:?}");
        Ok(Self { hour, minute })
    }
}

impl<'de> Deserialize<'de> for TriggerTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Max manifest entries kept; older snapshots fall off the index (the
    /// snapshot files themselves are never deleted).
    #[serde(default = "default_manifest_cap")]
    pub manifest_cap: usize,
}

fn default_window_hours() -> u32 {
    24
}

fn default_manifest_cap() -> usize {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Rows endpoint queried with ?slice=&hours=.
    pub metrics_url: String,
    pub weather: Option<WeatherConfig>,
    pub price_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// One logical partition of the fleet, aggregated independently.
#[derive(Debug, Clone, Deserialize)]
pub struct SliceConfig {
    pub name: String,
    /// Ordered predicate chain; the first matching rule wins. Order is the
    /// precedence rule for devices matching more than one category.
    pub categories: Vec<CategoryRule>,
    /// Category for rows no rule matches.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,
    pub table: TableConfig,
}

fn default_fallback_category() -> String {
    "other".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    /// Case-insensitive substrings matched against the row's pool URLs.
    #[serde(default)]
    pub pool_contains: Vec<String>,
    /// Case-insensitive prefixes matched against dot-separated segments of
    /// the row's worker identifiers.
    #[serde(default)]
    pub worker_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub mode: TableMode,
    /// Group id prefixes included in the table (empty = all).
    #[serde(default)]
    pub include_prefixes: Vec<String>,
    /// Exact group ids included (empty = all passing the prefix filter).
    #[serde(default)]
    pub allow_groups: Vec<String>,
    /// Category whose fleet-wide efficiency (devices classified into it in
    /// the window vs. the ones hashing at the latest snapshot) is published
    /// alongside the table.
    #[serde(default)]
    pub efficiency_category: Option<String>,
}

/// Efficiency denominator: everything ever deployed in the window, or only
/// what was reachable at the latest snapshot (uptime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    Deployed,
    Reachable,
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.store.owner.is_empty(), "store.owner must be non-empty");
        anyhow::ensure!(!self.store.repo.is_empty(), "store.repo must be non-empty");
        anyhow::ensure!(
            !self.store.token_env.is_empty(),
            "store.token_env must be non-empty"
        );
        self.schedule.tz()?;
        anyhow::ensure!(
            !self.schedule.buckets.is_empty(),
            "schedule.buckets must be non-empty"
        );
        for bucket in &self.schedule.buckets {
            anyhow::ensure!(
                !bucket.days.is_empty() && !bucket.triggers.is_empty(),
                "every schedule bucket needs days and triggers"
            );
            for day in &bucket.days {
                anyhow::ensure!(
                    WEEKDAYS.iter().any(|w| w.eq_ignore_ascii_case(day)),
                    "unknown weekday {:?} (expected Sun..Sat)",
                    day
                );
            }
        }
        anyhow::ensure!(
            self.report.window_hours > 0,
            "report.window_hours must be > 0, got {}",
            self.report.window_hours
        );
        anyhow::ensure!(
            self.report.manifest_cap > 0,
            "report.manifest_cap must be > 0, got {}",
            self.report.manifest_cap
        );
        anyhow::ensure!(
            !self.sources.metrics_url.is_empty(),
            "sources.metrics_url must be non-empty"
        );
        anyhow::ensure!(!self.slices.is_empty(), "at least one slice is required");
        let mut names = std::collections::HashSet::new();
        for slice in &self.slices {
            anyhow::ensure!(!slice.name.is_empty(), "slice name must be non-empty");
            anyhow::ensure!(
                names.insert(slice.name.as_str()),
                "duplicate slice name {:?}",
                slice.name
            );
            let mut labels = std::collections::HashSet::new();
            labels.insert(slice.fallback_category.as_str());
            for rule in &slice.categories {
                anyhow::ensure!(
                    !rule.label.is_empty(),
                    "category label must be non-empty in slice {:?}",
                    slice.name
                );
                anyhow::ensure!(
                    labels.insert(rule.label.as_str()),
                    "duplicate category label {:?} in slice {:?}",
                    rule.label,
                    slice.name
                );
                anyhow::ensure!(
                    !rule.pool_contains.is_empty() || !rule.worker_prefixes.is_empty(),
                    "category {:?} in slice {:?} has no patterns",
                    rule.label,
                    slice.name
                );
            }
            if let Some(label) = &slice.table.efficiency_category {
                anyhow::ensure!(
                    slice.fallback_category == *label
                        || slice.categories.iter().any(|r| &r.label == label),
                    "efficiency_category {:?} in slice {:?} does not name a configured category",
                    label,
                    slice.name
                );
            }
        }
        Ok(())
    }
}
