// Domain models: raw metric rows in, report/manifest documents out

mod manifest;
mod metrics;
mod report;

pub use manifest::{Manifest, ManifestEntry};
pub use metrics::MetricRow;
pub use report::{
    GroupRow, GroupTable, GroupTotals, Issue, OverallTotals, PowerCostPayload, RateSplit, Report,
    SliceTotals, WeatherPayload,
};
