// Local-time execution gate: decides whether a scheduled run fires "now".
// Pure predicate; the manual override bypasses it in the pipeline, not here.

use chrono::{DateTime, Utc};

use crate::config::ScheduleConfig;
use crate::localtime::CivilParts;

/// True when `now` lands exactly on one of the schedule's weekday-bucket
/// triggers (hour + exact minute) in the configured zone. Unmatched times,
/// unknown weekday names, and an unparseable time zone all yield false;
/// never panics.
pub fn should_run(now: DateTime<Utc>, schedule: &ScheduleConfig) -> bool {
    let Ok(tz) = schedule.tz() else {
        return false;
    };
    let parts = CivilParts::of(now, tz);
    for bucket in &schedule.buckets {
        let day_matches = bucket
            .days
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&parts.weekday));
        if !day_matches {
            continue;
        }
        for trigger in &bucket.triggers {
            if u32::from(trigger.hour) == parts.hour24()
                && u32::from(trigger.minute) == parts.minute
            {
                return true;
            }
        }
    }
    false
}
